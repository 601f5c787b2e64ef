// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::str::from_utf8;

use super::model;
use crate::Node;

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<quick_xml::events::Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<quick_xml::events::Event<'a>> {
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<quick_xml::events::Event<'b>> {
        self.0.read_event()
    }
}

/// Reader streams network [Features](model::Feature) from an XML document.
pub(super) struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<model::Feature, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut f: Option<model::Feature> = None;

        while !self.eof {
            let event = match self.parser.read_event() {
                Ok(e) => e,
                Err(e) => return Some(Err(e)),
            };

            match event {
                quick_xml::events::Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some(n) = parse_node(start) {
                            return Some(Ok(model::Feature::Node(n)));
                        }
                    }
                    // "way" can't be self-closing
                    b"nd" => {
                        if let Some(model::Feature::Way(ref mut way)) = f {
                            if let Some(ref_) = parse_nd(start) {
                                way.nodes.push(ref_);
                            }
                        }
                    }
                    _ => {}
                },

                quick_xml::events::Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => f = parse_node(start).map(model::Feature::Node),
                    b"way" => f = Some(model::Feature::Way(parse_way(start))),
                    // "nd" must be self-closing
                    _ => {}
                },

                quick_xml::events::Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" => {
                        if let Some(f) = f.take() {
                            return Some(Ok(f));
                        }
                    }
                    _ => {}
                },

                quick_xml::events::Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        return f.map(Ok);
    }
}

pub(super) fn features_from_io<R: io::BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<model::Feature, quick_xml::Error>> {
    Reader::new(IoParser::new(reader))
}

pub(super) fn features_from_buffer(
    data: &[u8],
) -> impl Iterator<Item = Result<model::Feature, quick_xml::Error>> + '_ {
    Reader::new(BufParser::new(data))
}

fn parse_node(start: quick_xml::events::BytesStart<'_>) -> Option<Node> {
    let mut id: i64 = 0;
    let mut lat = f32::NAN;
    let mut lon = f32::NAN;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"id" => id = from_utf8(&attr.value).ok()?.parse().ok()?,
            b"lat" => lat = from_utf8(&attr.value).ok()?.parse().ok()?,
            b"lon" => lon = from_utf8(&attr.value).ok()?.parse().ok()?,
            _ => {}
        }
    }

    if id != 0 && lat.is_finite() && lon.is_finite() {
        Some(Node { id, lat, lon })
    } else {
        log::warn!("discarding invalid <node> (id={}, lat={}, lon={})", id, lat, lon);
        None
    }
}

fn parse_way(start: quick_xml::events::BytesStart<'_>) -> model::Way {
    let mut way = model::Way {
        name: String::new(),
        speed: f32::NAN,
        oneway: false,
        nodes: Vec::default(),
    };

    for attr in start.attributes().flatten() {
        match attr.key.as_ref() {
            b"name" => {
                if let Ok(name) = from_utf8(&attr.value) {
                    way.name = name.to_string();
                }
            }
            b"speed" => {
                if let Ok(Ok(speed)) = from_utf8(&attr.value).map(str::parse) {
                    way.speed = speed;
                }
            }
            b"oneway" => way.oneway = attr.value.as_ref() == b"yes",
            _ => {}
        }
    }

    way
}

fn parse_nd(start: quick_xml::events::BytesStart<'_>) -> Option<i64> {
    let mut ref_: i64 = 0;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"ref" => ref_ = from_utf8(&attr.value).ok()?.parse().ok()?,
            _ => {}
        }
    }

    if ref_ != 0 {
        Some(ref_)
    } else {
        None
    }
}
