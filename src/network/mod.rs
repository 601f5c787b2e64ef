// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Loading of road-network datasets.
//!
//! A dataset is an XML document (optionally gzip-compressed) listing nodes
//! and ways:
//!
//! ```xml
//! <network>
//!   <node id="1" lat="52.2319" lon="21.0067"/>
//!   <node id="2" lat="52.2319" lon="21.0167"/>
//!   <way name="Main Street" speed="50" oneway="yes">
//!     <nd ref="1"/>
//!     <nd ref="2"/>
//!   </way>
//! </network>
//! ```
//!
//! `speed` is in km/h and applies to the whole way; `oneway="yes"` creates
//! only forward edges. Edge distances are great-circle distances between
//! the endpoints, and durations follow from the way's speed.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::{earth_distance, Edge, Graph};

mod model;
mod xml;

/// Highest permitted way speed, in km/h. Way speeds are clamped into
/// `[1, MAX_SPEED_KMH]` on load, which keeps the route search heuristic
/// admissible.
pub const MAX_SPEED_KMH: f32 = 130.0;

/// [MAX_SPEED_KMH] expressed in m/s.
pub(crate) const MAX_SPEED_MPS: f32 = MAX_SPEED_KMH / 3.6;

/// Format of the input dataset file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Unknown format - guess based on the file extension.
    Unknown,

    /// Force uncompressed XML.
    Xml,

    /// Force XML with [gzip](https://en.wikipedia.org/wiki/Gzip) compression.
    XmlGz,
}

impl Format {
    /// Resolves [Format::Unknown] from a file path's extension.
    /// Defaults to plain XML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some("gz") => Format::XmlGz,
            _ => Format::Xml,
        }
    }
}

/// Error conditions which may occur when loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed dataset: {0}")]
    Xml(#[from] quick_xml::Error),
}

/// Helper object used for storing state related to converting
/// [network features](model::Feature) into a [Graph].
///
/// Ways may reference nodes defined later in the document, so edge
/// creation is deferred until every feature has been consumed.
struct GraphBuilder {
    g: Graph,
    ways: Vec<model::Way>,
}

impl GraphBuilder {
    fn new() -> Self {
        Self {
            g: Graph::default(),
            ways: Vec::default(),
        }
    }

    fn add_features<I: Iterator<Item = Result<model::Feature, quick_xml::Error>>>(
        &mut self,
        features: I,
    ) -> Result<(), Error> {
        for f in features {
            match f? {
                model::Feature::Node(n) => self.g.set_node(n),
                model::Feature::Way(w) => self.ways.push(w),
            }
        }
        Ok(())
    }

    fn finish(mut self) -> Graph {
        let ways = std::mem::take(&mut self.ways);
        for way in &ways {
            self.add_way(way);
        }
        self.cleanup();
        self.g
    }

    fn add_way(&mut self, way: &model::Way) {
        let speed = match validate_speed(way.speed) {
            Some(speed) => speed,
            None => {
                log::warn!("discarding way {:?} without a valid speed", way.name);
                return;
            }
        };
        let speed_mps = speed / 3.6;
        let name = self.g.intern_name(&way.name);

        for pair in way.nodes.windows(2) {
            let (from, to) = match (self.g.get_node(pair[0]), self.g.get_node(pair[1])) {
                (Some(from), Some(to)) => (from, to),
                _ => {
                    log::warn!(
                        "way {:?} references missing node {} or {}",
                        way.name,
                        pair[0],
                        pair[1]
                    );
                    continue;
                }
            };

            let distance = earth_distance(from.lat, from.lon, to.lat, to.lon);
            let duration = distance / speed_mps;

            self.g.set_edge(
                from.id,
                Edge {
                    to: to.id,
                    distance,
                    duration,
                    name,
                },
            );
            if !way.oneway {
                self.g.set_edge(
                    to.id,
                    Edge {
                        to: from.id,
                        distance,
                        duration,
                        name,
                    },
                );
            }
        }
    }

    /// Drops nodes not connected to any edge, so that snapping never
    /// targets a node the route search cannot use.
    fn cleanup(&mut self) {
        let mut used = std::collections::HashSet::<i64>::new();
        for node in self.g.iter() {
            for edge in self.g.get_edges(node.id) {
                used.insert(node.id);
                used.insert(edge.to);
            }
        }
        let unused: Vec<i64> = self
            .g
            .iter()
            .map(|n| n.id)
            .filter(|id| !used.contains(id))
            .collect();
        if unused.is_empty() {
            return;
        }

        log::debug!("dropping {} nodes with no edges", unused.len());
        let g = std::mem::take(&mut self.g);

        let mut pruned = Graph::default();
        for node in g.iter().filter(|n| used.contains(&n.id)) {
            pruned.set_node(*node);
        }
        let kept: Vec<i64> = pruned.iter().map(|n| n.id).collect();
        for id in kept {
            for edge in g.get_edges(id) {
                let name = g
                    .name(edge.name)
                    .map(|n| pruned.intern_name(n))
                    .unwrap_or(crate::NO_NAME);
                pruned.set_edge(id, Edge { name, ..*edge });
            }
        }

        self.g = pruned;
    }
}

/// Clamps a way speed into `[1, MAX_SPEED_KMH]` km/h, or returns `None` for
/// non-finite (missing or unparsable) speeds.
fn validate_speed(speed: f32) -> Option<f32> {
    if !speed.is_finite() {
        return None;
    }

    let clamped = speed.clamp(1.0, MAX_SPEED_KMH);
    if clamped != speed {
        log::warn!("clamping way speed {} km/h to {} km/h", speed, clamped);
    }
    Some(clamped)
}

/// Parses a dataset from a reader into a [Graph] as per the provided [Format].
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn load_from_io<R: io::Read>(format: Format, reader: R) -> Result<Graph, Error> {
    let mut builder = GraphBuilder::new();
    match format {
        Format::Unknown | Format::Xml => {
            let b = io::BufReader::new(reader);
            builder.add_features(xml::features_from_io(b))?;
        }

        Format::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(reader);
            let b = io::BufReader::new(d);
            builder.add_features(xml::features_from_io(b))?;
        }
    }
    Ok(builder.finish())
}

/// Parses a dataset file at the provided path into a [Graph].
/// The format is guessed from the file extension.
pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Graph, Error> {
    let format = Format::from_path(&path);
    log::info!("loading dataset from {:?} as {:?}", path.as_ref(), format);
    let f = File::open(path)?;
    load_from_io(format, f)
}

/// Parses a dataset from a static buffer into a [Graph] as per the provided [Format].
pub fn load_from_buffer(format: Format, data: &[u8]) -> Result<Graph, Error> {
    if format == Format::Xml {
        // Fast path is available for in-memory XML data
        let mut builder = GraphBuilder::new();
        builder.add_features(xml::features_from_buffer(data))?;
        Ok(builder.finish())
    } else {
        // Wrap the buffer in a cursor and use the IO path
        let cursor = io::Cursor::new(data);
        load_from_io(format, cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                ((($a - $b) as f32).abs() < $b * 0.01),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    macro_rules! assert_edge {
        ($graph:expr, $from:expr, $to:expr) => {
            assert!($graph.get_edge($from, $to).is_some());
        };
    }

    macro_rules! assert_no_edge {
        ($graph:expr, $from:expr, $to:expr) => {
            assert!($graph.get_edge($from, $to).is_none());
        };
    }

    fn check_grid(g: &Graph) {
        //   5────4────3
        //   │    ↑    │
        //   │    6    │   (Short Street: one-way 6 -> 4)
        //   │         │
        //   1────2────3'  (3' = same node 3; Main Street 1-2-3)

        // Node 9 is referenced by no way and must have been dropped
        assert_eq!(g.len(), 6);
        assert!(g.get_node(9).is_none());

        // Main Street, two-way
        assert_edge!(g, 1, 2);
        assert_edge!(g, 2, 1);
        assert_edge!(g, 2, 3);
        assert_edge!(g, 3, 2);

        // Short Street, one-way 6 -> 4
        assert_edge!(g, 6, 4);
        assert_no_edge!(g, 4, 6);

        // 0.01° of longitude at this latitude is roughly 682 m;
        // Main Street is signed at 50 km/h
        let e = g.get_edge(1, 2).unwrap();
        assert_almost_eq!(e.distance, 682.0);
        assert_almost_eq!(e.duration, 682.0 / (50.0 / 3.6));
        assert_eq!(g.name(e.name), Some("Main Street"));
    }

    #[test]
    fn load_xml() {
        const DATA: &[u8] = include_bytes!("test_fixtures/grid.via.xml");
        let g = load_from_buffer(Format::Xml, DATA).unwrap();
        check_grid(&g);
    }

    #[test]
    fn load_xml_gz() {
        const DATA: &[u8] = include_bytes!("test_fixtures/grid.via.xml.gz");
        let g = load_from_buffer(Format::XmlGz, DATA).unwrap();
        check_grid(&g);
    }

    #[test]
    fn speed_is_clamped() {
        const DATA: &[u8] = br#"<network>
            <node id="1" lat="52.23" lon="21.00"/>
            <node id="2" lat="52.23" lon="21.01"/>
            <way name="Autobahn" speed="200"><nd ref="1"/><nd ref="2"/></way>
        </network>"#;
        let g = load_from_buffer(Format::Xml, DATA).unwrap();
        let e = g.get_edge(1, 2).unwrap();
        assert_almost_eq!(e.duration, e.distance / (MAX_SPEED_KMH / 3.6));
    }

    #[test]
    fn slow_speed_is_clamped_up() {
        const DATA: &[u8] = br#"<network>
            <node id="1" lat="52.23" lon="21.00"/>
            <node id="2" lat="52.23" lon="21.01"/>
            <way name="Footpath" speed="0.5"><nd ref="1"/><nd ref="2"/></way>
        </network>"#;
        let g = load_from_buffer(Format::Xml, DATA).unwrap();
        let e = g.get_edge(1, 2).expect("clamped way must keep its edges");
        assert_almost_eq!(e.duration, e.distance / (1.0 / 3.6));
    }

    #[test]
    fn missing_speed_discards_way() {
        const DATA: &[u8] = br#"<network>
            <node id="1" lat="52.23" lon="21.00"/>
            <node id="2" lat="52.23" lon="21.01"/>
            <way name="Broken"><nd ref="1"/><nd ref="2"/></way>
        </network>"#;
        let g = load_from_buffer(Format::Xml, DATA).unwrap();
        assert!(g.is_empty());
    }

    #[test]
    fn format_from_path() {
        assert_eq!(Format::from_path("city.via.xml"), Format::Xml);
        assert_eq!(Format::from_path("city.via.xml.gz"), Format::XmlGz);
    }
}
