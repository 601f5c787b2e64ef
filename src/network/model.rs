// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::Node;

/// Represents a `<way>` element of a network dataset:
/// an ordered run of nodes forming a road segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub name: String,
    pub speed: f32,
    pub oneway: bool,
    pub nodes: Vec<i64>,
}

/// Union over all elements of a network dataset.
#[derive(Debug, Clone)]
pub enum Feature {
    Node(Node),
    Way(Way),
}
