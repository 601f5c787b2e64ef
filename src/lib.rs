// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Routing over road-network datasets, with a stable C ABI.
//!
//! The library side loads a [network dataset](crate::network) into a standard
//! weighted directed [Graph], and answers route, travel-time table, nearest-point,
//! trip and map-matching queries through an [Engine](crate::engine::Engine).
//! Edge weights carry both distance (meters) and duration (seconds); shortest
//! paths minimize duration.
//!
//! The [c] module exposes the whole engine behind a flat, opaque-handle
//! C calling convention (`viac_*` symbols), with explicit error objects
//! instead of Rust errors. The generated header lands in `include/via.h`.
//!
//! # Example
//!
//! ```no_run
//! let dataset = via::engine::Dataset::load("path/to/city.via.xml")
//!     .expect("failed to load dataset");
//!
//! let start = dataset.graph.find_nearest_node(52.2319, 21.0067).unwrap();
//! let end = dataset.graph.find_nearest_node(52.2478, 21.0146).unwrap();
//! let route = via::shortest_path(&dataset.graph, start.id, end.id, via::DEFAULT_STEP_LIMIT)
//!     .expect("failed to find route");
//!
//! println!("Route: {:?}", route);
//! ```

pub mod c;
mod distance;
pub mod engine;
mod graph;
mod kd;
pub mod network;
mod search;

pub use distance::{earth_distance, initial_bearing};
pub use graph::{Graph, NO_NAME};
pub use kd::KDTree;
pub use search::{shortest_path, SearchError, DEFAULT_STEP_LIMIT};

/// Represents a vertex of the road-network [Graph].
///
/// Nodes with `id == 0` are disallowed; the zero id is used by the
/// C bindings to signify absence of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f32,
    pub lon: f32,
}

/// Represents an outgoing (one-way) connection from a specific [Node].
///
/// `distance` is in meters and must be no smaller than the crow-flies
/// distance between the two nodes; `duration` is in seconds. `name` indexes
/// the graph's interned street-name table, or is [NO_NAME] for unnamed roads.
///
/// Due to implementation details, `to` might not exist in the [Graph].
/// Users must silently ignore such edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: i64,
    pub distance: f32,
    pub duration: f32,
    pub name: u32,
}
