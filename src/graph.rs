// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Edge, Node};
use std::collections::btree_map::{BTreeMap, Entry};

/// Name index reserved for unnamed roads.
pub const NO_NAME: u32 = u32::MAX;

/// Represents a road network as a set of [Nodes](Node) and [Edges](Edge)
/// between them, plus a table of interned street names.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<i64, (Node, Vec<Edge>)>,
    names: Vec<String>,
}

impl Graph {
    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph contains no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().map(|(_, (node, _))| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<Node> {
        self.nodes.get(&id).map(|&(node, _)| node)
    }

    /// Creates or updates a [Node] with `node.id`.
    ///
    /// All outgoing and incoming edges are preserved.
    /// Updating a [Node] position might result in violation of the
    /// [Edge] distance invariant (and thus break route finding) and
    /// is therefore disallowed.
    pub fn set_node(&mut self, node: Node) {
        assert_ne!(node.id, 0);

        match self.nodes.entry(node.id) {
            Entry::Vacant(e) => {
                e.insert((node, Vec::default()));
            }
            Entry::Occupied(mut e) => {
                debug_assert_eq!(e.get().0.id, node.id);
                e.get_mut().0 = node;
            }
        }
    }

    /// Finds the closest [Node] to the given position.
    ///
    /// This function requires computing the distance to every [Node] in the graph,
    /// and is not suitable for large graphs. Use a [KDTree](crate::KDTree) instead.
    pub fn find_nearest_node(&self, lat: f32, lon: f32) -> Option<Node> {
        self.nodes
            .iter()
            .map(|(_, &(nd, _))| (earth_distance(lat, lon, nd.lat, nd.lon), nd))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.partial_cmp(b_dist).unwrap())
            .map(|(_, nd)| nd)
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    pub fn get_edges(&self, from_id: i64) -> &[Edge] {
        self.nodes
            .get(&from_id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Gets the [Edge] from one node to another, if one exists.
    pub fn get_edge(&self, from_id: i64, to_id: i64) -> Option<Edge> {
        self.nodes
            .get(&from_id)
            .and_then(|(_, e)| e.iter().find(|edge| edge.to == to_id))
            .copied()
    }

    /// Creates or updates an [Edge] from a node with a given id.
    pub fn set_edge(&mut self, from_id: i64, edge: Edge) {
        assert_ne!(from_id, 0);
        assert_ne!(edge.to, 0);

        if let Some((_, edges)) = self.nodes.get_mut(&from_id) {
            if let Some(candidate) = edges.iter_mut().find(|e| e.to == edge.to) {
                *candidate = edge;
            } else {
                edges.push(edge);
            }
        }
    }

    /// Interns a street name, returning its index for use in [Edge::name].
    /// Empty names intern as [NO_NAME].
    pub fn intern_name(&mut self, name: &str) -> u32 {
        if name.is_empty() {
            return NO_NAME;
        }
        if let Some(idx) = self.names.iter().position(|n| n == name) {
            return idx as u32;
        }
        self.names.push(name.to_string());
        (self.names.len() - 1) as u32
    }

    /// Resolves an interned name index back to the street name.
    pub fn name(&self, idx: u32) -> Option<&str> {
        if idx == NO_NAME {
            None
        } else {
            self.names.get(idx as usize).map(String::as_str)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_and_names() {
        let mut g = Graph::default();
        g.set_node(Node {
            id: 1,
            lat: 0.0,
            lon: 0.0,
        });
        g.set_node(Node {
            id: 2,
            lat: 0.0,
            lon: 0.01,
        });

        let name = g.intern_name("Main Street");
        assert_eq!(g.intern_name("Main Street"), name);
        assert_eq!(g.intern_name(""), NO_NAME);

        g.set_edge(
            1,
            Edge {
                to: 2,
                distance: 1113.2,
                duration: 80.1,
                name,
            },
        );

        assert_eq!(g.len(), 2);
        assert_eq!(g.get_edges(1).len(), 1);
        assert_eq!(g.get_edge(1, 2).unwrap().name, name);
        assert!(g.get_edge(2, 1).is_none());
        assert_eq!(g.name(name), Some("Main Street"));
        assert_eq!(g.name(NO_NAME), None);

        assert_eq!(g.find_nearest_node(0.001, 0.009).unwrap().id, 2);
    }
}
