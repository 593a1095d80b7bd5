// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, DataError, Edge, Node};
use std::collections::btree_map::{BTreeMap, Entry};

/// Length (in kilometers) added to every segment of an [Edge] polyline,
/// so that no edge (even between nodes at the same position) has zero length.
pub const LENGTH_EPSILON: f64 = 1e-6;

/// Represents a walkable network as an arena of [Nodes](Node) and undirected [Edges](Edge).
///
/// Nodes refer to edges by their index in [Graph::edges], and edges refer to nodes by id,
/// so there are no ownership cycles between the two. The graph is never modified by searches;
/// any per-search state lives in overlays local to the search.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<i64, Node>,
    edges: Vec<Edge>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph, including geometry-only nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns all [Edges](Edge) in the graph. The position of an edge in this slice
    /// is equal to its [id](Edge::id).
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Retrieves an [Edge] by its index.
    pub fn get_edge(&self, id: usize) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Creates a [Node] with the given id, or updates the position of an existing one.
    ///
    /// Moving a node which is already part of an [Edge] would break
    /// the edge length invariant, and is therefore disallowed.
    pub fn set_node(&mut self, id: i64, lat: f64, lon: f64) {
        match self.nodes.entry(id) {
            Entry::Vacant(e) => {
                e.insert(Node {
                    id,
                    lat,
                    lon,
                    edges: Vec::default(),
                });
            }
            Entry::Occupied(mut e) => {
                debug_assert!(e.get().edges.is_empty(), "moving node {id} with edges");
                let n = e.get_mut();
                n.lat = lat;
                n.lon = lon;
            }
        }
    }

    /// Adds an [Edge] over the provided polyline of existing nodes. The length is computed
    /// as the sum of great-circle distances between consecutive nodes, each nudged by
    /// [LENGTH_EPSILON]. Returns the id of the new edge.
    pub fn add_edge(&mut self, nodes: Vec<i64>) -> Result<usize, DataError> {
        let length = self.polyline_length(&nodes)?;
        self.insert_edge(nodes, length)
    }

    /// Adds an [Edge] with an explicit length.
    ///
    /// Route finding is only optimal if `length` is not smaller than the crow-flies
    /// distance between the endpoints of the edge.
    pub fn add_edge_with_length(
        &mut self,
        nodes: Vec<i64>,
        length: f64,
    ) -> Result<usize, DataError> {
        if !length.is_finite() || length < 0.0 {
            return Err(DataError::InvalidLength(length));
        }
        self.polyline_length(&nodes)?;
        self.insert_edge(nodes, length)
    }

    fn insert_edge(&mut self, nodes: Vec<i64>, length: f64) -> Result<usize, DataError> {
        let id = self.edges.len();
        let edge = Edge { id, nodes, length };
        let (first, last) = (edge.first(), edge.last());

        // polyline_length has already checked that the endpoints exist
        if let Some(n) = self.nodes.get_mut(&first) {
            n.edges.push(id);
        }
        if last != first {
            if let Some(n) = self.nodes.get_mut(&last) {
                n.edges.push(id);
            }
        }

        self.edges.push(edge);
        Ok(id)
    }

    /// Computes the length of a polyline over existing nodes, as used for [Edge::length].
    pub fn polyline_length(&self, nodes: &[i64]) -> Result<f64, DataError> {
        if nodes.len() < 2 {
            return Err(DataError::EdgeTooShort(nodes.len()));
        }

        let mut length = 0.0;
        for pair in nodes.windows(2) {
            let a = self.nodes.get(&pair[0]).ok_or(DataError::UnknownNode(pair[0]))?;
            let b = self.nodes.get(&pair[1]).ok_or(DataError::UnknownNode(pair[1]))?;
            length += earth_distance(a.lat, a.lon, b.lat, b.lon) + LENGTH_EPSILON;
        }
        Ok(length)
    }

    /// Iterates over all edges incident to the node, together with the node on the other end.
    /// Self-loop edges are reported with the node itself on the other end.
    pub fn neighbors(&self, node_id: i64) -> impl Iterator<Item = (&Edge, i64)> + '_ {
        self.nodes
            .get(&node_id)
            .into_iter()
            .flat_map(move |n| n.edges.iter())
            .filter_map(move |&idx| {
                let edge = &self.edges[idx];
                edge.other_end(node_id).map(|to| (edge, to))
            })
    }

    /// Returns the great-circle distance between two nodes, or `None` if any of them is missing.
    pub fn crow_distance(&self, a: i64, b: i64) -> Option<f64> {
        let a = self.nodes.get(&a)?;
        let b = self.nodes.get(&b)?;
        Some(earth_distance(a.lat, a.lon, b.lat, b.lon))
    }

    /// Finds the closest [Node] with at least one incident edge to the given position.
    ///
    /// This function requires computing the distance to every [Node] in the graph,
    /// and is not suitable for huge graphs.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<&Node> {
        self.nodes
            .values()
            .filter(|nd| nd.is_significant())
            .map(|nd| (earth_distance(lat, lon, nd.lat, nd.lon), nd))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.total_cmp(b_dist))
            .map(|(_, nd)| nd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph {
        let mut g = Graph::new();
        g.set_node(1, 0.0, 0.0);
        g.set_node(2, 0.0, 0.01);
        g.set_node(3, 0.01, 0.01);
        g.set_node(4, 0.01, 0.0);
        g.add_edge(vec![1, 2]).unwrap();
        g.add_edge(vec![2, 3]).unwrap();
        g.add_edge(vec![3, 4, 1]).unwrap();
        g
    }

    #[test]
    fn incident_edges() {
        let g = triangle();
        assert_eq!(g.len(), 4);
        assert_eq!(g.edges().len(), 3);

        assert_eq!(g.get_node(1).unwrap().edges, vec![0, 2]);
        assert_eq!(g.get_node(2).unwrap().edges, vec![0, 1]);
        assert_eq!(g.get_node(3).unwrap().edges, vec![1, 2]);
        assert!(g.get_node(4).unwrap().edges.is_empty());

        for node in g.iter() {
            for &e in &node.edges {
                assert!(g.edges()[e].other_end(node.id).is_some());
            }
        }
    }

    #[test]
    fn neighbors() {
        let g = triangle();
        let mut n: Vec<(usize, i64)> = g.neighbors(1).map(|(e, to)| (e.id, to)).collect();
        n.sort();
        assert_eq!(n, vec![(0, 2), (2, 3)]);
        assert_eq!(g.neighbors(4).count(), 0);
        assert_eq!(g.neighbors(42).count(), 0);
    }

    #[test]
    fn edge_length_is_sum_of_segments() {
        let g = triangle();
        let e = &g.edges()[2];
        let expected = earth_distance(0.01, 0.01, 0.01, 0.0) + earth_distance(0.01, 0.0, 0.0, 0.0);
        assert!((e.length - expected).abs() < 1e-5);
        assert!(e.length > expected);
    }

    #[test]
    fn zero_length_segments_are_nudged() {
        let mut g = Graph::new();
        g.set_node(1, 10.0, 10.0);
        g.set_node(2, 10.0, 10.0);
        let e = g.add_edge(vec![1, 2]).unwrap();
        assert!(g.edges()[e].length > 0.0);
    }

    #[test]
    fn invalid_edges() {
        let mut g = triangle();
        assert!(matches!(g.add_edge(vec![]), Err(DataError::EdgeTooShort(0))));
        assert!(matches!(g.add_edge(vec![1]), Err(DataError::EdgeTooShort(1))));
        assert!(matches!(
            g.add_edge_with_length(vec![2], 1.0),
            Err(DataError::EdgeTooShort(1))
        ));
        assert!(matches!(g.add_edge(vec![1, 99]), Err(DataError::UnknownNode(99))));
        assert!(matches!(
            g.add_edge_with_length(vec![1, 3], f64::NAN),
            Err(DataError::InvalidLength(_))
        ));
        assert_eq!(g.edges().len(), 3);
        for e in g.edges() {
            assert!(e.nodes.len() >= 2);
            assert_eq!(e.first(), e.nodes[0]);
            assert_eq!(e.last(), *e.nodes.last().unwrap());
        }
    }

    #[test]
    fn self_loop_registered_once() {
        let mut g = triangle();
        let e = g.add_edge(vec![2, 4, 3, 2]).unwrap();
        assert!(g.edges()[e].is_loop());
        assert_eq!(g.get_node(2).unwrap().edges, vec![0, 1, e]);
        assert!(g.neighbors(2).any(|(edge, to)| edge.id == e && to == 2));
    }

    #[test]
    fn find_nearest_node_skips_geometry_nodes() {
        let g = triangle();
        // Node 4 is the closest, but has no edges
        assert_eq!(g.find_nearest_node(0.011, 0.003).unwrap().id, 3);
        assert_eq!(g.find_nearest_node(-0.001, 0.0).unwrap().id, 1);
        assert!(Graph::new().find_nearest_node(0.0, 0.0).is_none());
    }
}
