// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{Edge, Graph};

/// A walk over a [Graph]: a sequence of graph-significant nodes and the [Edges](Edge)
/// traversed between them.
///
/// `nodes.len() == edges.len() + 1` for every reachable route, and `edges[i]`
/// connects `nodes[i]` with `nodes[i + 1]`. `length` is the sum of edge lengths,
/// in kilometers.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub nodes: Vec<i64>,
    pub edges: Vec<usize>,
    pub length: f64,
}

impl Route {
    /// Returns an empty route standing at `node_id`.
    pub fn starting_at(node_id: i64) -> Self {
        Self {
            nodes: vec![node_id],
            edges: Vec::default(),
            length: 0.0,
        }
    }

    /// Returns the route representing absence of any path: no nodes and infinite length.
    pub fn unreachable() -> Self {
        Self {
            nodes: Vec::default(),
            edges: Vec::default(),
            length: f64::INFINITY,
        }
    }

    pub fn is_reachable(&self) -> bool {
        !self.nodes.is_empty() && self.length.is_finite()
    }

    pub fn first(&self) -> Option<i64> {
        self.nodes.first().cloned()
    }

    pub fn last(&self) -> Option<i64> {
        self.nodes.last().cloned()
    }

    /// Returns true if the route has at least one edge and ends where it started.
    pub fn is_closed(&self) -> bool {
        !self.edges.is_empty() && self.first() == self.last()
    }

    /// Extends the route by walking over `edge` to `to`.
    pub(crate) fn push(&mut self, edge: &Edge, to: i64) {
        debug_assert_eq!(self.last().and_then(|n| edge.other_end(n)), Some(to));
        self.nodes.push(to);
        self.edges.push(edge.id);
        self.length += edge.length;
    }

    /// Appends another route, which must start where this one ends.
    pub(crate) fn append(&mut self, other: &Route) {
        debug_assert_eq!(self.last(), other.first());
        self.nodes.extend_from_slice(&other.nodes[1..]);
        self.edges.extend_from_slice(&other.edges);
        self.length += other.length;
    }

    /// Expands the route into the full sequence of node ids, including
    /// geometry-only nodes inside of every traversed edge.
    pub fn polyline(&self, g: &Graph) -> Vec<i64> {
        let mut polyline = Vec::with_capacity(self.nodes.len());
        polyline.extend(self.first());

        for (&from, &edge_id) in self.nodes.iter().zip(&self.edges) {
            if let Some(edge) = g.get_edge(edge_id) {
                polyline.extend(edge.nodes_from(from).skip(1));
            }
        }

        polyline
    }

    /// Expands the route into a sequence of (lat, lon) positions,
    /// following the shape of every traversed edge.
    pub fn coordinates(&self, g: &Graph) -> Vec<(f64, f64)> {
        self.polyline(g)
            .into_iter()
            .filter_map(|id| g.get_node(id).map(|n| (n.lat, n.lon)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        //  1 ─ 2
        //  │   │
        //  4 ─ 3  (5 lies on the 3-4 edge)
        let mut g = Graph::new();
        g.set_node(1, 0.01, 0.0);
        g.set_node(2, 0.01, 0.01);
        g.set_node(3, 0.0, 0.01);
        g.set_node(4, 0.0, 0.0);
        g.set_node(5, 0.0, 0.005);
        g.add_edge(vec![1, 2]).unwrap();
        g.add_edge(vec![2, 3]).unwrap();
        g.add_edge(vec![4, 5, 3]).unwrap();
        g.add_edge(vec![4, 1]).unwrap();
        g
    }

    #[test]
    fn push_and_polyline() {
        let g = graph();
        let mut r = Route::starting_at(1);
        for (edge, to) in [(0, 2), (1, 3), (2, 4), (3, 1)] {
            r.push(&g.edges()[edge], to);
        }

        assert!(r.is_closed());
        assert_eq!(r.nodes, vec![1, 2, 3, 4, 1]);
        assert_eq!(r.polyline(&g), vec![1, 2, 3, 5, 4, 1]);

        let expected: f64 = g.edges().iter().map(|e| e.length).sum();
        assert!((r.length - expected).abs() < 1e-9);

        let coords = r.coordinates(&g);
        assert_eq!(coords.len(), 6);
        assert_eq!(coords[3], (0.0, 0.005));
        assert_eq!(coords.first(), coords.last());
    }

    #[test]
    fn append() {
        let g = graph();
        let mut a = Route::starting_at(4);
        a.push(&g.edges()[2], 3);
        let mut b = Route::starting_at(3);
        b.push(&g.edges()[1], 2);

        a.append(&b);
        assert_eq!(a.nodes, vec![4, 3, 2]);
        assert_eq!(a.edges, vec![2, 1]);
        assert_eq!(a.polyline(&g), vec![4, 5, 3, 2]);
        assert!(!a.is_closed());
    }

    #[test]
    fn unreachable() {
        let r = Route::unreachable();
        assert!(!r.is_reachable());
        assert!(r.length.is_infinite());
        assert!(r.polyline(&Graph::new()).is_empty());
        assert!(Route::starting_at(1).is_reachable());
    }
}
