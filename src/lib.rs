// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Round-trip walking and running loops over [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! A raw map extract is converted into an undirected graph, where ways are split into
//! [Edges](Edge) at junctions. Over that graph, looproute generates closed loops
//! of approximately a requested length, starting and ending at the same [Node].
//! Two [strategies](round_trip::Strategy) are available: a length-targeted random walk
//! with probabilistic early closing, and a slower pheromone-guided search which
//! prefers round loops.
//!
//! # Example
//!
//! ```no_run
//! use rand::SeedableRng;
//!
//! let options = looproute::osm::Options {
//!     profile: &looproute::osm::FOOT_PROFILE,
//!     file_format: looproute::osm::FileFormat::Unknown,
//!     extent: Some(looproute::osm::Extent { lat: 43.7384, lon: 7.4246, radius: 3.0 }),
//! };
//! let g = looproute::osm::load_from_file(&options, "path/to/monaco.osm")
//!     .expect("failed to load monaco.osm");
//!
//! let start = g.find_nearest_node(43.7384, 7.4246).unwrap().id;
//! let bounds = looproute::round_trip::LengthBounds::around(5.0, 0.1).unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let route = looproute::round_trip::find_loop(
//!     &g,
//!     start,
//!     &bounds,
//!     &looproute::round_trip::Strategy::default(),
//!     &mut rng,
//!     &looproute::CancellationToken::new(),
//! )
//! .expect("failed to find a loop");
//!
//! println!("{:.2} km: {:?}", route.length, route.coordinates(&g));
//! ```

mod astar;
mod cancel;
mod distance;
mod error;
mod graph;
pub mod osm;
pub mod round_trip;
mod route;

pub use astar::{find_path, find_path_cancellable};
pub use cancel::CancellationToken;
pub use distance::earth_distance;
pub use error::{DataError, Error};
pub use graph::{Graph, LENGTH_EPSILON};
pub use route::Route;

/// Represents a single point of the [Graph].
///
/// Nodes at junctions and dead ends have a non-empty list of incident [edges](Node::edges).
/// Nodes which only describe the shape of an [Edge] (interior nodes) have no incident edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,

    /// Indices (into [Graph::edges]) of edges which start or end at this node.
    pub edges: Vec<usize>,
}

impl Node {
    /// Returns true if any edge starts or ends at this node.
    pub fn is_significant(&self) -> bool {
        !self.edges.is_empty()
    }
}

/// Represents an undirected polyline connection between two graph-significant nodes.
///
/// Only the first and last [nodes](Edge::nodes) connect the edge to the rest of the [Graph];
/// interior nodes describe geometry only.
///
/// `length` (in kilometers) is never smaller than the crow-flies distance between the endpoints.
///
/// Edges are meant to be created by [Graph::add_edge] or [Graph::add_edge_with_length],
/// which reject polylines with fewer than 2 nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Index of this edge in [Graph::edges].
    pub id: usize,

    /// Polyline of the edge, always with at least 2 nodes.
    pub nodes: Vec<i64>,

    pub length: f64,
}

impl Edge {
    /// # Panics
    ///
    /// Panics if [Edge::nodes] is empty.
    pub fn first(&self) -> i64 {
        self.nodes[0]
    }

    /// # Panics
    ///
    /// Panics if [Edge::nodes] is empty.
    pub fn last(&self) -> i64 {
        self.nodes[self.nodes.len() - 1]
    }

    /// Returns the endpoint opposite to `node_id`, or `None` if the edge
    /// doesn't start or end at `node_id`.
    pub fn other_end(&self, node_id: i64) -> Option<i64> {
        if self.first() == node_id {
            Some(self.last())
        } else if self.last() == node_id {
            Some(self.first())
        } else {
            None
        }
    }

    pub fn is_loop(&self) -> bool {
        self.first() == self.last()
    }

    /// Iterates over the edge's nodes, starting from the `from` endpoint.
    pub fn nodes_from(&self, from: i64) -> Box<dyn Iterator<Item = i64> + '_> {
        if self.first() == from {
            Box::new(self.nodes.iter().cloned())
        } else {
            Box::new(self.nodes.iter().rev().cloned())
        }
    }
}
