// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::{DataError, Error, Graph};

use super::model::{Feature, RawNode, Way};
use super::{Extent, FeatureReader, Options};

/// Helper object used for storing state related to converting [OSM features](Feature)
/// into a [Graph].
///
/// Ways can reference nodes which appear later in the stream, so all features are
/// collected first and the graph is only assembled once the stream is exhausted.
pub(super) struct GraphBuilder<'a> {
    options: &'a Options<'a>,
    extent: Option<Extent>,
    nodes: HashMap<i64, RawNode>,
    ways: Vec<(i64, Vec<i64>)>,

    /// Number of occurrences of a node in all accepted ways,
    /// not counting immediate repetitions within a way.
    link_counts: HashMap<i64, u32>,
}

impl<'a> GraphBuilder<'a> {
    /// Create a new, empty graph builder.
    pub(super) fn new(options: &'a Options<'a>) -> Self {
        let extent = options.extent.filter(|e| {
            let valid = e.is_valid();
            if !valid {
                warn!("ignoring invalid extent {e:?}");
            }
            valid
        });

        Self {
            options,
            extent,
            nodes: HashMap::default(),
            ways: Vec::default(),
            link_counts: HashMap::default(),
        }
    }

    /// Add all features from the provided [FeatureReader] and assemble the [Graph].
    pub(super) fn add_features<F: FeatureReader>(
        mut self,
        mut features: F,
    ) -> Result<Graph, Error> {
        while let Some(f) = features.next_feature()? {
            self.add_feature(f)?;
        }
        self.build()
    }

    fn add_feature(&mut self, f: Feature) -> Result<(), DataError> {
        match f {
            Feature::Node(n) => self.add_node(n),
            Feature::Way(w) => return self.add_way(w),
            Feature::Relation(id) => trace!("ignoring relation {id}"),
        }
        Ok(())
    }

    fn add_node(&mut self, n: RawNode) {
        if n.id != 0 && self.is_in_extent(n.lat, n.lon) {
            self.nodes.insert(n.id, n);
        }
    }

    fn is_in_extent(&self, lat: f64, lon: f64) -> bool {
        self.extent.map_or(true, |e| e.contains(lat, lon))
    }

    fn add_way(&mut self, w: Way) -> Result<(), DataError> {
        if w.nodes.len() < 2 {
            return Err(DataError::WayTooShort {
                way_id: w.id,
                count: w.nodes.len(),
            });
        }

        if !self.options.profile.is_allowed(&w.tags) {
            trace!("way {} rejected by the {} profile", w.id, self.options.profile.name);
            return Ok(());
        }

        // A node repeated in a row is a single reference, not a junction
        let mut nodes = w.nodes;
        nodes.dedup();

        for &node_id in &nodes {
            *self.link_counts.entry(node_id).or_default() += 1;
        }
        self.ways.push((w.id, nodes));
        Ok(())
    }

    fn build(self) -> Result<Graph, Error> {
        let mut g = Graph::new();
        let mut skipped_ways: usize = 0;

        for (way_id, nodes) in &self.ways {
            let edges = self.split_way(*way_id, nodes);
            if edges.is_empty() {
                skipped_ways += 1;
            }

            for edge_nodes in edges {
                for &node_id in &edge_nodes {
                    if g.get_node(node_id).is_none() {
                        let n = &self.nodes[&node_id];
                        g.set_node(n.id, n.lat, n.lon);
                    }
                }
                g.add_edge(edge_nodes)?;
            }
        }

        debug!(
            "built graph with {} nodes and {} edges from {} ways ({} skipped) using the {} profile",
            g.len(),
            g.edges().len(),
            self.ways.len(),
            skipped_ways,
            self.options.profile.name,
        );

        Ok(g)
    }

    /// Splits the node sequence of a way into edge polylines, breaking it at every
    /// junction. References to unknown nodes are dropped; returns an empty list if
    /// fewer than 2 nodes remain.
    fn split_way(&self, way_id: i64, nodes: &[i64]) -> Vec<Vec<i64>> {
        let mut known: Vec<i64> = nodes
            .iter()
            .cloned()
            .filter(|node_id| self.nodes.contains_key(node_id))
            .collect();
        known.dedup();

        if known.len() < 2 {
            warn!(
                "way {way_id} has {} known node(s) out of {} - skipping",
                known.len(),
                nodes.len()
            );
            return vec![];
        }

        let mut edges = Vec::default();
        let mut current = vec![known[0]];
        let last_idx = known.len() - 1;

        for (idx, &node_id) in known.iter().enumerate().skip(1) {
            current.push(node_id);
            if idx == last_idx || self.is_junction(node_id) {
                edges.push(std::mem::replace(&mut current, vec![node_id]));
            }
        }

        edges
    }

    fn is_junction(&self, node_id: i64) -> bool {
        self.link_counts.get(&node_id).map_or(false, |&c| c > 1)
    }
}
