// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::{earth_distance, CancellationToken, Error, Graph, Route};

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: i64,
    cost: f64,
    score: f64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: We revert the order of comparison,
        // as lower scores are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        // Ties are broken in favor of lower node ids.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.at.cmp(&self.at))
    }
}

/// Predecessor overlay of a single search: node → (previous node, edge used to get there).
type CameFrom = HashMap<i64, (i64, usize)>;

fn reconstruct_path(g: &Graph, came_from: &CameFrom, mut last: i64) -> Route {
    let mut nodes = vec![last];
    let mut edges = Vec::default();

    while let Some(&(nd, edge)) = came_from.get(&last) {
        nodes.push(nd);
        edges.push(edge);
        last = nd;
    }

    nodes.reverse();
    edges.reverse();
    let length = edges.iter().filter_map(|&e| g.get_edge(e)).map(|e| e.length).sum();
    Route {
        nodes,
        edges,
        length,
    }
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find the shortest route between two nodes in the provided graph.
///
/// Returns [Route::unreachable] (no nodes and infinite length) if there is no route
/// between the two nodes. Returns [Error::InvalidReference] if any of the nodes doesn't exist.
///
/// The heuristic is the great-circle distance to `to_id`. Among frontier nodes with
/// equal scores, the one with the lowest id is expanded first, so results are reproducible.
pub fn find_path(g: &Graph, from_id: i64, to_id: i64) -> Result<Route, Error> {
    find_path_cancellable(g, from_id, to_id, &CancellationToken::default())
}

/// Same as [find_path], but checks the `token` before every node expansion,
/// returning [Error::Cancelled] once it is cancelled.
pub fn find_path_cancellable(
    g: &Graph,
    from_id: i64,
    to_id: i64,
    token: &CancellationToken,
) -> Result<Route, Error> {
    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut came_from: CameFrom = HashMap::default();
    let mut known_costs: HashMap<i64, f64> = HashMap::default();

    let to_node = g.get_node(to_id).ok_or(Error::InvalidReference(to_id))?;

    {
        let from_node = g.get_node(from_id).ok_or(Error::InvalidReference(from_id))?;

        let initial_distance =
            earth_distance(from_node.lat, from_node.lon, to_node.lat, to_node.lon);

        queue.push(QueueItem {
            at: from_id,
            cost: 0.0,
            score: initial_distance,
        });
        known_costs.insert(from_id, 0.0);
    }

    while let Some(item) = queue.pop() {
        if item.at == to_id {
            return Ok(reconstruct_path(g, &came_from, to_id));
        }

        // Contrary to the wikipedia definition, we might keep multiple items in the queue
        // for the same node.
        if item.cost > known_costs.get(&item.at).cloned().unwrap_or(f64::INFINITY) {
            continue;
        }

        token.checkpoint()?;

        for (edge, neighbor_id) in g.neighbors(item.at) {
            // Check if this is the cheapest way to the neighbor
            let neighbor_cost = item.cost + edge.length;
            if neighbor_cost
                >= known_costs
                    .get(&neighbor_id)
                    .cloned()
                    .unwrap_or(f64::INFINITY)
            {
                continue;
            }

            // Neighbors are always present, as edges only end at existing nodes
            let Some(neighbor) = g.get_node(neighbor_id) else {
                continue;
            };

            // Push the new item into the queue
            came_from.insert(neighbor_id, (item.at, edge.id));
            known_costs.insert(neighbor_id, neighbor_cost);
            queue.push(QueueItem {
                at: neighbor_id,
                cost: neighbor_cost,
                score: neighbor_cost
                    + earth_distance(neighbor.lat, neighbor.lon, to_node.lat, to_node.lon),
            });
        }
    }

    Ok(Route::unreachable())
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-9),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    /// Nodes placed 0.001° apart (≈111 m), with explicit lengths in kilometers:
    ///
    /// ```text
    ///     1 ──0.5── 2 ──0.5── 3
    ///     │                   │
    ///    0.2                 0.2
    ///     │                   │
    ///     4 ───────0.3─────── 5        6 ─ 7 (separate component)
    /// ```
    fn graph() -> Graph {
        let mut g = Graph::new();
        g.set_node(1, 0.001, 0.0);
        g.set_node(2, 0.001, 0.001);
        g.set_node(3, 0.001, 0.002);
        g.set_node(4, 0.0, 0.0);
        g.set_node(5, 0.0, 0.002);
        g.set_node(6, 0.0, 0.010);
        g.set_node(7, 0.0, 0.011);
        g.add_edge_with_length(vec![1, 2], 0.5).unwrap();
        g.add_edge_with_length(vec![2, 3], 0.5).unwrap();
        g.add_edge_with_length(vec![1, 4], 0.2).unwrap();
        g.add_edge_with_length(vec![3, 5], 0.2).unwrap();
        g.add_edge_with_length(vec![4, 5], 0.3).unwrap();
        g.add_edge_with_length(vec![6, 7], 0.2).unwrap();
        g
    }

    #[test]
    fn shortest_path() {
        let g = graph();
        let r = find_path(&g, 1, 3).unwrap();
        assert_eq!(r.nodes, vec![1, 4, 5, 3]);
        assert_eq!(r.edges, vec![2, 4, 3]);
        assert_almost_eq!(r.length, 0.7);
    }

    #[test]
    fn shortest_path_is_not_longer_than_alternatives() {
        let g = graph();
        // All simple paths between 2 and 5, enumerated by hand
        let alternatives = [0.5 + 0.2, 0.5 + 0.2 + 0.3];
        let r = find_path(&g, 2, 5).unwrap();
        assert_eq!(r.first(), Some(2));
        assert_eq!(r.last(), Some(5));
        for alt in alternatives {
            assert!(r.length <= alt + 1e-9);
        }
        assert_almost_eq!(r.length, 0.7);
    }

    #[test]
    fn symmetric_length() {
        let g = graph();
        let a = find_path(&g, 2, 4).unwrap();
        let b = find_path(&g, 4, 2).unwrap();
        assert_almost_eq!(a.length, b.length);
    }

    #[test]
    fn same_node() {
        let g = graph();
        let r = find_path(&g, 2, 2).unwrap();
        assert_eq!(r.nodes, vec![2]);
        assert!(r.edges.is_empty());
        assert_eq!(r.length, 0.0);
    }

    #[test]
    fn unreachable() {
        let g = graph();
        let r = find_path(&g, 1, 7).unwrap();
        assert!(r.nodes.is_empty());
        assert!(r.length.is_infinite());
        assert!(!r.is_reachable());
    }

    #[test]
    fn invalid_reference() {
        let g = graph();
        assert!(matches!(find_path(&g, 1, 42), Err(Error::InvalidReference(42))));
        assert!(matches!(find_path(&g, 42, 1), Err(Error::InvalidReference(42))));
    }

    #[test]
    fn ties_are_broken_by_lowest_node_id() {
        //   2
        //  / \
        // 1   4
        //  \ /
        //   3
        let mut g = Graph::new();
        g.set_node(1, 0.0, 0.0);
        g.set_node(2, 0.001, 0.001);
        g.set_node(3, -0.001, 0.001);
        g.set_node(4, 0.0, 0.002);
        g.add_edge_with_length(vec![1, 3], 1.0).unwrap();
        g.add_edge_with_length(vec![1, 2], 1.0).unwrap();
        g.add_edge_with_length(vec![3, 4], 1.0).unwrap();
        g.add_edge_with_length(vec![2, 4], 1.0).unwrap();

        for _ in 0..10 {
            assert_eq!(find_path(&g, 1, 4).unwrap().nodes, vec![1, 2, 4]);
        }
    }

    #[test]
    fn cancelled() {
        let g = graph();
        let token = CancellationToken::new();
        token.cancel();
        assert!(matches!(
            find_path_cancellable(&g, 1, 3, &token),
            Err(Error::Cancelled)
        ));
    }
}
