// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Length-targeted random walk with probabilistic early closing.
//!
//! The walk starts at the requested node and at every step either follows a uniformly
//! random incident edge, or makes the first step of the shortest path back to the start.
//! The probability of heading back grows with the accumulated length plus the crow-flies
//! distance to the start, reaching one once that sum reaches the maximum length.

use log::debug;
use rand::seq::IteratorRandom;
use rand::Rng;

use super::LengthBounds;
use crate::{find_path_cancellable, CancellationToken, Error, Graph, Route};

/// Parameters of [generate_loop].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomWalkParams {
    /// How many independent walks to attempt before settling for the best-effort one.
    pub max_attempts: usize,

    /// Number of steps after which a single walk is forced to close,
    /// regardless of its length.
    pub max_steps: usize,
}

impl Default for RandomWalkParams {
    fn default() -> Self {
        Self {
            max_attempts: 16,
            max_steps: 100_000,
        }
    }
}

/// Probability of making a step towards `start`, given the length walked so far
/// and the crow-flies distance back to the start.
pub fn closing_probability(walked: f64, to_start: f64, max_length: f64) -> f64 {
    let estimate = walked + to_start;
    if estimate >= max_length {
        1.0
    } else {
        1.0 - (-2.0 * estimate / max_length).exp()
    }
}

/// Generates a loop starting and ending at `start` using a biased random walk.
///
/// Up to [RandomWalkParams::max_attempts] walks are made; the first one with length
/// within `bounds` is returned. If none fits, the walk closest to the bounds is returned
/// (every walk is closed, so the result always starts and ends at `start`).
///
/// Fails with [Error::InvalidReference] if `start` doesn't exist, [Error::NoLoopFound]
/// if `start` has no incident edges, and [Error::Unreachable] if the walk has wandered
/// off to a place from which `start` can't be reached.
pub fn generate_loop<R: Rng + ?Sized>(
    g: &Graph,
    start: i64,
    bounds: &LengthBounds,
    params: &RandomWalkParams,
    rng: &mut R,
    token: &CancellationToken,
) -> Result<Route, Error> {
    let start_node = g.get_node(start).ok_or(Error::InvalidReference(start))?;
    if !start_node.is_significant() {
        return Err(Error::NoLoopFound);
    }

    let mut best: Option<Route> = None;

    for attempt in 1..=params.max_attempts.max(1) {
        let route = walk(g, start, bounds, params.max_steps, rng, token)?;

        if bounds.contains(route.length) {
            debug!(
                "random walk attempt {attempt}: {:.3} km loop over {} edges",
                route.length,
                route.edges.len()
            );
            return Ok(route);
        }

        debug!(
            "random walk attempt {attempt}: {:.3} km loop outside of [{:.3}, {:.3}]",
            route.length, bounds.min, bounds.max
        );

        if best
            .as_ref()
            .map_or(true, |b| bounds.deviation(route.length) < bounds.deviation(b.length))
        {
            best = Some(route);
        }
    }

    best.ok_or(Error::NoLoopFound)
}

/// Performs a single closed walk from `start`.
fn walk<R: Rng + ?Sized>(
    g: &Graph,
    start: i64,
    bounds: &LengthBounds,
    max_steps: usize,
    rng: &mut R,
    token: &CancellationToken,
) -> Result<Route, Error> {
    let mut route = Route::starting_at(start);
    let mut current = start;
    let mut steps: usize = 0;

    loop {
        token.checkpoint()?;

        if current == start && !route.edges.is_empty() && route.length >= bounds.min {
            return Ok(route);
        }

        let to_start = g
            .crow_distance(current, start)
            .ok_or(Error::InvalidReference(current))?;
        let p = closing_probability(route.length, to_start, bounds.max);

        steps += 1;
        if p >= 1.0 || steps > max_steps {
            close(g, &mut route, start, token)?;
            return Ok(route);
        }

        // Heading back only makes sense when away from the start
        if current != start && rng.random_bool(p) {
            let back = shortest_path_back(g, current, start, token)?;
            let edge = &g.edges()[back.edges[0]];
            route.push(edge, back.nodes[1]);
        } else {
            let (edge, next) = g
                .neighbors(current)
                .choose(rng)
                .ok_or(Error::Unreachable {
                    from: current,
                    to: start,
                })?;
            route.push(edge, next);
        }

        current = route.last().unwrap_or(start);
    }
}

/// Appends the shortest path from the end of the route back to `start`.
fn close(
    g: &Graph,
    route: &mut Route,
    start: i64,
    token: &CancellationToken,
) -> Result<(), Error> {
    let current = route.last().unwrap_or(start);
    if current != start {
        let back = shortest_path_back(g, current, start, token)?;
        route.append(&back);
    }
    Ok(())
}

fn shortest_path_back(
    g: &Graph,
    from: i64,
    start: i64,
    token: &CancellationToken,
) -> Result<Route, Error> {
    let back = find_path_cancellable(g, from, start, token)?;
    if back.is_reachable() && !back.edges.is_empty() {
        Ok(back)
    } else {
        Err(Error::Unreachable { from, to: start })
    }
}
