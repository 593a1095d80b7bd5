// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Pheromone-guided loop search, inspired by
//! [ant colony optimization](https://en.wikipedia.org/wiki/Ant_colony_optimization_algorithms).
//!
//! Every iteration, a number of "ants" perform randomized depth-first walks from the start,
//! choosing edges with probability proportional to their pheromone. Each closed walk
//! deposits its [fitness] on every edge it used, and all pheromone evaporates
//! after every iteration. After all iterations, a final walk is sampled from
//! the converged pheromone distribution.

use std::collections::HashMap;
use std::f64::consts::TAU;

use log::debug;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;

use super::LengthBounds;
use crate::{earth_distance, CancellationToken, Error, Graph, Route};

/// Max number of times a single walk may enter a node.
const MAX_VISITS: u8 = 2;

/// Lower bound for the mean absolute deviation used by [fitness], in kilometers.
const MIN_DEVIATION: f64 = 0.001;

/// Parameters of [generate_loop].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AntColonyParams {
    pub iterations: usize,

    /// Number of walks performed in every iteration.
    pub ants: usize,

    /// Pheromone of every edge before the first iteration.
    pub initial_pheromone: f64,

    /// Fraction of pheromone lost after every iteration.
    pub evaporation: f64,

    /// Evaporation never lowers pheromone below this value,
    /// so that every edge remains possible to explore.
    pub min_pheromone: f64,

    /// Max number of depth-first search steps of a single walk;
    /// walks exceeding it are abandoned.
    pub max_walk_steps: usize,
}

impl AntColonyParams {
    /// Ensures pheromone values stay finite and positive throughout the search,
    /// and that at least one ant walks every iteration.
    pub fn validate(&self) -> Result<(), Error> {
        if self.ants == 0 {
            Err(Error::InvalidParameters("at least one ant is required"))
        } else if !(self.initial_pheromone.is_finite() && self.initial_pheromone > 0.0) {
            Err(Error::InvalidParameters("initial pheromone must be finite and positive"))
        } else if !(self.min_pheromone.is_finite() && self.min_pheromone > 0.0) {
            Err(Error::InvalidParameters("min pheromone must be finite and positive"))
        } else if !(0.0..=1.0).contains(&self.evaporation) {
            Err(Error::InvalidParameters("evaporation must be within [0, 1]"))
        } else {
            Ok(())
        }
    }
}

impl Default for AntColonyParams {
    fn default() -> Self {
        Self {
            iterations: 300,
            ants: 30,
            initial_pheromone: 1.0,
            evaporation: 0.4,
            min_pheromone: 0.01,
            max_walk_steps: 10_000,
        }
    }
}

/// Scores a closed walk: `1/length + 2/mad`, where `mad` is the mean absolute deviation
/// of the distances between the walk's edge endpoints and their centroid from
/// the radius of a circle with circumference equal to the walk length.
///
/// Short and round loops score higher. Empty walks score zero.
pub fn fitness(g: &Graph, route: &Route) -> f64 {
    if route.edges.is_empty() || !(route.length > 0.0) {
        return 0.0;
    }

    let points: Vec<(f64, f64)> = route
        .edges
        .iter()
        .filter_map(|&e| g.get_edge(e))
        .flat_map(|e| [e.first(), e.last()])
        .filter_map(|id| g.get_node(id))
        .map(|n| (n.lat, n.lon))
        .collect();
    if points.is_empty() {
        return 0.0;
    }

    let count = points.len() as f64;
    let center_lat = points.iter().map(|p| p.0).sum::<f64>() / count;
    let center_lon = points.iter().map(|p| p.1).sum::<f64>() / count;
    let radius = route.length / TAU;

    let deviation = points
        .iter()
        .map(|&(lat, lon)| (earth_distance(center_lat, center_lon, lat, lon) - radius).abs())
        .sum::<f64>()
        / count;

    1.0 / route.length + 2.0 / deviation.max(MIN_DEVIATION)
}

/// Generates a loop starting and ending at `start` with the pheromone-guided search.
///
/// Every returned loop has its length within `bounds`. The best walk seen during
/// the search is kept, and returned instead of the final sampled walk if the latter
/// has a lower [fitness] (or if the final walk fails to close).
///
/// Fails with [Error::InvalidParameters] if `params` don't pass [AntColonyParams::validate],
/// [Error::InvalidReference] if `start` doesn't exist, and with
/// [Error::NoLoopFound] if no ant has managed to close a walk.
pub fn generate_loop<R: Rng + ?Sized>(
    g: &Graph,
    start: i64,
    bounds: &LengthBounds,
    params: &AntColonyParams,
    rng: &mut R,
    token: &CancellationToken,
) -> Result<Route, Error> {
    params.validate()?;

    let start_node = g.get_node(start).ok_or(Error::InvalidReference(start))?;
    if !start_node.is_significant() {
        return Err(Error::NoLoopFound);
    }

    let mut pheromones = vec![params.initial_pheromone; g.edges().len()];
    let mut best: Option<(Route, f64)> = None;

    for iteration in 1..=params.iterations {
        let mut closed: usize = 0;

        for _ in 0..params.ants {
            token.checkpoint()?;

            let walk = ant_walk(
                g,
                start,
                bounds,
                &pheromones,
                params.max_walk_steps,
                rng,
                token,
            )?;
            let Some(walk) = walk else {
                continue;
            };

            let score = fitness(g, &walk);
            for &e in &walk.edges {
                pheromones[e] += score;
            }

            closed += 1;
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((walk, score));
            }
        }

        evaporate(&mut pheromones, params);
        debug!(
            "ant colony iteration {iteration}/{}: {closed}/{} ants closed a loop, best fitness {:.3}",
            params.iterations,
            params.ants,
            best.as_ref().map_or(0.0, |(_, s)| *s),
        );
    }

    token.checkpoint()?;
    let last = ant_walk(g, start, bounds, &pheromones, params.max_walk_steps, rng, token)?;

    match (last, best) {
        (Some(walk), Some((best, best_score))) => {
            if fitness(g, &walk) >= best_score {
                Ok(walk)
            } else {
                Ok(best)
            }
        }
        (Some(walk), None) => Ok(walk),
        (None, Some((best, _))) => Ok(best),
        (None, None) => Err(Error::NoLoopFound),
    }
}

fn evaporate(pheromones: &mut [f64], params: &AntColonyParams) {
    let keep = 1.0 - params.evaporation;
    for p in pheromones {
        *p = (*p * keep).max(params.min_pheromone);
    }
}

/// Single level of the depth-first search: the length walked to reach a node,
/// and edges which haven't been tried from that node yet.
struct Frame {
    length: f64,
    candidates: Vec<(usize, i64)>,
}

impl Frame {
    fn new(g: &Graph, node: i64, length: f64) -> Self {
        Self {
            length,
            candidates: g.neighbors(node).map(|(e, to)| (e.id, to)).collect(),
        }
    }
}

/// Picks and removes a random candidate, with probability proportional to its edge pheromone.
///
/// Fails with [Error::InvalidParameters] if any of the pheromones is negative or not finite,
/// or if all of them are zero.
fn take_candidate<R: Rng + ?Sized>(
    candidates: &mut Vec<(usize, i64)>,
    pheromones: &[f64],
    rng: &mut R,
) -> Result<Option<(usize, i64)>, Error> {
    if candidates.is_empty() {
        return Ok(None);
    }

    let dist = WeightedIndex::new(candidates.iter().map(|&(e, _)| pheromones[e]))
        .map_err(|_| Error::InvalidParameters("pheromones must be finite and non-negative"))?;
    let idx = dist.sample(rng);
    Ok(Some(candidates.swap_remove(idx)))
}

/// Randomized depth-first walk from `start`, returning the first closed walk
/// with length within `bounds`, or `None` if the search was exhausted or exceeded `max_steps`.
///
/// Uses an explicit stack; no node is entered more than [MAX_VISITS] times.
pub(crate) fn ant_walk<R: Rng + ?Sized>(
    g: &Graph,
    start: i64,
    bounds: &LengthBounds,
    pheromones: &[f64],
    max_steps: usize,
    rng: &mut R,
    token: &CancellationToken,
) -> Result<Option<Route>, Error> {
    let mut visits: HashMap<i64, u8> = HashMap::default();
    visits.insert(start, 1);

    let mut stack = vec![Frame::new(g, start, 0.0)];
    let mut path: Vec<usize> = Vec::default(); // edge leading to every frame but the first
    let mut steps: usize = 0;

    while let Some(top) = stack.last_mut() {
        token.checkpoint()?;

        steps += 1;
        if steps > max_steps {
            return Ok(None);
        }

        let Some((edge_id, next)) = take_candidate(&mut top.candidates, pheromones, rng)? else {
            stack.pop();
            path.pop();
            continue;
        };

        let length = top.length + g.edges()[edge_id].length;
        if length > bounds.max {
            continue;
        }

        let visits_next = visits.entry(next).or_default();
        if *visits_next >= MAX_VISITS {
            continue;
        }
        *visits_next += 1;
        path.push(edge_id);

        if next == start {
            if length >= bounds.min {
                return Ok(Some(build_route(g, start, &path)));
            }
        } else if let Some(closing) = closing_edge(g, next, start, length, bounds) {
            path.push(closing);
            return Ok(Some(build_route(g, start, &path)));
        }

        stack.push(Frame::new(g, next, length));
    }

    Ok(None)
}

/// Finds the shortest edge from `node` directly to `start`, which would close
/// the walk with a length within `bounds`.
fn closing_edge(
    g: &Graph,
    node: i64,
    start: i64,
    length: f64,
    bounds: &LengthBounds,
) -> Option<usize> {
    g.neighbors(node)
        .filter(|&(_, to)| to == start)
        .map(|(e, _)| (e.id, length + e.length))
        .filter(|&(_, total)| bounds.contains(total))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

fn build_route(g: &Graph, start: i64, path: &[usize]) -> Route {
    let mut route = Route::starting_at(start);
    let mut at = start;
    for &e in path {
        let edge = &g.edges()[e];
        if let Some(to) = edge.other_end(at) {
            route.push(edge, to);
            at = to;
        }
    }
    route
}
