// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Generation of closed loops of a requested length.
//!
//! Two strategies are available, and the choice between them is always explicit:
//! - [random_walk::generate_loop] - a biased random walk, which closes itself with
//!   increasing probability as it approaches the maximum length. Fast.
//! - [ant_colony::generate_loop] - an iterated, pheromone-guided randomized depth-first search,
//!   which rewards short and round loops. Slow, but produces nicer shapes.

use rand::Rng;

use crate::{CancellationToken, Error, Graph, Route};

pub mod ant_colony;
pub mod random_walk;

pub use ant_colony::{fitness, AntColonyParams};
pub use random_walk::RandomWalkParams;

/// Accepted range of loop lengths, in kilometers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthBounds {
    pub min: f64,
    pub max: f64,
}

impl LengthBounds {
    /// Creates new bounds, ensuring `0 <= min <= max`, `max > 0` and that both values are finite.
    pub fn new(min: f64, max: f64) -> Result<Self, Error> {
        if min.is_finite() && max.is_finite() && min >= 0.0 && max > 0.0 && min <= max {
            Ok(Self { min, max })
        } else {
            Err(Error::InvalidBounds { min, max })
        }
    }

    /// Creates bounds of `target ± target * tolerance`.
    pub fn around(target: f64, tolerance: f64) -> Result<Self, Error> {
        let tolerance = tolerance.abs();
        Self::new((target * (1.0 - tolerance)).max(0.0), target * (1.0 + tolerance))
    }

    pub fn contains(&self, length: f64) -> bool {
        length >= self.min && length <= self.max
    }

    /// Returns how far is `length` outside of the bounds; zero for lengths within the bounds.
    pub fn deviation(&self, length: f64) -> f64 {
        if length < self.min {
            self.min - length
        } else if length > self.max {
            length - self.max
        } else {
            0.0
        }
    }
}

/// Loop generation algorithm, together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    RandomWalk(RandomWalkParams),
    AntColony(AntColonyParams),
}

impl Default for Strategy {
    fn default() -> Self {
        Self::RandomWalk(RandomWalkParams::default())
    }
}

/// Generates a loop starting and ending at `start` using the selected [Strategy].
///
/// There's no fallback between strategies - errors of the selected strategy
/// are returned as-is.
pub fn find_loop<R: Rng + ?Sized>(
    g: &Graph,
    start: i64,
    bounds: &LengthBounds,
    strategy: &Strategy,
    rng: &mut R,
    token: &CancellationToken,
) -> Result<Route, Error> {
    match strategy {
        Strategy::RandomWalk(params) => {
            random_walk::generate_loop(g, start, bounds, params, rng, token)
        }
        Strategy::AntColony(params) => {
            ant_colony::generate_loop(g, start, bounds, params, rng, token)
        }
    }
}
