// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::convert::Infallible;
use std::io;

/// Error conditions which may occur when building a [Graph](crate::Graph)
/// or searching for routes over it.
///
/// Search errors never leave the [Graph](crate::Graph) in an invalid state,
/// the caller may retry with different parameters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The map extract is malformed or inconsistent.
    #[error("invalid map data: {0}")]
    Data(#[from] DataError),

    /// The start or end nodes don't exist in the graph.
    #[error("invalid node: {0}")]
    InvalidReference(i64),

    /// Requested loop length bounds are not finite, negative or inverted.
    #[error("invalid length bounds: min {min} km, max {max} km")]
    InvalidBounds { min: f64, max: f64 },

    /// Search parameters are out of their valid range.
    #[error("invalid search parameters: {0}")]
    InvalidParameters(&'static str),

    /// There's no path between two nodes which had to be connected,
    /// usually because they are in disconnected components of the graph.
    #[error("no path from node {from} to node {to}")]
    Unreachable { from: i64, to: i64 },

    /// A heuristic search has exhausted its budget without producing any closed walk.
    #[error("no loop found")]
    NoLoopFound,

    /// The search was cancelled through a [CancellationToken](crate::CancellationToken).
    #[error("search cancelled")]
    Cancelled,
}

/// Problems with the raw map data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("way {way_id} has {count} node(s), at least 2 are required")]
    WayTooShort { way_id: i64, count: usize },

    #[error("edge has {0} node(s), at least 2 are required")]
    EdgeTooShort(usize),

    #[error("reference to unknown node {0}")]
    UnknownNode(i64),

    #[error("edge length must be finite and non-negative, got {0}")]
    InvalidLength(f64),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("io: {0}")]
    Io(#[from] io::Error),
}

impl From<Infallible> for DataError {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Error::Data(DataError::Xml(e))
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Data(DataError::Io(e))
    }
}
