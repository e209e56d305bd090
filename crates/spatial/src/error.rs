//! Spatial index error types.

use thiserror::Error;

/// Reasons a single point is refused by the quadtree.
///
/// None of these abort a build: the point is dropped, the error is recorded
/// on the tree and insertion carries on with the next point.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InsertError {
    #[error("Point {index} has a non-finite coordinate ({x}, {y})")]
    InvalidCoordinate { index: usize, x: f64, y: f64 },

    #[error("Point {index} at ({x}, {y}) lies outside the tree bounds")]
    OutOfBounds { index: usize, x: f64, y: f64 },

    #[error("Point {index} cannot be split from point {anchor} at float precision")]
    Unseparable { index: usize, anchor: usize },

    #[error("Point handle {index} is out of range for {len} points")]
    UnknownPoint { index: usize, len: usize },
}

impl InsertError {
    /// Handle of the rejected point.
    pub fn index(&self) -> usize {
        match *self {
            InsertError::InvalidCoordinate { index, .. }
            | InsertError::OutOfBounds { index, .. }
            | InsertError::Unseparable { index, .. }
            | InsertError::UnknownPoint { index, .. } => index,
        }
    }
}

/// Errors raised while reading or checking a [`TreeConfig`](crate::TreeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Coincidence tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),

    #[error("Malformed configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
