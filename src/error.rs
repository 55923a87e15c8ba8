// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types for boundary conversion

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline stage names, used when a deadline interrupts a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Extraction,
    Planarity,
    Grouping,
    Tessellation,
    Metadata,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extraction => "extraction",
            Stage::Planarity => "planarity",
            Stage::Grouping => "grouping",
            Stage::Tessellation => "tessellation",
            Stage::Metadata => "metadata",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-boundary conversion failures.
///
/// None of these abort a batch; they are recorded against the boundary index
/// and processing continues with the next boundary.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum ConversionError {
    /// The boundary carries no extractable curve
    #[error("No curves found")]
    NoCurvesFound,

    /// The pooled curve points do not lie on one plane
    #[error("Curves not coplanar (point {index} is {distance:.4} from the reference plane)")]
    NonPlanar { index: usize, distance: f64 },

    /// A curve chain does not close, or a loop is neither outer nor contained
    #[error("Malformed loop: {reason}")]
    MalformedLoop { reason: String },

    /// Fewer than three distinct vertices after tolerance merging
    #[error("Degenerate polygon: {distinct} distinct vertices")]
    DegeneratePolygon { distinct: usize },

    /// Ear clipping stopped without covering the polygon
    #[error("Tessellation failed with {remaining} vertices left unclipped")]
    TessellationFailure { remaining: usize },

    /// The boundary's time budget ran out before a stage started
    #[error("Deadline exceeded before {stage} stage")]
    DeadlineExceeded { stage: Stage },
}

impl ConversionError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ConversionError::MalformedLoop {
            reason: reason.into(),
        }
    }
}

/// Result type for single-boundary conversion
pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

/// Invalid configuration values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid tolerance: {0} (must be > 0)")]
    InvalidTolerance(f64),

    #[error("Invalid minimum area threshold: {0} (must be >= 0)")]
    InvalidAreaThreshold(f64),

    #[error("Invalid arc segment count: {0} (must be >= 3)")]
    InvalidArcSegments(usize),

    #[error("Invalid parallelism: 0 worker threads")]
    ZeroParallelism,
}

/// Batch-level failure: the only condition surfaced as a hard error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BatchError {
    #[error("No area boundaries were supplied")]
    NoBoundaries,

    #[error("No area boundaries could be converted to surfaces ({failed} failed)")]
    NoMeshesProduced { failed: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConversionError::NoCurvesFound;
        assert_eq!(format!("{err}"), "No curves found");

        let err = ConversionError::malformed("chain does not close");
        assert_eq!(format!("{err}"), "Malformed loop: chain does not close");

        let err = ConversionError::DeadlineExceeded {
            stage: Stage::Tessellation,
        };
        assert!(format!("{err}").contains("tessellation"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidTolerance(-0.5);
        assert!(format!("{err}").contains("-0.5"));
    }
}
