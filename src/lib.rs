// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Areaform
//!
//! Converts planar area boundary curves into tessellated surface meshes.
//! Curves are chained into closed loops, sorted into an outer outline and
//! holes, ear-clipped into triangles, and tagged with the boundary's metadata.

pub mod boundary;
pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod metadata;
pub mod report;
pub mod utils;

pub use boundary::{Boundary, Member};
pub use config::ConversionConfig;
pub use converter::{BoundaryConverter, BoundaryOutcome};
pub use error::{BatchError, ConfigError, ConversionError, ConversionResult, Stage};
pub use geometry::{CurveSegment, Mesh};
pub use report::{BatchReport, BoundaryFailure};

/// Convert a batch with the given configuration
pub fn convert_boundaries(boundaries: &[Boundary], config: ConversionConfig) -> BatchReport {
    BoundaryConverter::new(config).convert_batch(boundaries)
}
