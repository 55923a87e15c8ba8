// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Curve extraction from boundary records

use crate::boundary::Boundary;
use crate::geometry::CurveSegment;
use nalgebra::Point3;
use tracing::debug;

/// Member names probed for curves, in priority order
pub const CURVE_LOCATIONS: [&str; 5] = ["curves", "outline", "boundary", "geometry", "displayValue"];

/// Curves of a boundary, in member order
///
/// The first location holding at least one curve wins; later locations
/// (including `displayValue`) are not consulted. Non-curve objects are skipped.
pub fn extract_curves(boundary: &Boundary) -> Vec<&CurveSegment> {
    for location in CURVE_LOCATIONS {
        let Some(member) = boundary.member(location) else {
            continue;
        };
        let curves = member.curves();
        if !curves.is_empty() {
            debug!("Found {} curve(s) under '{}'", curves.len(), location);
            return curves;
        }
    }
    Vec::new()
}

/// Sample every curve into an ordered point path
pub fn sample_paths(curves: &[&CurveSegment], arc_segments: usize) -> Vec<Vec<Point3<f64>>> {
    curves.iter().map(|c| c.sample_points(arc_segments)).collect()
}

/// All path points in curve order
pub fn pooled_points(paths: &[Vec<Point3<f64>>]) -> Vec<Point3<f64>> {
    paths.iter().flatten().copied().collect()
}
