// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::Point3;

/// Two points are the same vertex when they lie within `tolerance` of each other
pub fn points_coincide(a: &Point3<f64>, b: &Point3<f64>, tolerance: f64) -> bool {
    (a - b).norm() <= tolerance
}

/// Number of points that are pairwise further apart than `tolerance`
pub fn count_distinct(points: &[Point3<f64>], tolerance: f64) -> usize {
    let mut distinct: Vec<&Point3<f64>> = Vec::new();
    for point in points {
        if !distinct.iter().any(|d| points_coincide(d, point, tolerance)) {
            distinct.push(point);
        }
    }
    distinct.len()
}
