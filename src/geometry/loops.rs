// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Loop reconstruction from boundary curve fragments
//!
//! Curves arrive in arbitrary order and direction. They are chained by
//! endpoint adjacency into closed rings, then the ring with the largest
//! projected area becomes the outer loop and the rings inside it become holes.
//! Self-intersecting rings are not detected.

use super::plane::PlaneBasis;
use super::predicates::{point_in_polygon, signed_area};
use crate::error::ConversionError;
use crate::utils::points_coincide;
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Role of a loop within its polygon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopRole {
    Outer,
    Hole,
}

/// Closed ring of points. The closing edge from the last vertex back to the
/// first is implicit; no vertex is repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub vertices: Vec<Point3<f64>>,
    pub role: LoopRole,
}

impl Loop {
    pub fn new(vertices: Vec<Point3<f64>>, role: LoopRole) -> Self {
        Self { vertices, role }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn project(&self, basis: &PlaneBasis) -> Vec<Point2<f64>> {
        basis.project_all(&self.vertices)
    }

    /// Unsigned enclosed area in the plane of `basis`
    pub fn area(&self, basis: &PlaneBasis) -> f64 {
        signed_area(&self.project(basis)).abs()
    }
}

/// Outer loop with the holes it contains
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub outer: Loop,
    pub holes: Vec<Loop>,
}

impl Polygon {
    pub fn new(outer: Loop, holes: Vec<Loop>) -> Self {
        Self { outer, holes }
    }

    /// Outer area minus hole areas
    pub fn area(&self, basis: &PlaneBasis) -> f64 {
        self.outer.area(basis) - self.holes.iter().map(|h| h.area(basis)).sum::<f64>()
    }

    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(Loop::len).sum::<usize>()
    }
}

/// Result of chaining: closed rings plus the chains that could not be used
#[derive(Debug, Default)]
pub struct ChainSet {
    pub rings: Vec<Vec<Point3<f64>>>,
    pub rejected: Vec<ConversionError>,
}

/// Result of classification
#[derive(Debug, Default)]
pub struct LoopClassification {
    pub polygon: Option<Polygon>,
    pub rejected: Vec<ConversionError>,
}

/// Chain sampled curve paths into closed rings by endpoint adjacency
///
/// Every path is consumed exactly once. A path that is closed by itself forms
/// its own ring. Paths with a free end, directly or once such paths are peeled
/// away, never take part in a ring; they are chained among themselves and
/// reported as open chains. This keeps a stray fragment touching an outline
/// from consuming it. Closed chains with fewer than three distinct vertices
/// are rejected as degenerate.
pub fn chain_paths(paths: &[Vec<Point3<f64>>], tolerance: f64) -> ChainSet {
    let mut result = ChainSet::default();

    for (i, path) in paths.iter().enumerate() {
        if path.len() < 2 {
            result.rejected.push(ConversionError::malformed(format!(
                "curve {} has fewer than two sample points",
                i
            )));
        }
    }

    let dangling = dangling_paths(paths, tolerance);
    let dangling_count = dangling.iter().filter(|&&d| d).count();
    if dangling_count > 0 {
        debug!("Setting aside {} curve(s) with a free end", dangling_count);
    }

    // Closed core first, then the fragments left over
    let mut used: Vec<bool> = paths
        .iter()
        .zip(&dangling)
        .map(|(path, &d)| path.len() < 2 || d)
        .collect();
    chain_pass(paths, &mut used, tolerance, &mut result);

    let mut used: Vec<bool> = paths
        .iter()
        .zip(&dangling)
        .map(|(path, &d)| path.len() < 2 || !d)
        .collect();
    chain_pass(paths, &mut used, tolerance, &mut result);

    result
}

/// Mark paths that cannot lie on a closed chain
///
/// A path with an endpoint touched by no other remaining endpoint is peeled
/// off, repeatedly, until every remaining endpoint is shared. The result does
/// not depend on path order.
fn dangling_paths(paths: &[Vec<Point3<f64>>], tolerance: f64) -> Vec<bool> {
    let mut dangling: Vec<bool> = paths.iter().map(|path| path.len() < 2).collect();
    loop {
        let mut changed = false;
        for i in 0..paths.len() {
            if dangling[i] {
                continue;
            }
            let path = &paths[i];
            let free_end = [&path[0], &path[path.len() - 1]]
                .into_iter()
                .any(|end| endpoint_degree(end, paths, &dangling, tolerance) < 2);
            if free_end {
                dangling[i] = true;
                changed = true;
            }
        }
        if !changed {
            return dangling;
        }
    }
}

/// Number of endpoints of non-excluded paths at `at`, counting the path's own
fn endpoint_degree(
    at: &Point3<f64>,
    paths: &[Vec<Point3<f64>>],
    excluded: &[bool],
    tolerance: f64,
) -> usize {
    paths
        .iter()
        .zip(excluded)
        .filter(|(_, &skip)| !skip)
        .map(|(path, _)| {
            [&path[0], &path[path.len() - 1]]
                .into_iter()
                .filter(|end| points_coincide(end, at, tolerance))
                .count()
        })
        .sum()
}

/// Chain every path not yet marked in `used`
fn chain_pass(
    paths: &[Vec<Point3<f64>>],
    used: &mut [bool],
    tolerance: f64,
    result: &mut ChainSet,
) {
    for seed in 0..paths.len() {
        if used[seed] {
            continue;
        }
        used[seed] = true;

        let mut chain = paths[seed].clone();
        let mut members = 1;
        let mut closed = extend_forward(&mut chain, &mut members, paths, used, tolerance);
        if !closed {
            // Dead end: grow the other way so one open chain is reported once
            closed = extend_backward(&mut chain, &mut members, paths, used, tolerance);
        }

        if !closed {
            warn!(
                "Curve chain of {} curve(s) starting at curve {} is not closed",
                members, seed
            );
            result.rejected.push(ConversionError::malformed(format!(
                "open chain of {} curve(s) from ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
                members,
                chain[0].x,
                chain[0].y,
                chain[0].z,
                chain[chain.len() - 1].x,
                chain[chain.len() - 1].y,
                chain[chain.len() - 1].z,
            )));
            continue;
        }

        let ring = merge_ring(chain, tolerance);
        if ring.len() < 3 {
            result
                .rejected
                .push(ConversionError::DegeneratePolygon { distinct: ring.len() });
            continue;
        }

        debug!(
            "Closed loop from {} curve(s) with {} vertices",
            members,
            ring.len()
        );
        result.rings.push(ring);
    }
}

fn is_closed(chain: &[Point3<f64>], tolerance: f64) -> bool {
    chain.len() > 2 && points_coincide(&chain[0], &chain[chain.len() - 1], tolerance)
}

/// Find an unused path with an endpoint at `at`; the flag is true when the
/// path has to be reversed so that it starts there
fn find_continuation(
    at: &Point3<f64>,
    paths: &[Vec<Point3<f64>>],
    used: &[bool],
    tolerance: f64,
) -> Option<(usize, bool)> {
    paths.iter().enumerate().find_map(|(i, path)| {
        if used[i] || path.len() < 2 {
            return None;
        }
        if points_coincide(&path[0], at, tolerance) {
            Some((i, false))
        } else if points_coincide(&path[path.len() - 1], at, tolerance) {
            Some((i, true))
        } else {
            None
        }
    })
}

fn extend_forward(
    chain: &mut Vec<Point3<f64>>,
    members: &mut usize,
    paths: &[Vec<Point3<f64>>],
    used: &mut [bool],
    tolerance: f64,
) -> bool {
    loop {
        if is_closed(chain, tolerance) {
            return true;
        }
        let end = chain[chain.len() - 1];
        let Some((next, reversed)) = find_continuation(&end, paths, used, tolerance) else {
            return false;
        };
        used[next] = true;
        *members += 1;

        // The shared endpoint is already in the chain
        if reversed {
            chain.extend(paths[next].iter().rev().skip(1));
        } else {
            chain.extend(paths[next].iter().skip(1));
        }
    }
}

fn extend_backward(
    chain: &mut Vec<Point3<f64>>,
    members: &mut usize,
    paths: &[Vec<Point3<f64>>],
    used: &mut [bool],
    tolerance: f64,
) -> bool {
    loop {
        if is_closed(chain, tolerance) {
            return true;
        }
        let start = chain[0];
        let Some((next, starts_here)) = find_continuation(&start, paths, used, tolerance)
            .map(|(i, reversed)| (i, !reversed))
        else {
            return false;
        };
        used[next] = true;
        *members += 1;

        // Prepended points must end at the current chain start
        let path = &paths[next];
        let prefix: Vec<Point3<f64>> = if starts_here {
            path[1..].iter().rev().copied().collect()
        } else {
            path[..path.len() - 1].to_vec()
        };
        chain.splice(0..0, prefix);
    }
}

/// Drop the closing point and merge consecutive vertices within tolerance
fn merge_ring(mut chain: Vec<Point3<f64>>, tolerance: f64) -> Vec<Point3<f64>> {
    chain.pop();
    let mut ring: Vec<Point3<f64>> = Vec::with_capacity(chain.len());
    for point in chain {
        if ring
            .last()
            .map_or(true, |last| !points_coincide(last, &point, tolerance))
        {
            ring.push(point);
        }
    }
    while ring.len() > 1 && points_coincide(&ring[0], &ring[ring.len() - 1], tolerance) {
        ring.pop();
    }
    ring
}

/// Pick the outer loop and sort the remaining rings into holes or rejects
///
/// The ring with the largest projected area is the outer loop. A ring whose
/// vertices all lie inside the outer loop is a hole, unless it also lies inside
/// another, larger hole. Anything else is malformed.
pub fn classify_rings(rings: Vec<Vec<Point3<f64>>>, basis: &PlaneBasis) -> LoopClassification {
    let mut result = LoopClassification::default();
    if rings.is_empty() {
        return result;
    }

    let projected: Vec<Vec<Point2<f64>>> = rings.iter().map(|r| basis.project_all(r)).collect();
    let areas: Vec<f64> = projected.iter().map(|p| signed_area(p).abs()).collect();

    let mut outer_index = 0;
    for (i, area) in areas.iter().enumerate() {
        if *area > areas[outer_index] {
            outer_index = i;
        }
    }

    let inside = |inner: usize, container: usize| {
        projected[inner]
            .iter()
            .all(|p| point_in_polygon(p, &projected[container]))
    };

    let candidates: Vec<usize> = (0..rings.len())
        .filter(|&i| i != outer_index)
        .filter(|&i| {
            if inside(i, outer_index) {
                true
            } else {
                result.rejected.push(ConversionError::malformed(format!(
                    "loop with {} vertices lies outside the outer loop",
                    rings[i].len()
                )));
                false
            }
        })
        .collect();

    let mut hole_indices = Vec::with_capacity(candidates.len());
    for &i in &candidates {
        let nested = candidates
            .iter()
            .any(|&j| j != i && areas[j] > areas[i] && inside(i, j));
        if nested {
            result.rejected.push(ConversionError::malformed(format!(
                "loop with {} vertices lies inside a hole",
                rings[i].len()
            )));
        } else {
            hole_indices.push(i);
        }
    }

    let mut rings: Vec<Option<Vec<Point3<f64>>>> = rings.into_iter().map(Some).collect();
    let holes = hole_indices
        .into_iter()
        .filter_map(|i| rings[i].take())
        .map(|vertices| Loop::new(vertices, LoopRole::Hole))
        .collect::<Vec<_>>();
    let outer = rings[outer_index]
        .take()
        .map(|vertices| Loop::new(vertices, LoopRole::Outer));

    if let Some(outer) = outer {
        debug!(
            "Classified outer loop with {} vertices and {} hole(s)",
            outer.len(),
            holes.len()
        );
        result.polygon = Some(Polygon::new(outer, holes));
    }

    result
}
