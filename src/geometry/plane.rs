// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planarity analysis and plane projection
//!
//! The reference plane is taken from the first three points of the pooled
//! curve samples. That makes the result depend on point order; callers are
//! expected to pass points in curve order.

use crate::error::{ConversionError, ConversionResult};
use nalgebra::{Point2, Point3, Unit, Vector3};
use tracing::debug;

/// Plane through `origin` with unit `normal`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: Point3<f64>,
    pub normal: Unit<Vector3<f64>>,
}

impl Plane {
    pub fn new(origin: Point3<f64>, normal: Unit<Vector3<f64>>) -> Self {
        Self { origin, normal }
    }

    /// Plane through the first three points, or None when they are (near-)collinear
    pub fn reference(points: &[Point3<f64>], tolerance: f64) -> Option<Self> {
        let [p1, p2, p3] = points.get(..3)? else {
            return None;
        };
        let n = (p2 - p1).cross(&(p3 - p1));
        if n.norm() < tolerance {
            return None;
        }
        Some(Self::new(*p1, Unit::new_normalize(n)))
    }

    /// Plane from Newell's normal of the points taken as one ring
    pub fn newell(points: &[Point3<f64>]) -> Option<Self> {
        let n = points.len();
        if n < 3 {
            return None;
        }

        let mut normal = Vector3::zeros();
        let mut centroid = Vector3::zeros();
        for i in 0..n {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
            centroid += a.coords;
        }

        let normal = Unit::try_new(normal, 1e-12)?;
        Some(Self::new(Point3::from(centroid / n as f64), normal))
    }

    /// Plane through the widest-spread triple of points
    pub fn spread(points: &[Point3<f64>], tolerance: f64) -> Option<Self> {
        let p0 = points.first()?;
        let far = points
            .iter()
            .max_by(|a, b| (*a - p0).norm_squared().total_cmp(&(*b - p0).norm_squared()))?;
        let axis = far - p0;

        let third = points
            .iter()
            .max_by(|a, b| {
                axis.cross(&(*a - p0))
                    .norm_squared()
                    .total_cmp(&axis.cross(&(*b - p0)).norm_squared())
            })?;

        let n = axis.cross(&(third - p0));
        if n.norm() < tolerance * tolerance {
            return None;
        }
        Some(Self::new(*p0, Unit::new_normalize(n)))
    }

    /// Best available plane for projecting the points: the reference plane
    /// when it is well defined, otherwise Newell's plane, otherwise the
    /// widest-spread triple. None means every point is collinear.
    pub fn fit(points: &[Point3<f64>], tolerance: f64) -> Option<Self> {
        Self::reference(points, tolerance)
            .or_else(|| Self::newell(points))
            .or_else(|| Self::spread(points, tolerance))
    }

    /// Signed perpendicular distance of `point` from the plane
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.origin).dot(self.normal.as_ref())
    }

    pub fn basis(&self) -> PlaneBasis {
        PlaneBasis::new(self.origin, self.normal)
    }
}

/// Check that all points lie within `tolerance` of the plane through the first three
///
/// Fewer than four points are trivially planar, as are point sets whose first
/// three points are collinear (the plane cannot be established).
pub fn check_planarity(points: &[Point3<f64>], tolerance: f64) -> ConversionResult<()> {
    if points.len() < 4 {
        return Ok(());
    }

    let Some(plane) = Plane::reference(points, tolerance) else {
        debug!("Reference points are collinear, planarity cannot be disproved");
        return Ok(());
    };

    for (index, point) in points.iter().enumerate().skip(3) {
        let distance = plane.signed_distance(point);
        if distance.abs() > tolerance {
            return Err(ConversionError::NonPlanar {
                index,
                distance: distance.abs(),
            });
        }
    }

    Ok(())
}

/// Whether all points lie within `tolerance` of a common plane
pub fn is_planar(points: &[Point3<f64>], tolerance: f64) -> bool {
    check_planarity(points, tolerance).is_ok()
}

/// Two unit axes spanning the plane with the given normal
/// `u x v` equals the normal
pub fn orthonormal_axes(normal: &Unit<Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    // Seed with the world axis least aligned with the normal
    let seed = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
        Vector3::x()
    } else if normal.y.abs() <= normal.z.abs() {
        Vector3::y()
    } else {
        Vector3::z()
    };

    let u = normal.cross(&seed).normalize();
    let v = normal.cross(&u);
    (u, v)
}

/// Orthonormal 2D frame embedded in a plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneBasis {
    pub origin: Point3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
    pub normal: Vector3<f64>,
}

impl PlaneBasis {
    pub fn new(origin: Point3<f64>, normal: Unit<Vector3<f64>>) -> Self {
        let (u, v) = orthonormal_axes(&normal);
        Self {
            origin,
            u,
            v,
            normal: normal.into_inner(),
        }
    }

    /// Basis of the XY plane at z = 0
    pub fn xy() -> Self {
        Self::new(Point3::origin(), Vector3::z_axis())
    }

    /// In-plane coordinates of a point
    pub fn project(&self, point: &Point3<f64>) -> Point2<f64> {
        let d = point - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }

    pub fn project_all(&self, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        points.iter().map(|p| self.project(p)).collect()
    }

    /// Point on the plane at in-plane coordinates
    pub fn lift(&self, point: &Point2<f64>) -> Point3<f64> {
        self.origin + self.u * point.x + self.v * point.y
    }
}
