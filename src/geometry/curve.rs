// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary curve primitives
//!
//! Curves are a closed set of kinds. Anything else found on a boundary
//! record never deserializes as a curve and is ignored by extraction.

use super::plane::orthonormal_axes;
use nalgebra::{Point3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Coordinates as written on the wire: `[x, y, z]` or `{"x", "y", "z"}`
#[derive(Deserialize)]
#[serde(untagged)]
enum Coords {
    Array([f64; 3]),
    Object { x: f64, y: f64, z: f64 },
}

impl From<Coords> for [f64; 3] {
    fn from(coords: Coords) -> Self {
        match coords {
            Coords::Array(xyz) => xyz,
            Coords::Object { x, y, z } => [x, y, z],
        }
    }
}

/// Points serialize as arrays and deserialize from either coordinate form
mod point_format {
    use super::Coords;
    use nalgebra::Point3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        point: &Point3<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        point.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Point3<f64>, D::Error> {
        let [x, y, z]: [f64; 3] = Coords::deserialize(deserializer)?.into();
        Ok(Point3::new(x, y, z))
    }
}

mod points_format {
    use super::Coords;
    use nalgebra::Point3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        points: &[Point3<f64>],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        points.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Point3<f64>>, D::Error> {
        let coords = Vec::<Coords>::deserialize(deserializer)?;
        Ok(coords
            .into_iter()
            .map(|c| {
                let [x, y, z]: [f64; 3] = c.into();
                Point3::new(x, y, z)
            })
            .collect())
    }
}

mod vector_format {
    use super::Coords;
    use nalgebra::Vector3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        vector: &Vector3<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        vector.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vector3<f64>, D::Error> {
        let [x, y, z]: [f64; 3] = Coords::deserialize(deserializer)?.into();
        Ok(Vector3::new(x, y, z))
    }
}

/// A boundary curve segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CurveSegment {
    #[serde(alias = "Objects.Geometry.Line")]
    Line {
        #[serde(with = "point_format")]
        start: Point3<f64>,
        #[serde(with = "point_format")]
        end: Point3<f64>,
    },

    #[serde(alias = "Objects.Geometry.Polyline")]
    Polyline {
        #[serde(with = "points_format")]
        points: Vec<Point3<f64>>,
        #[serde(default)]
        closed: bool,
    },

    /// Three-point arc from `start` through `mid` to `end`
    #[serde(alias = "Objects.Geometry.Arc")]
    Arc {
        #[serde(with = "point_format")]
        start: Point3<f64>,
        #[serde(with = "point_format")]
        mid: Point3<f64>,
        #[serde(with = "point_format")]
        end: Point3<f64>,
    },

    #[serde(alias = "Objects.Geometry.Circle")]
    Circle {
        #[serde(with = "point_format")]
        center: Point3<f64>,
        #[serde(with = "vector_format")]
        normal: Vector3<f64>,
        radius: f64,
    },

    #[serde(alias = "Objects.Geometry.Ellipse")]
    Ellipse {
        #[serde(with = "point_format")]
        center: Point3<f64>,
        #[serde(with = "vector_format")]
        normal: Vector3<f64>,
        #[serde(with = "vector_format")]
        x_axis: Vector3<f64>,
        first_radius: f64,
        second_radius: f64,
    },

    /// Free-form curve: its display points when present, else its control points
    #[serde(rename = "Curve", alias = "Objects.Geometry.Curve")]
    Generic {
        #[serde(default, with = "points_format")]
        points: Vec<Point3<f64>>,
        #[serde(default, rename = "controlPoints", with = "points_format")]
        control_points: Vec<Point3<f64>>,
        #[serde(default)]
        closed: bool,
    },
}

impl CurveSegment {
    pub fn line(start: Point3<f64>, end: Point3<f64>) -> Self {
        CurveSegment::Line { start, end }
    }

    pub fn polyline(points: Vec<Point3<f64>>) -> Self {
        CurveSegment::Polyline {
            points,
            closed: false,
        }
    }

    pub fn closed_polyline(points: Vec<Point3<f64>>) -> Self {
        CurveSegment::Polyline {
            points,
            closed: true,
        }
    }

    /// Ordered sample points along the curve
    ///
    /// `segments` is the sample count for a full turn; arcs use a share of it
    /// proportional to their sweep. Closed curves repeat their first point.
    pub fn sample_points(&self, segments: usize) -> Vec<Point3<f64>> {
        let segments = segments.max(3);
        match self {
            CurveSegment::Line { start, end } => vec![*start, *end],

            CurveSegment::Polyline { points, closed } => close_if(points.clone(), *closed),

            CurveSegment::Arc { start, mid, end } => sample_arc(start, mid, end, segments),

            CurveSegment::Circle {
                center,
                normal,
                radius,
            } => {
                let Some(normal) = Unit::try_new(*normal, f64::EPSILON) else {
                    return vec![*center];
                };
                let (u, v) = orthonormal_axes(&normal);
                sample_ellipse(center, &u, &v, *radius, *radius, segments)
            }

            CurveSegment::Ellipse {
                center,
                normal,
                x_axis,
                first_radius,
                second_radius,
            } => {
                let Some(normal) = Unit::try_new(*normal, f64::EPSILON) else {
                    return vec![*center];
                };
                // Keep the major axis in the ellipse plane
                let n = normal.into_inner();
                let in_plane = x_axis - n * x_axis.dot(&n);
                let (u, v) = match Unit::try_new(in_plane, f64::EPSILON) {
                    Some(u) => {
                        let u = u.into_inner();
                        (u, n.cross(&u))
                    }
                    None => orthonormal_axes(&normal),
                };
                sample_ellipse(center, &u, &v, *first_radius, *second_radius, segments)
            }

            CurveSegment::Generic {
                points,
                control_points,
                closed,
            } => {
                let source = if points.is_empty() {
                    control_points
                } else {
                    points
                };
                close_if(source.clone(), *closed)
            }
        }
    }
}

fn close_if(mut points: Vec<Point3<f64>>, closed: bool) -> Vec<Point3<f64>> {
    if closed && points.len() > 2 && points.first() != points.last() {
        points.push(points[0]);
    }
    points
}

fn sample_ellipse(
    center: &Point3<f64>,
    u: &Vector3<f64>,
    v: &Vector3<f64>,
    ru: f64,
    rv: f64,
    segments: usize,
) -> Vec<Point3<f64>> {
    let mut points: Vec<Point3<f64>> = (0..segments)
        .map(|i| {
            let theta = TAU * i as f64 / segments as f64;
            center + u * (ru * theta.cos()) + v * (rv * theta.sin())
        })
        .collect();
    points.push(points[0]);
    points
}

/// Sample the circle through three points, from `start` via `mid` to `end`
fn sample_arc(
    start: &Point3<f64>,
    mid: &Point3<f64>,
    end: &Point3<f64>,
    segments: usize,
) -> Vec<Point3<f64>> {
    let a = start - end;
    let b = mid - end;
    let axb = a.cross(&b);
    let denom = 2.0 * axb.norm_squared();
    if denom <= f64::EPSILON {
        // Collinear: the arc is a straight run
        return vec![*start, *mid, *end];
    }

    let center = end + (b * a.norm_squared() - a * b.norm_squared()).cross(&axb) / denom;
    let radius = (start - center).norm();
    let normal = axb.normalize();
    let u = (start - center) / radius;
    let v = normal.cross(&u);

    let angle_of = |p: &Point3<f64>| {
        let d = p - center;
        let angle = d.dot(&v).atan2(d.dot(&u));
        if angle < 0.0 {
            angle + TAU
        } else {
            angle
        }
    };

    // Winding start -> mid -> end is counter-clockwise about `normal`
    let mut sweep = angle_of(end);
    if sweep <= 0.0 {
        sweep = TAU;
    }

    let steps = ((segments as f64 * sweep / TAU).ceil() as usize).max(2);
    let mut points = Vec::with_capacity(steps + 1);
    points.push(*start);
    for i in 1..steps {
        let theta = sweep * i as f64 / steps as f64;
        points.push(center + u * (radius * theta.cos()) + v * (radius * theta.sin()));
    }
    points.push(*end);
    points
}
