// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polygon tessellation by ear clipping
//!
//! The polygon is projected into its plane, holes are bridged into the outer
//! ring with zero-width edge pairs, and the resulting single ring is clipped
//! ear by ear. Triangles index the original 3D loop vertices.

use super::loops::Polygon;
use super::mesh::{Mesh, Triangle, Vertex};
use super::plane::PlaneBasis;
use super::predicates::{orient2d, point_in_triangle, signed_area};
use super::BoundingBox;
use crate::error::{ConversionError, ConversionResult};
use nalgebra::{Point2, Point3};
use tracing::{debug, warn};

/// Relative epsilon for zero-area turns, scaled by the squared polygon size
const AREA_EPS: f64 = 1e-12;

/// Shared vertex storage: 3D source points and their plane coordinates
struct VertexPool {
    positions: Vec<Point3<f64>>,
    coords: Vec<Point2<f64>>,
}

impl VertexPool {
    /// Add a loop, merging consecutive points closer than `tolerance`
    /// Returns the ring of pool indices
    fn add_ring(&mut self, points: &[Point3<f64>], basis: &PlaneBasis, tolerance: f64) -> Vec<usize> {
        let mut ring: Vec<usize> = Vec::with_capacity(points.len());
        for point in points {
            let coord = basis.project(point);
            if let Some(&last) = ring.last() {
                if (self.coords[last] - coord).norm() <= tolerance {
                    continue;
                }
            }
            ring.push(self.positions.len());
            self.positions.push(*point);
            self.coords.push(coord);
        }
        while ring.len() > 1 {
            let (first, last) = (ring[0], ring[ring.len() - 1]);
            if (self.coords[first] - self.coords[last]).norm() > tolerance {
                break;
            }
            ring.pop();
        }
        ring
    }

    fn ring_area(&self, ring: &[usize]) -> f64 {
        let pts: Vec<Point2<f64>> = ring.iter().map(|&i| self.coords[i]).collect();
        signed_area(&pts)
    }
}

/// Triangulate a polygon with holes into a mesh
///
/// Triangles wind counter-clockwise about `basis.normal`, which is also used
/// as every vertex normal.
pub fn tessellate(polygon: &Polygon, basis: &PlaneBasis, tolerance: f64) -> ConversionResult<Mesh> {
    let mut pool = VertexPool {
        positions: Vec::with_capacity(polygon.vertex_count()),
        coords: Vec::with_capacity(polygon.vertex_count()),
    };

    let mut outer = pool.add_ring(&polygon.outer.vertices, basis, tolerance);
    if outer.len() < 3 {
        return Err(ConversionError::DegeneratePolygon {
            distinct: outer.len(),
        });
    }

    let scale = BoundingBox::from_points(pool.positions.iter()).diagonal();
    let eps = AREA_EPS * scale * scale;

    let outer_area = pool.ring_area(&outer);
    if outer_area.abs() <= eps {
        return Err(ConversionError::DegeneratePolygon {
            distinct: outer.len(),
        });
    }
    if outer_area < 0.0 {
        outer.reverse();
    }

    let mut holes: Vec<Vec<usize>> = Vec::with_capacity(polygon.holes.len());
    for hole in &polygon.holes {
        let mut ring = pool.add_ring(&hole.vertices, basis, tolerance);
        let area = pool.ring_area(&ring);
        if ring.len() < 3 || area.abs() <= eps {
            warn!("Skipping degenerate hole with {} vertices", ring.len());
            continue;
        }
        // Holes wind clockwise
        if area > 0.0 {
            ring.reverse();
        }
        holes.push(ring);
    }

    // Bridge the hole reaching furthest right first
    holes.sort_by(|a, b| {
        max_x(&pool.coords, b).total_cmp(&max_x(&pool.coords, a))
    });

    let mut ring = outer;
    for hole in &holes {
        bridge_hole(&mut ring, hole, &pool.coords)?;
    }

    let triangles = ear_clip(ring, &pool.coords, eps)?;

    let mut mesh = Mesh::with_capacity(pool.positions.len(), triangles.len());
    for position in &pool.positions {
        mesh.add_vertex(Vertex::new(*position, basis.normal));
    }
    for indices in triangles {
        mesh.add_triangle(Triangle::new(indices));
    }
    let dropped = mesh.remove_orphaned_vertices();

    debug!(
        "Tessellated polygon with {} hole(s): {} triangles, {} vertices ({} unused dropped)",
        holes.len(),
        mesh.triangle_count(),
        mesh.vertex_count(),
        dropped
    );

    Ok(mesh)
}

fn max_x(coords: &[Point2<f64>], ring: &[usize]) -> f64 {
    ring.iter()
        .map(|&i| coords[i].x)
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Whether the segment from ring position `k` towards `target` starts inside
/// the polygon (the ring is counter-clockwise)
fn locally_inside(ring: &[usize], k: usize, target: &Point2<f64>, coords: &[Point2<f64>]) -> bool {
    let n = ring.len();
    let a = &coords[ring[k]];
    let prev = &coords[ring[(k + n - 1) % n]];
    let next = &coords[ring[(k + 1) % n]];

    if orient2d(prev, a, next) >= 0.0 {
        orient2d(a, next, target) >= 0.0 && orient2d(a, target, prev) >= 0.0
    } else {
        orient2d(a, next, target) >= 0.0 || orient2d(a, target, prev) >= 0.0
    }
}

/// Splice a clockwise hole into the counter-clockwise ring
///
/// A ray cast in +x from the hole's rightmost vertex finds the nearest ring
/// edge; the bridge goes to the visible vertex of that edge, or to the ring
/// vertex inside the ray triangle that makes the smallest angle with the ray.
fn bridge_hole(ring: &mut Vec<usize>, hole: &[usize], coords: &[Point2<f64>]) -> ConversionResult<()> {
    let (hole_start, m) = hole
        .iter()
        .enumerate()
        .map(|(pos, &i)| (pos, coords[i]))
        .fold(None::<(usize, Point2<f64>)>, |best, (pos, c)| match best {
            Some((_, b)) if b.x >= c.x => best,
            _ => Some((pos, c)),
        })
        .ok_or(ConversionError::DegeneratePolygon { distinct: 0 })?;

    let n = ring.len();

    // Nearest edge crossing the ray, taking only edges that face the ray origin
    let mut hit: Option<(f64, usize)> = None;
    for k in 0..n {
        let a = &coords[ring[k]];
        let b = &coords[ring[(k + 1) % n]];
        if a.y <= m.y && m.y <= b.y && a.y != b.y {
            let x = a.x + (m.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x >= m.x && hit.map_or(true, |(best, _)| x < best) {
                hit = Some((x, k));
            }
        }
    }
    let Some((hit_x, edge)) = hit else {
        return Err(ConversionError::malformed(
            "hole is not enclosed by the outer loop",
        ));
    };

    let a_pos = edge;
    let b_pos = (edge + 1) % n;
    let hit_point = Point2::new(hit_x, m.y);

    let mut bridge = if coords[ring[a_pos]] == hit_point {
        a_pos
    } else if coords[ring[b_pos]] == hit_point {
        b_pos
    } else {
        // Edge endpoint furthest along the ray
        let candidate = if coords[ring[a_pos]].x > coords[ring[b_pos]].x {
            a_pos
        } else {
            b_pos
        };

        // A ring vertex inside triangle (m, hit, candidate) would block the view
        let p = coords[ring[candidate]];
        let mut best = candidate;
        let mut best_tan = f64::INFINITY;
        for k in 0..n {
            let r = &coords[ring[k]];
            if k == candidate || r.x < m.x || *r == p {
                continue;
            }
            if point_in_triangle(r, &m, &hit_point, &p) && locally_inside(ring, k, &m, coords) {
                let tan = (m.y - r.y).abs() / (r.x - m.x);
                let closer = tan == best_tan && r.x > coords[ring[best]].x;
                if tan < best_tan || closer {
                    best = k;
                    best_tan = tan;
                }
            }
        }
        best
    };

    // The bridge vertex may already appear twice from an earlier bridge;
    // use the occurrence whose corner opens towards the hole
    let target = ring[bridge];
    if !locally_inside(ring, bridge, &m, coords) {
        if let Some(k) = (0..n).find(|&k| ring[k] == target && locally_inside(ring, k, &m, coords)) {
            bridge = k;
        }
    }

    let mut merged = Vec::with_capacity(n + hole.len() + 2);
    merged.extend_from_slice(&ring[..=bridge]);
    for j in 0..=hole.len() {
        merged.push(hole[(hole_start + j) % hole.len()]);
    }
    merged.push(target);
    merged.extend_from_slice(&ring[bridge + 1..]);
    *ring = merged;

    Ok(())
}

/// Clip ears off a counter-clockwise ring until one triangle remains
fn ear_clip(mut ring: Vec<usize>, coords: &[Point2<f64>], eps: f64) -> ConversionResult<Vec<[usize; 3]>> {
    let mut triangles = Vec::with_capacity(ring.len().saturating_sub(2));
    let mut i = 0;
    let mut stalled = 0;

    while ring.len() > 3 {
        let n = ring.len();
        i %= n;
        let prev = ring[(i + n - 1) % n];
        let curr = ring[i];
        let next = ring[(i + 1) % n];
        let turn = orient2d(&coords[prev], &coords[curr], &coords[next]);

        if turn.abs() <= eps {
            // Collinear or spike vertex: removing it changes no area
            ring.remove(i);
            stalled = 0;
            continue;
        }

        if turn > 0.0 && is_ear(&ring, prev, curr, next, coords) {
            triangles.push([prev, curr, next]);
            ring.remove(i);
            stalled = 0;
            continue;
        }

        i += 1;
        stalled += 1;
        if stalled >= n {
            warn!("Ear clipping stuck with {} vertices remaining", n);
            return Err(ConversionError::TessellationFailure { remaining: n });
        }
    }

    if ring.len() == 3 {
        let turn = orient2d(&coords[ring[0]], &coords[ring[1]], &coords[ring[2]]);
        if turn > eps {
            triangles.push([ring[0], ring[1], ring[2]]);
        }
    }

    if triangles.is_empty() {
        return Err(ConversionError::TessellationFailure {
            remaining: ring.len(),
        });
    }

    Ok(triangles)
}

/// Convex corner whose triangle holds no other ring vertex
fn is_ear(ring: &[usize], prev: usize, curr: usize, next: usize, coords: &[Point2<f64>]) -> bool {
    let (a, b, c) = (&coords[prev], &coords[curr], &coords[next]);
    ring.iter().all(|&idx| {
        if idx == prev || idx == curr || idx == next {
            return true;
        }
        let p = &coords[idx];
        // Bridge duplicates and touching loops share corner positions
        if p == a || p == b || p == c {
            return true;
        }
        !point_in_triangle(p, a, b, c)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::loops::{Loop, LoopRole};

    fn p(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    fn outer(points: Vec<Point3<f64>>) -> Loop {
        Loop::new(points, LoopRole::Outer)
    }

    fn hole(points: Vec<Point3<f64>>) -> Loop {
        Loop::new(points, LoopRole::Hole)
    }

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point3<f64>> {
        vec![
            p(x0, y0),
            p(x0 + size, y0),
            p(x0 + size, y0 + size),
            p(x0, y0 + size),
        ]
    }

    #[test]
    fn test_convex_quad_two_triangles() {
        let polygon = Polygon::new(outer(square(0.0, 0.0, 1.0)), vec![]);
        let mesh = tessellate(&polygon, &PlaneBasis::xy(), 0.01).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_clockwise_input_is_reoriented() {
        let mut points = square(0.0, 0.0, 2.0);
        points.reverse();
        let polygon = Polygon::new(outer(points), vec![]);
        let mesh = tessellate(&polygon, &PlaneBasis::xy(), 0.01).unwrap();
        assert!((mesh.surface_area() - 4.0).abs() < 1e-12);
        for t in &mesh.triangles {
            let [a, b, c] = t.indices.map(|i| mesh.vertices[i].position);
            assert!((b - a).cross(&(c - a)).z > 0.0);
        }
    }

    #[test]
    fn test_concave_l_shape() {
        // A fan from vertex 0 would spill outside this outline
        let points = vec![
            p(0.0, 0.0),
            p(4.0, 0.0),
            p(4.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 4.0),
            p(0.0, 4.0),
        ];
        let polygon = Polygon::new(outer(points), vec![]);
        let mesh = tessellate(&polygon, &PlaneBasis::xy(), 0.01).unwrap();
        assert_eq!(mesh.triangle_count(), 4);
        assert!((mesh.surface_area() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_square_with_hole() {
        let polygon = Polygon::new(
            outer(square(0.0, 0.0, 10.0)),
            vec![hole(square(4.0, 4.0, 2.0))],
        );
        let mesh = tessellate(&polygon, &PlaneBasis::xy(), 0.01).unwrap();
        assert!((mesh.surface_area() - 96.0).abs() < 1e-9);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 8);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_two_holes() {
        let polygon = Polygon::new(
            outer(square(0.0, 0.0, 10.0)),
            vec![hole(square(1.0, 1.0, 2.0)), hole(square(6.0, 5.0, 3.0))],
        );
        let mesh = tessellate(&polygon, &PlaneBasis::xy(), 0.01).unwrap();
        assert!((mesh.surface_area() - (100.0 - 4.0 - 9.0)).abs() < 1e-9);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_collinear_vertices_are_dropped() {
        let points = vec![
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
        ];
        let polygon = Polygon::new(outer(points), vec![]);
        let mesh = tessellate(&polygon, &PlaneBasis::xy(), 0.01).unwrap();
        assert!((mesh.surface_area() - 4.0).abs() < 1e-12);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_merged_vertices_make_degenerate_polygon() {
        let points = vec![p(0.0, 0.0), p(0.001, 0.0), p(1.0, 0.0)];
        let polygon = Polygon::new(outer(points), vec![]);
        let err = tessellate(&polygon, &PlaneBasis::xy(), 0.01).unwrap_err();
        assert_eq!(err, ConversionError::DegeneratePolygon { distinct: 2 });
    }

    #[test]
    fn test_collinear_outline_is_degenerate() {
        let points = vec![p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)];
        let polygon = Polygon::new(outer(points), vec![]);
        assert!(matches!(
            tessellate(&polygon, &PlaneBasis::xy(), 0.01),
            Err(ConversionError::DegeneratePolygon { .. })
        ));
    }

    #[test]
    fn test_tilted_plane_keeps_3d_positions() {
        let basis = PlaneBasis::new(
            Point3::origin(),
            nalgebra::Unit::new_normalize(nalgebra::Vector3::new(0.0, -1.0, 1.0)),
        );
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let polygon = Polygon::new(outer(points.clone()), vec![]);
        let mesh = tessellate(&polygon, &basis, 0.01).unwrap();
        assert!((mesh.surface_area() - 2.0 * 2f64.sqrt()).abs() < 1e-9);
        for v in &mesh.vertices {
            assert!(points.contains(&v.position));
        }
    }
}
