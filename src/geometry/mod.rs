// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - curves, loops, planes and mesh generation

mod bbox;
pub mod curve;
pub mod loops;
mod mesh;
pub mod plane;
pub mod predicates;
pub mod tessellate;

pub use bbox::BoundingBox;
pub use curve::CurveSegment;
pub use loops::{chain_paths, classify_rings, Loop, LoopRole, Polygon};
pub use mesh::{Mesh, Provenance, Triangle, Vertex, CONVERTED_FROM_AREA_BOUNDARY};
pub use plane::{check_planarity, is_planar, Plane, PlaneBasis};
pub use tessellate::tessellate;
