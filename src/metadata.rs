// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Metadata transfer from boundaries to meshes

use crate::boundary::Boundary;
use crate::geometry::Mesh;
use serde_json::{Map, Value};

/// Boundary attributes copied onto generated meshes
pub const PRESERVED_ATTRIBUTES: [&str; 12] = [
    "area",
    "perimeter",
    "name",
    "number",
    "level",
    "roomNumber",
    "roomName",
    "department",
    "occupancy",
    "parameters",
    "properties",
    "units",
];

/// Collect the preserved attributes plus the entries of a `parameters` object
///
/// A parameter entry never replaces a preserved attribute of the same name.
pub fn extract_metadata(boundary: &Boundary) -> Map<String, Value> {
    let mut metadata = Map::new();
    for name in PRESERVED_ATTRIBUTES {
        if let Some(value) = boundary.value(name) {
            metadata.insert(name.to_string(), value);
        }
    }

    if let Some(Value::Object(parameters)) = boundary.value("parameters") {
        for (key, value) in parameters {
            metadata.entry(key).or_insert(value);
        }
    }

    metadata
}

/// Write metadata onto a mesh, replacing existing keys
pub fn propagate(mesh: &mut Mesh, metadata: &Map<String, Value>) {
    for (key, value) in metadata {
        mesh.metadata.insert(key.clone(), value.clone());
    }
}

/// Numeric `area` declared on the boundary
pub fn declared_area(boundary: &Boundary) -> Option<f64> {
    boundary.value("area").and_then(|v| v.as_f64())
}

/// Whether a declared area exists and is below `threshold`
pub fn below_area_threshold(boundary: &Boundary, threshold: f64) -> bool {
    declared_area(boundary).is_some_and(|area| area < threshold)
}
