// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! End-to-end boundary conversion tests

use anyhow::Result;
use approx::assert_relative_eq;
use areaform::geometry::CONVERTED_FROM_AREA_BOUNDARY;
use areaform::{
    convert_boundaries, BatchError, Boundary, BoundaryConverter, ConversionConfig,
    ConversionError, CurveSegment,
};
use nalgebra::{Point3, Vector3};
use serde_json::json;

fn p(x: f64, y: f64, z: f64) -> Point3<f64> {
    Point3::new(x, y, z)
}

fn rectangle_lines(x0: f64, y0: f64, w: f64, h: f64, z: f64) -> Vec<CurveSegment> {
    let c = [
        p(x0, y0, z),
        p(x0 + w, y0, z),
        p(x0 + w, y0 + h, z),
        p(x0, y0 + h, z),
    ];
    (0..4).map(|i| CurveSegment::line(c[i], c[(i + 1) % 4])).collect()
}

#[test]
fn test_room_with_column_hole() -> Result<()> {
    let mut curves = rectangle_lines(0.0, 0.0, 8.0, 5.0, 3.0);
    curves.extend(rectangle_lines(3.0, 2.0, 1.0, 1.0, 3.0));

    let boundary = Boundary::new()
        .with_id("room-101")
        .with_value("name", "Meeting")
        .with_value("area", 39.0)
        .with_value("level", json!({"name": "Level 1", "elevation": 3.0}))
        .with_curves("curves", curves);

    let report = convert_boundaries(&[boundary], ConversionConfig::default()).into_result()?;
    let mesh = &report.meshes[0];

    println!("Room with column:");
    println!("  Vertices: {}", mesh.vertex_count());
    println!("  Triangles: {}", mesh.triangle_count());
    println!("  Area: {:.3} (expected: 39)", mesh.surface_area());

    assert_relative_eq!(mesh.surface_area(), 39.0, epsilon = 1e-9);
    assert!(mesh.is_valid());
    let bbox = mesh.bounding_box();
    assert_eq!(bbox.min, p(0.0, 0.0, 3.0));
    assert_eq!(bbox.max, p(8.0, 5.0, 3.0));
    assert_eq!(mesh.metadata["name"], "Meeting");
    assert_eq!(mesh.metadata["level"]["name"], "Level 1");

    let provenance = mesh.provenance.as_ref().expect("provenance");
    assert_eq!(provenance.converted_from, CONVERTED_FROM_AREA_BOUNDARY);
    assert_eq!(provenance.source_id.as_deref(), Some("room-101"));
    Ok(())
}

#[test]
fn test_holes_ignored_when_not_merging() -> Result<()> {
    let mut curves = rectangle_lines(0.0, 0.0, 8.0, 5.0, 0.0);
    curves.extend(rectangle_lines(3.0, 2.0, 1.0, 1.0, 0.0));
    let boundary = Boundary::new().with_curves("curves", curves);

    let config = ConversionConfig::default().with_merge_holes(false);
    let report = convert_boundaries(&[boundary], config).into_result()?;
    assert_relative_eq!(report.meshes[0].surface_area(), 40.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_small_area_is_skipped_silently() {
    let boundary = Boundary::new()
        .with_value("area", 0.05)
        .with_curves("curves", rectangle_lines(0.0, 0.0, 0.5, 0.1, 0.0));

    let report = convert_boundaries(&[boundary], ConversionConfig::default());
    assert!(report.meshes.is_empty());
    assert!(report.failures.is_empty());
    assert_eq!(report.skipped, vec![0]);
}

#[test]
fn test_unclosed_chain_does_not_block_valid_loop() -> Result<()> {
    let mut curves = rectangle_lines(0.0, 0.0, 4.0, 4.0, 0.0);
    // Two edges of a triangle that never closes, sitting inside the outline
    curves.push(CurveSegment::line(p(1.0, 1.0, 0.0), p(2.0, 1.0, 0.0)));
    curves.push(CurveSegment::line(p(2.0, 1.0, 0.0), p(1.5, 2.0, 0.0)));

    let boundary = Boundary::new().with_curves("curves", curves);
    let report = convert_boundaries(&[boundary], ConversionConfig::default());

    println!("{}", report.summary());
    assert_eq!(report.meshes.len(), 1);
    assert_relative_eq!(report.meshes[0].surface_area(), 16.0, epsilon = 1e-9);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        ConversionError::MalformedLoop { .. }
    ));
    Ok(())
}

#[test]
fn test_arc_and_line_outline() -> Result<()> {
    // Half disc of radius 2: diameter along x, arc above it
    let curves = vec![
        CurveSegment::line(p(-2.0, 0.0, 0.0), p(2.0, 0.0, 0.0)),
        CurveSegment::Arc {
            start: p(2.0, 0.0, 0.0),
            mid: p(0.0, 2.0, 0.0),
            end: p(-2.0, 0.0, 0.0),
        },
    ];
    let boundary = Boundary::new().with_curves("outline", curves);
    let report = convert_boundaries(&[boundary], ConversionConfig::default()).into_result()?;

    let area = report.meshes[0].surface_area();
    let exact = std::f64::consts::PI * 2.0;
    println!("Half disc area {:.4} (exact {:.4})", area, exact);
    assert!(area < exact);
    assert!((exact - area) / exact < 0.01);
    Ok(())
}

#[test]
fn test_circle_with_circular_hole() -> Result<()> {
    let curves = vec![
        CurveSegment::Circle {
            center: p(0.0, 0.0, 1.0),
            normal: Vector3::z(),
            radius: 5.0,
        },
        CurveSegment::Circle {
            center: p(1.0, 0.0, 1.0),
            normal: Vector3::z(),
            radius: 1.0,
        },
    ];
    let boundary = Boundary::new().with_curves("curves", curves);
    let report = convert_boundaries(&[boundary], ConversionConfig::default()).into_result()?;

    let mesh = &report.meshes[0];
    let sides = 32.0;
    let polygon_area = |r: f64| 0.5 * sides * r * r * (std::f64::consts::TAU / sides).sin();
    assert_relative_eq!(
        mesh.surface_area(),
        polygon_area(5.0) - polygon_area(1.0),
        epsilon = 1e-6
    );
    assert!(report.failures.is_empty());
    Ok(())
}

#[test]
fn test_tilted_boundary() -> Result<()> {
    // Ramp rising along y
    let curves = vec![CurveSegment::closed_polyline(vec![
        p(0.0, 0.0, 0.0),
        p(3.0, 0.0, 0.0),
        p(3.0, 4.0, 3.0),
        p(0.0, 4.0, 3.0),
    ])];
    let boundary = Boundary::new().with_curves("geometry", curves);
    let report = convert_boundaries(&[boundary], ConversionConfig::default()).into_result()?;

    let mesh = &report.meshes[0];
    assert_relative_eq!(mesh.surface_area(), 15.0, epsilon = 1e-9);
    for vertex in &mesh.vertices {
        assert_relative_eq!(vertex.normal.norm(), 1.0, epsilon = 1e-12);
        assert!(vertex.normal.x.abs() < 1e-12);
    }
    Ok(())
}

#[test]
fn test_batch_reports_failures_by_index() {
    let boundaries = vec![
        Boundary::new().with_curves("curves", rectangle_lines(0.0, 0.0, 2.0, 2.0, 0.0)),
        Boundary::new().with_value("name", "empty"),
        Boundary::new().with_curves(
            "curves",
            vec![CurveSegment::polyline(vec![
                p(0.0, 0.0, 0.0),
                p(1.0, 0.0, 0.0),
                p(1.0, 1.0, 0.0),
                p(0.0, 1.0, 1.0),
                p(0.0, 0.0, 0.0),
            ])],
        ),
        Boundary::new().with_curves("curves", rectangle_lines(5.0, 5.0, 1.0, 3.0, 0.0)),
    ];

    let report = BoundaryConverter::new(ConversionConfig::default()).convert_batch(&boundaries);
    assert_eq!(report.total, 4);
    assert_eq!(report.meshes.len(), 2);
    assert_eq!(report.originals.len(), 4);

    let indices: Vec<usize> = report.failures.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(report.failures[0].error, ConversionError::NoCurvesFound);
    assert!(matches!(
        report.failures[1].error,
        ConversionError::NonPlanar { .. }
    ));

    let summary = report.summary();
    assert!(summary.contains("Converted 2 area boundaries to surfaces"));
    assert!(summary.contains("Boundary 1: No curves found"));
}

#[test]
fn test_batch_without_meshes_fails() {
    let boundaries = vec![Boundary::new(), Boundary::new()];
    let config = ConversionConfig::default().with_preserve_original(false);
    let report = convert_boundaries(&boundaries, config);
    assert!(report.originals.is_empty());
    assert_eq!(
        report.into_result().unwrap_err(),
        BatchError::NoMeshesProduced { failed: 2 }
    );
}

#[test]
fn test_json_input_round_trip() -> Result<()> {
    let input = json!([{
        "id": "a-1",
        "speckle_type": "Objects.BuiltElements.Area",
        "name": "Store",
        "number": "B12",
        "units": "m",
        "outline": {
            "type": "Objects.Geometry.Polyline",
            "points": [[0.0, 0.0, 0.0], [6.0, 0.0, 0.0], [6.0, 2.0, 0.0], [0.0, 2.0, 0.0]],
            "closed": true
        }
    }]);
    let boundaries: Vec<Boundary> = serde_json::from_value(input)?;
    let report = convert_boundaries(&boundaries, ConversionConfig::default()).into_result()?;

    let text = serde_json::to_string(&report)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    assert_eq!(value["meshes"][0]["metadata"]["number"], "B12");
    assert_eq!(value["meshes"][0]["provenance"]["source_index"], 0);
    assert_eq!(value["originals"][0]["id"], "a-1");
    assert_relative_eq!(report.meshes[0].surface_area(), 12.0, epsilon = 1e-12);
    Ok(())
}
