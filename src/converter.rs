// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boundary to surface conversion pipeline
//!
//! Each boundary runs extraction, the planarity gate, loop grouping,
//! tessellation and metadata transfer in order. Failures stay with their
//! boundary; a batch always runs to completion.

use crate::boundary::Boundary;
use crate::config::ConversionConfig;
use crate::error::{ConversionError, ConversionResult, Stage};
use crate::extract::{extract_curves, pooled_points, sample_paths};
use crate::geometry::{
    chain_paths, check_planarity, classify_rings, tessellate, Mesh, Plane, Provenance,
};
use crate::metadata::{below_area_threshold, extract_metadata, propagate};
use crate::report::{BatchReport, BoundaryFailure};
use crate::utils::count_distinct;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of converting one boundary
///
/// A boundary can produce a mesh and still report failures, for example a
/// stray open chain next to a valid outline.
#[derive(Debug, Clone, Default)]
pub struct BoundaryOutcome {
    pub mesh: Option<Mesh>,
    pub failures: Vec<ConversionError>,
    pub skipped: bool,
}

impl BoundaryOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Per-boundary time budget
struct Deadline(Option<Instant>);

impl Deadline {
    fn after(timeout: Option<Duration>) -> Self {
        Self(timeout.map(|t| Instant::now() + t))
    }

    fn check(&self, stage: Stage) -> ConversionResult<()> {
        match self.0 {
            Some(at) if Instant::now() >= at => Err(ConversionError::DeadlineExceeded { stage }),
            _ => Ok(()),
        }
    }
}

/// Converts area boundaries to meshes with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct BoundaryConverter {
    config: ConversionConfig,
}

impl BoundaryConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Convert one boundary; `index` is its position in the batch
    pub fn convert(&self, boundary: &Boundary, index: usize) -> BoundaryOutcome {
        if below_area_threshold(boundary, self.config.min_area_threshold) {
            debug!("Boundary {} is below the area threshold, skipping", index);
            return BoundaryOutcome::skipped();
        }

        let mut outcome = BoundaryOutcome::default();
        match self.run_pipeline(boundary, index, &mut outcome.failures) {
            Ok(mesh) => outcome.mesh = mesh,
            Err(err) => {
                debug!("Boundary {} failed: {}", index, err);
                outcome.failures.push(err);
            }
        }
        outcome
    }

    fn run_pipeline(
        &self,
        boundary: &Boundary,
        index: usize,
        failures: &mut Vec<ConversionError>,
    ) -> ConversionResult<Option<Mesh>> {
        let tolerance = self.config.tolerance;
        let deadline = Deadline::after(self.config.boundary_timeout);

        deadline.check(Stage::Extraction)?;
        let curves = extract_curves(boundary);
        if curves.is_empty() {
            return Err(ConversionError::NoCurvesFound);
        }
        let paths = sample_paths(&curves, self.config.arc_segments);
        let points = pooled_points(&paths);

        deadline.check(Stage::Planarity)?;
        check_planarity(&points, tolerance)?;
        let plane = Plane::fit(&points, tolerance).ok_or_else(|| ConversionError::DegeneratePolygon {
            distinct: count_distinct(&points, tolerance),
        })?;
        let basis = plane.basis();

        deadline.check(Stage::Grouping)?;
        let chains = chain_paths(&paths, tolerance);
        failures.extend(chains.rejected);
        let classification = classify_rings(chains.rings, &basis);
        failures.extend(classification.rejected);

        let Some(mut polygon) = classification.polygon else {
            if failures.is_empty() {
                return Err(ConversionError::malformed("no closed loop"));
            }
            return Ok(None);
        };
        if !self.config.merge_holes && !polygon.holes.is_empty() {
            debug!("Ignoring {} hole(s) on boundary {}", polygon.holes.len(), index);
            polygon.holes.clear();
        }

        deadline.check(Stage::Tessellation)?;
        let mut mesh = tessellate(&polygon, &basis, tolerance)?;

        deadline.check(Stage::Metadata)?;
        propagate(&mut mesh, &extract_metadata(boundary));
        mesh.provenance = Some(Provenance::area_boundary(index, boundary.id.clone()));

        debug!(
            "Boundary {} converted: {} triangles from {} curve(s)",
            index,
            mesh.triangle_count(),
            curves.len()
        );
        Ok(Some(mesh))
    }

    /// Convert a batch in parallel
    ///
    /// Results keep input order regardless of scheduling.
    pub fn convert_batch(&self, boundaries: &[Boundary]) -> BatchReport {
        let outcomes = match self.config.parallelism {
            Some(threads) => match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| self.convert_all(boundaries)),
                Err(err) => {
                    warn!("Failed to build a {}-thread pool ({}), using the global pool", threads, err);
                    self.convert_all(boundaries)
                }
            },
            None => self.convert_all(boundaries),
        };

        let mut report = BatchReport {
            total: boundaries.len(),
            ..Default::default()
        };
        for (index, outcome) in outcomes.into_iter().enumerate() {
            if outcome.skipped {
                report.skipped.push(index);
            }
            report.failures.extend(
                outcome
                    .failures
                    .into_iter()
                    .map(|error| BoundaryFailure { index, error }),
            );
            if let Some(mesh) = outcome.mesh {
                report.meshes.push(mesh);
            }
        }
        if self.config.preserve_original {
            report.originals = boundaries.to_vec();
        }

        info!(
            "Converted {} of {} boundaries ({} skipped, {} failures)",
            report.meshes.len(),
            report.total,
            report.skipped.len(),
            report.failures.len()
        );
        report
    }

    fn convert_all(&self, boundaries: &[Boundary]) -> Vec<BoundaryOutcome> {
        boundaries
            .par_iter()
            .enumerate()
            .map(|(index, boundary)| self.convert(boundary, index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CurveSegment;
    use nalgebra::Point3;

    fn square_curves(size: f64) -> Vec<CurveSegment> {
        let c = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(size, 0.0, 0.0),
            Point3::new(size, size, 0.0),
            Point3::new(0.0, size, 0.0),
        ];
        (0..4).map(|i| CurveSegment::line(c[i], c[(i + 1) % 4])).collect()
    }

    #[test]
    fn test_convert_square() {
        let boundary = Boundary::new()
            .with_id("a1")
            .with_value("name", "Office")
            .with_curves("curves", square_curves(3.0));
        let outcome = BoundaryConverter::default().convert(&boundary, 4);

        assert!(outcome.failures.is_empty());
        let mesh = outcome.mesh.unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert!((mesh.surface_area() - 9.0).abs() < 1e-9);
        assert_eq!(mesh.metadata["name"], "Office");
        let provenance = mesh.provenance.unwrap();
        assert_eq!(provenance.source_index, 4);
        assert_eq!(provenance.source_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_no_curves() {
        let outcome = BoundaryConverter::default().convert(&Boundary::new(), 0);
        assert!(outcome.mesh.is_none());
        assert_eq!(outcome.failures, vec![ConversionError::NoCurvesFound]);
    }

    #[test]
    fn test_below_threshold_is_silent() {
        let boundary = Boundary::new()
            .with_value("area", 0.05)
            .with_curves("curves", square_curves(0.2));
        let outcome = BoundaryConverter::default().convert(&boundary, 0);
        assert!(outcome.skipped);
        assert!(outcome.mesh.is_none());
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn test_non_planar_is_reported() {
        let curves = vec![CurveSegment::polyline(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(0.0, 0.0, 0.0),
        ])];
        let boundary = Boundary::new().with_curves("curves", curves);
        let outcome = BoundaryConverter::default().convert(&boundary, 0);
        assert!(outcome.mesh.is_none());
        assert!(matches!(
            outcome.failures[..],
            [ConversionError::NonPlanar { index: 3, .. }]
        ));
    }

    #[test]
    fn test_expired_deadline() {
        let config = ConversionConfig::default().with_boundary_timeout(Duration::ZERO);
        let boundary = Boundary::new().with_curves("curves", square_curves(1.0));
        let outcome = BoundaryConverter::new(config).convert(&boundary, 0);
        assert_eq!(
            outcome.failures,
            vec![ConversionError::DeadlineExceeded {
                stage: Stage::Extraction
            }]
        );
    }

    #[test]
    fn test_batch_keeps_order() {
        let boundaries: Vec<Boundary> = (1..=6)
            .map(|i| Boundary::new().with_curves("curves", square_curves(i as f64)))
            .collect();
        let config = ConversionConfig {
            parallelism: Some(2),
            ..Default::default()
        };
        let report = BoundaryConverter::new(config).convert_batch(&boundaries);

        assert_eq!(report.meshes.len(), 6);
        assert_eq!(report.originals.len(), 6);
        for (i, mesh) in report.meshes.iter().enumerate() {
            assert_eq!(mesh.provenance.as_ref().unwrap().source_index, i);
            let side = (i + 1) as f64;
            assert!((mesh.surface_area() - side * side).abs() < 1e-9);
        }
    }
}
