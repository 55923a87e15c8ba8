// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Batch conversion results

use crate::boundary::Boundary;
use crate::error::{BatchError, ConversionError};
use crate::geometry::Mesh;
use serde::{Deserialize, Serialize};

/// Number of failure reasons quoted in the summary
const SUMMARY_REASONS: usize = 3;

/// A conversion failure recorded against its boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryFailure {
    pub index: usize,
    pub error: ConversionError,
}

impl BoundaryFailure {
    pub fn reason(&self) -> String {
        format!("Boundary {}: {}", self.index, self.error)
    }
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Generated meshes, in boundary order
    pub meshes: Vec<Mesh>,
    /// Every failure, in boundary order
    pub failures: Vec<BoundaryFailure>,
    /// Indices of boundaries skipped by the area threshold
    pub skipped: Vec<usize>,
    /// Input boundaries, when originals are preserved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub originals: Vec<Boundary>,
    /// Number of boundaries processed
    pub total: usize,
}

impl BatchReport {
    /// Number of distinct boundaries with at least one failure
    pub fn failed_boundaries(&self) -> usize {
        let mut indices: Vec<usize> = self.failures.iter().map(|f| f.index).collect();
        indices.dedup();
        indices.len()
    }

    pub fn is_success(&self) -> bool {
        !self.meshes.is_empty()
    }

    /// Human-readable digest of the run
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        if self.meshes.is_empty() {
            lines.push("No area boundaries could be converted to surfaces".to_string());
        } else {
            lines.push(format!(
                "Converted {} area boundaries to surfaces",
                self.meshes.len()
            ));
        }

        if !self.skipped.is_empty() {
            lines.push(format!(
                "Skipped {} boundaries below the area threshold",
                self.skipped.len()
            ));
        }

        if !self.failures.is_empty() {
            let reasons: Vec<String> = self
                .failures
                .iter()
                .take(SUMMARY_REASONS)
                .map(BoundaryFailure::reason)
                .collect();
            lines.push(format!(
                "Failed to convert {} boundaries: {}",
                self.failed_boundaries(),
                reasons.join("; ")
            ));
        }

        lines.join("\n")
    }

    /// Fail the batch when nothing was produced
    pub fn into_result(self) -> Result<Self, BatchError> {
        if self.total == 0 {
            return Err(BatchError::NoBoundaries);
        }
        if self.meshes.is_empty() {
            return Err(BatchError::NoMeshesProduced {
                failed: self.failed_boundaries(),
            });
        }
        Ok(self)
    }
}
