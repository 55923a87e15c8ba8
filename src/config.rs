// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Conversion configuration

use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default plane-fit and endpoint-merge distance
pub const DEFAULT_TOLERANCE: f64 = 0.01;
/// Default minimum declared area (square units)
pub const DEFAULT_MIN_AREA: f64 = 0.1;
/// Default sampling density for arcs, circles and ellipses (per full turn)
pub const DEFAULT_ARC_SEGMENTS: usize = 32;

/// Boundary conversion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Plane-fit and endpoint-merge distance
    pub tolerance: f64,
    /// Re-emit the original boundary records alongside generated meshes
    pub preserve_original: bool,
    /// Subtract hole loops from the outer loop instead of ignoring them
    pub merge_holes: bool,
    /// Skip boundaries whose declared area is below this value
    pub min_area_threshold: f64,
    /// Sample count for a full turn of an arc, circle or ellipse
    pub arc_segments: usize,
    /// Maximum parallel workers (None = rayon default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,
    /// Time budget for one boundary conversion
    #[serde(with = "duration_secs", skip_serializing_if = "Option::is_none")]
    pub boundary_timeout: Option<Duration>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            preserve_original: true,
            merge_holes: true,
            min_area_threshold: DEFAULT_MIN_AREA,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            parallelism: None, // Auto-detect
            boundary_timeout: None,
        }
    }
}

impl ConversionConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: ConversionConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if PathBuf::from("areaform.toml").exists() {
            Self::from_file("areaform.toml")?
        } else {
            Self::default()
        };

        if let Ok(tolerance) = std::env::var("AREAFORM_TOLERANCE") {
            config.tolerance = tolerance
                .parse()
                .with_context(|| format!("Invalid AREAFORM_TOLERANCE: {}", tolerance))?;
        }

        if let Ok(min_area) = std::env::var("AREAFORM_MIN_AREA") {
            config.min_area_threshold = min_area
                .parse()
                .with_context(|| format!("Invalid AREAFORM_MIN_AREA: {}", min_area))?;
        }

        if let Ok(parallelism) = std::env::var("AREAFORM_PARALLELISM") {
            config.parallelism = parallelism.parse().ok();
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Check value ranges
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.tolerance > 0.0) || !self.tolerance.is_finite() {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        if !(self.min_area_threshold >= 0.0) {
            return Err(ConfigError::InvalidAreaThreshold(self.min_area_threshold));
        }
        if self.arc_segments < 3 {
            return Err(ConfigError::InvalidArcSegments(self.arc_segments));
        }
        if self.parallelism == Some(0) {
            return Err(ConfigError::ZeroParallelism);
        }
        Ok(())
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_min_area_threshold(mut self, threshold: f64) -> Self {
        self.min_area_threshold = threshold;
        self
    }

    pub fn with_merge_holes(mut self, merge_holes: bool) -> Self {
        self.merge_holes = merge_holes;
        self
    }

    pub fn with_preserve_original(mut self, preserve: bool) -> Self {
        self.preserve_original = preserve;
        self
    }

    pub fn with_boundary_timeout(mut self, timeout: Duration) -> Self {
        self.boundary_timeout = Some(timeout);
        self
    }
}

// TOML has no duration type; store seconds as a float
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs_f64))
    }
}
