// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! CLI output reporter with colored formatting

use crate::report::BatchReport;
use colored::*;
use std::time::Duration;

/// Failures listed in full before the rest are elided
const LISTED_FAILURES: usize = 10;

/// CLI reporter for formatted output
pub struct Reporter;

impl Reporter {
    /// Report a finished batch with colors
    pub fn report_batch(input: &str, report: &BatchReport, duration: Duration, verbose: bool) {
        println!("\n{}", "━".repeat(80).bright_black());
        println!("{} {}", "Input:".bold(), input.cyan());
        println!("{}", "━".repeat(80).bright_black());

        if report.is_success() {
            println!(
                "{} {}",
                "✅".green(),
                format!("Converted {} area boundaries to surfaces", report.meshes.len())
                    .green()
                    .bold()
            );
        } else {
            println!(
                "{} {}",
                "❌".red(),
                "No area boundaries could be converted to surfaces".red().bold()
            );
        }

        println!("\n{}", "Boundaries:".bold());
        Self::print_count("Total", report.total, false);
        Self::print_count("Converted", report.meshes.len(), false);
        Self::print_count("Skipped", report.skipped.len(), false);
        Self::print_count("Failed", report.failed_boundaries(), true);

        let triangles: usize = report.meshes.iter().map(|m| m.triangle_count()).sum();
        let area: f64 = report.meshes.iter().map(|m| m.surface_area()).sum();
        println!("\n{}", "Geometry:".bold());
        println!(
            "  {} {}",
            "Triangles:".bright_black(),
            triangles.to_string().cyan()
        );
        println!(
            "  {} {}",
            "Surface area:".bright_black(),
            format!("{:.3}", area).cyan()
        );

        if !report.failures.is_empty() {
            println!("\n{}", "Failures:".red().bold());
            let shown = if verbose {
                report.failures.len()
            } else {
                LISTED_FAILURES.min(report.failures.len())
            };
            for failure in &report.failures[..shown] {
                println!("  {} {}", "❌".red(), failure.reason().bright_black());
            }
            if shown < report.failures.len() {
                println!(
                    "  {}",
                    format!("... and {} more", report.failures.len() - shown).bright_black()
                );
            }
        }

        println!("\n{}", "Performance:".bold());
        println!(
            "  {} {}",
            "Time:".bright_black(),
            Self::format_duration(duration).yellow()
        );
        println!("{}", "━".repeat(80).bright_black());
    }

    /// Report error
    pub fn report_error(message: &str) {
        eprintln!("\n{} {}", "❌ Error:".red().bold(), message);
    }

    /// Report warning
    pub fn report_warning(message: &str) {
        println!("\n{} {}", "⚠️  Warning:".yellow().bold(), message);
    }

    /// Report info
    pub fn report_info(message: &str) {
        println!("{} {}", "ℹ️".bright_blue(), message);
    }

    /// Print success message
    pub fn success(message: &str) {
        println!("{} {}", "✅".green(), message.green());
    }

    fn print_count(name: &str, count: usize, bad_when_nonzero: bool) {
        let value = count.to_string();
        let value = if bad_when_nonzero && count > 0 {
            value.red()
        } else if bad_when_nonzero {
            value.green()
        } else {
            value.cyan()
        };
        println!("  {} {}", format!("{}:", name).bright_black(), value);
    }

    /// Format duration for display
    fn format_duration(duration: Duration) -> String {
        let micros = duration.as_micros();

        if micros < 1_000 {
            format!("{}µs", micros)
        } else if micros < 1_000_000 {
            format!("{:.2}ms", micros as f64 / 1_000.0)
        } else {
            format!("{:.2}s", micros as f64 / 1_000_000.0)
        }
    }
}
