//! This module defines a trait for printing load test reports.
mod format;
mod json;
mod text;

pub use json::JsonReporter;
pub use text::TextReporter;

use crate::{accumulator::Snapshot, report::LoadTestReport};

/// A trait for reporting load test results.
pub trait LoadTestReporter {
    /// Print the report to the given writer.
    fn print(&self, w: &mut dyn std::io::Write, report: &LoadTestReport) -> anyhow::Result<()>;
}

/// The snapshots to render, labelled by role.
fn roles(report: &LoadTestReport) -> Vec<(&'static str, &Snapshot)> {
    if report.is_combined() {
        vec![("combined", &report.results.producer)]
    } else {
        vec![("producer", &report.results.producer), ("consumer", &report.results.consumer)]
    }
}
