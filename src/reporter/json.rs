use crate::{accumulator::Snapshot, histogram::PERCENTAGES, plan::Mode, report::LoadTestReport};

use super::{LoadTestReporter, roles};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::BTreeMap, io::Write};

/// JSON reporter.
pub struct JsonReporter;

impl LoadTestReporter for JsonReporter {
    fn print(&self, w: &mut dyn Write, report: &LoadTestReport) -> anyhow::Result<()> {
        let results = &report.results;
        let summary = Summary {
            mode: results.mode,
            started_at: results.started_at,
            total_time: results.elapsed.as_secs_f64(),
            produce_count: report.produce_count,
            consume_count: report.consume_count,
            payload_size: report.payload_size,
        };

        let roles = roles(report).into_iter().map(|(role, s)| (role, RoleReport::from(s))).collect();

        serde_json::to_writer_pretty(&mut *w, &Report { summary, roles })?;
        writeln!(w)?;
        Ok(())
    }
}

#[derive(Serialize)]
struct Summary {
    mode: Mode,
    started_at: DateTime<Utc>,
    total_time: f64,
    produce_count: u64,
    consume_count: u64,
    payload_size: u64,
}

#[derive(Serialize)]
struct RoleReport {
    iterations: u64,
    success_count: u64,
    failure_count: u64,
    success_ratio: f64,
    total_elapsed: f64,
    total_payload_bytes: u64,
    accumulative_payload_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    throughput_metric: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seconds_per_payload: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency: Option<Latency>,
    errors: BTreeMap<String, u64>,
}

#[derive(Serialize)]
struct LatencyStats {
    min: f64,
    max: f64,
    mean: f64,
    median: f64,
    stdev: f64,
}

#[derive(Serialize)]
struct Latency {
    stats: LatencyStats,
    percentiles: BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct Report {
    summary: Summary,
    roles: BTreeMap<&'static str, RoleReport>,
}

impl From<&Snapshot> for RoleReport {
    fn from(s: &Snapshot) -> Self {
        let hist = &s.latency;
        let latency = (!hist.is_empty()).then(|| Latency {
            stats: LatencyStats {
                min: hist.min().as_secs_f64(),
                max: hist.max().as_secs_f64(),
                mean: hist.mean().as_secs_f64(),
                median: hist.median().as_secs_f64(),
                stdev: hist.stdev().as_secs_f64(),
            },
            percentiles: hist
                .percentiles(PERCENTAGES)
                .map(|(p, v)| (format!("p{p}"), v.as_secs_f64()))
                .collect(),
        });

        Self {
            iterations: s.iterations(),
            success_count: s.success_count,
            failure_count: s.failure_count,
            success_ratio: s.success_ratio(),
            total_elapsed: s.total_elapsed.as_secs_f64(),
            total_payload_bytes: s.total_payload_bytes,
            accumulative_payload_size: s.accumulative_payload_size(),
            throughput_metric: s.throughput_metric(),
            seconds_per_payload: s.seconds_per_payload(),
            latency,
            errors: s.error_dist.clone(),
        }
    }
}
