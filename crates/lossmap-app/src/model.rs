// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One county's aggregate forecast figures for a single run.
///
/// `state`, `p50`, and `p90` are emitted by the backend but may be absent in
/// older payloads; they default rather than fail the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountySummary {
    pub fips: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub p50: f64,
    #[serde(default)]
    pub p90: f64,
    pub el_total_sum: f64,
}

/// The county list endpoint's payload: all summaries pinned to one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountiesResponse {
    #[serde(default)]
    pub run: Option<String>,
    pub counties: Vec<CountySummary>,
}

/// One raw time step of a county's loss series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub dt: OffsetDateTime,
    pub el_total: f64,
}

/// A series point plus the running sum up to and including it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CumulativePoint {
    pub dt: OffsetDateTime,
    pub el_total: f64,
    pub el_cum: f64,
}

/// Derive the cumulative column for an ordered series.
///
/// The sum restarts at zero for each series. Steps are not assumed
/// non-negative, so the result is not necessarily monotonic.
pub fn cumulative(points: &[SeriesPoint]) -> Vec<CumulativePoint> {
    let mut total = 0.0;
    points
        .iter()
        .map(|point| {
            total += point.el_total;
            CumulativePoint {
                dt: point.dt,
                el_total: point.el_total,
                el_cum: total,
            }
        })
        .collect()
}

/// Normalize a FIPS code to the canonical 5-digit zero-padded form.
pub fn normalize_fips(raw: &str) -> String {
    format!("{:0>5}", raw.trim())
}
