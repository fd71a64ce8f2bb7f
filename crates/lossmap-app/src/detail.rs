// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{CumulativePoint, SeriesPoint, cumulative, normalize_fips};

/// The county the user has activated, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub fips: String,
    pub name: String,
}

/// Lifecycle of the detail panel's series.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailPhase {
    #[default]
    Idle,
    Loading,
    Loaded(Vec<CumulativePoint>),
    Failed(String),
}

/// Selection and run-consistency controller.
///
/// The run identifier is captured once when the county list loads and is
/// threaded into every subsequent series request. Each activation hands out
/// a fresh token; only the completion carrying the newest token may commit,
/// so an out-of-order response for a superseded selection is discarded on
/// arrival rather than aborted in flight.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetailController {
    run: Option<String>,
    selection: Option<Selection>,
    phase: DetailPhase,
    next_token: u64,
    in_flight: Option<u64>,
}

impl DetailController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the run identifier for the rest of the session.
    pub fn set_run(&mut self, run: Option<String>) {
        self.run = run;
    }

    pub fn run(&self) -> Option<&str> {
        self.run.as_deref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn phase(&self) -> &DetailPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, DetailPhase::Loading)
    }

    /// Activate a county: replace the selection wholesale, clear any prior
    /// series or error, and return the token the fetch must complete with.
    pub fn begin(&mut self, fips: &str, name: &str) -> u64 {
        self.selection = Some(Selection {
            fips: normalize_fips(fips),
            name: name.to_owned(),
        });
        self.phase = DetailPhase::Loading;
        self.next_token = self.next_token.wrapping_add(1);
        if self.next_token == 0 {
            self.next_token = 1;
        }
        self.in_flight = Some(self.next_token);
        self.next_token
    }

    /// Commit a fetch result. Returns false (leaving all state untouched)
    /// when `token` does not match the most recent [`begin`](Self::begin).
    pub fn complete(&mut self, token: u64, result: Result<Vec<SeriesPoint>, String>) -> bool {
        if self.in_flight != Some(token) {
            return false;
        }
        self.in_flight = None;
        match result {
            Ok(points) => {
                self.phase = DetailPhase::Loaded(cumulative(&points));
            }
            Err(error) => {
                let label = self
                    .selection
                    .as_ref()
                    .map(|selection| format!("{} ({})", selection.name, selection.fips))
                    .unwrap_or_else(|| "selection".to_owned());
                self.phase = DetailPhase::Failed(format!("series for {label}: {error}"));
            }
        }
        true
    }
}
