// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use lossmap_api::Client;
use lossmap_app::{CountiesResponse, SeriesPoint};
use lossmap_testkit::LossFaker;
use lossmap_tui::{AppRuntime, InternalEvent, SeriesFetchEvent};
use std::sync::mpsc::Sender;
use std::thread;

/// Production runtime: the county list loads on the UI thread at startup,
/// per-county series fetches run on worker threads. Workers never touch UI
/// state; they report over the internal event channel and the UI commits or
/// discards by token.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for HttpRuntime {
    fn load_counties(&mut self) -> Result<CountiesResponse> {
        self.client.fetch_counties()
    }

    fn fetch_series(&mut self, fips: &str, run: Option<&str>) -> Result<Vec<SeriesPoint>> {
        self.client.fetch_county_series(fips, run)
    }

    fn spawn_series_fetch(
        &mut self,
        token: u64,
        fips: &str,
        run: Option<&str>,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let client = self.client.clone();
        let fips = fips.to_owned();
        let run = run.map(str::to_owned);
        thread::spawn(move || {
            let event = match client.fetch_county_series(&fips, run.as_deref()) {
                Ok(points) => InternalEvent::Series(SeriesFetchEvent::Completed { token, points }),
                Err(error) => {
                    tracing::warn!(%fips, error = %format!("{error:#}"), "series fetch failed");
                    InternalEvent::Series(SeriesFetchEvent::Failed {
                        token,
                        error: error.to_string(),
                    })
                }
            };
            // A closed channel means the UI is gone; the result is moot.
            let _ = tx.send(event);
        });
        Ok(())
    }
}

const DEMO_SERIES_STEPS: usize = 40;

/// Offline runtime for `--demo`: deterministic fixtures, no network.
pub struct DemoRuntime {
    faker: LossFaker,
}

impl DemoRuntime {
    pub fn new(seed: u64) -> Self {
        Self {
            faker: LossFaker::new(seed),
        }
    }
}

impl AppRuntime for DemoRuntime {
    fn load_counties(&mut self) -> Result<CountiesResponse> {
        Ok(self.faker.counties_response())
    }

    fn fetch_series(&mut self, fips: &str, _run: Option<&str>) -> Result<Vec<SeriesPoint>> {
        Ok(self.faker.series(fips, DEMO_SERIES_STEPS))
    }
}
