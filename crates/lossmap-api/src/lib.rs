// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use lossmap_app::{CountiesResponse, SeriesPoint, normalize_fips};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use url::Url;

/// Fixed request timeout for every loss-API call. There is no retry; a
/// timed-out request surfaces as an error and the user re-selects.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Blocking client for the read-only loss API.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `GET /loss/counties`: the full county list plus the run identifier
    /// that pins it to one backend computation batch.
    pub fn fetch_counties(&self) -> Result<CountiesResponse> {
        let response = self
            .http
            .get(format!("{}/loss/counties", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: CountiesResponse = response.json().context("decode county list")?;
        Ok(parsed)
    }

    /// `GET /loss/county?fips=XXXXX[&run=...]`: one county's raw series.
    ///
    /// The run qualifier is appended only when present and passed through
    /// verbatim; omitting it lets the backend serve its current run, which
    /// can race a run rollover between the list fetch and this call.
    pub fn fetch_county_series(&self, fips: &str, run: Option<&str>) -> Result<Vec<SeriesPoint>> {
        let fips = normalize_fips(fips);
        let mut url = Url::parse(&format!("{}/loss/county", self.base_url))
            .with_context(|| format!("invalid base url {:?}", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("fips", &fips);
            if let Some(run) = run {
                pairs.append_pair("run", run);
            }
        }

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: SeriesPayload = response.json().context("decode county series")?;
        parsed
            .series
            .into_iter()
            .map(|row| {
                Ok(SeriesPoint {
                    dt: parse_series_datetime(&row.dt)?,
                    el_total: row.el_total,
                })
            })
            .collect()
    }

    /// `GET /loss/top?n=N`: highest-loss tracts; diagnostic only.
    pub fn fetch_top(&self, n: usize) -> Result<TopResponse> {
        let mut url = Url::parse(&format!("{}/loss/top", self.base_url))
            .with_context(|| format!("invalid base url {:?}", self.base_url))?;
        url.query_pairs_mut().append_pair("n", &n.to_string());

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().context("decode top tracts")
    }

    /// `GET /loss/bands[?state=XX]`: per-tract p50/p90 bands; diagnostic
    /// only.
    pub fn fetch_bands(&self, state: Option<&str>) -> Result<BandsResponse> {
        let mut url = Url::parse(&format!("{}/loss/bands", self.base_url))
            .with_context(|| format!("invalid base url {:?}", self.base_url))?;
        if let Some(state) = state {
            url.query_pairs_mut()
                .append_pair("state", &state.to_ascii_uppercase());
        }

        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response.json().context("decode loss bands")
    }
}

/// Parse the wire timestamp: RFC 3339, or the backend's
/// `YYYY-MM-DD HH:MM:SS+00:00` form with a space separator.
fn parse_series_datetime(raw: &str) -> Result<OffsetDateTime> {
    let trimmed = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(parsed);
    }
    let spaced = trimmed.replacen(' ', "T", 1);
    OffsetDateTime::parse(&spaced, &Rfc3339)
        .with_context(|| format!("invalid series timestamp {raw:?}"))
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        anyhow!("request to {base_url} timed out ({error})")
    } else {
        anyhow!("cannot reach {base_url} -- check [api].base_url and that the loss API is up ({error})")
    }
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(error) = parsed.error
        && !error.is_empty()
    {
        return anyhow!("server error ({}): {}", status.as_u16(), error);
    }

    if body.len() < 100 && !body.contains('{') {
        return anyhow!("server error ({}): {}", status.as_u16(), body);
    }

    anyhow!("server returned {}", status.as_u16())
}

/// `/loss/top` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopResponse {
    #[serde(default)]
    pub run: Option<String>,
    pub top: Vec<TopEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopEntry {
    pub geoid: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub county: String,
    pub el_total_sum: f64,
}

/// `/loss/bands` payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BandsResponse {
    #[serde(default)]
    pub run: Option<String>,
    #[serde(default)]
    pub count: usize,
    pub bands: Vec<BandEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BandEntry {
    pub geoid: String,
    #[serde(default)]
    pub state: String,
    pub p50: f64,
    pub p90: f64,
}

// The payload also carries a `fips` echo of the query; serde drops it.
#[derive(Debug, Deserialize)]
struct SeriesPayload {
    series: Vec<SeriesRow>,
}

#[derive(Debug, Deserialize)]
struct SeriesRow {
    dt: String,
    el_total: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
}
