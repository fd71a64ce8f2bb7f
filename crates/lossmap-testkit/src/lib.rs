// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use lossmap_app::{CountiesResponse, CountySummary, SeriesPoint};
use serde_json::json;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

/// A stable cross-section of Texas counties used by demo mode and tests.
pub const TEXAS_COUNTIES: [(&str, &str); 24] = [
    ("48201", "Harris"),
    ("48113", "Dallas"),
    ("48439", "Tarrant"),
    ("48029", "Bexar"),
    ("48453", "Travis"),
    ("48085", "Collin"),
    ("48121", "Denton"),
    ("48215", "Hidalgo"),
    ("48141", "El Paso"),
    ("48157", "Fort Bend"),
    ("48339", "Montgomery"),
    ("48491", "Williamson"),
    ("48061", "Cameron"),
    ("48355", "Nueces"),
    ("48039", "Brazoria"),
    ("48167", "Galveston"),
    ("48027", "Bell"),
    ("48303", "Lubbock"),
    ("48245", "Jefferson"),
    ("48309", "McLennan"),
    ("48423", "Smith"),
    ("48479", "Webb"),
    ("48041", "Brazos"),
    ("48135", "Ector"),
];

/// The run identifier every fixture payload is pinned to.
pub fn fixture_run() -> &'static str {
    "run_dt=20260301T000000Z"
}

/// First forecast step of every fixture series.
pub fn fixture_series_start() -> OffsetDateTime {
    datetime!(2026-03-01 00:00 UTC)
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic loss-data generator: same seed, same payloads.
#[derive(Debug, Clone)]
pub struct LossFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl LossFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    /// A full county list, one summary per fixture county, pinned to
    /// [`fixture_run`].
    pub fn counties_response(&mut self) -> CountiesResponse {
        let counties = TEXAS_COUNTIES
            .iter()
            .map(|(fips, name)| self.county_summary(fips, name))
            .collect();
        CountiesResponse {
            run: Some(fixture_run().to_owned()),
            counties,
        }
    }

    pub fn county_summary(&mut self, fips: &str, name: &str) -> CountySummary {
        let el_total_sum = 50_000.0 + self.rng.int_n(4_000_000) as f64;
        CountySummary {
            fips: fips.to_owned(),
            name: name.to_owned(),
            state: "TX".to_owned(),
            p50: el_total_sum / 80.0,
            p90: el_total_sum / 12.0,
            el_total_sum,
        }
    }

    /// A 3-hourly series for one county. Keyed off the fips so the shape of
    /// a county's series does not depend on fetch order.
    pub fn series(&self, fips: &str, steps: usize) -> Vec<SeriesPoint> {
        let mut rng = DeterministicRng::new(self.seed ^ fips_key(fips));
        let start = fixture_series_start();
        (0..steps)
            .map(|index| SeriesPoint {
                dt: start + Duration::hours(3 * index as i64),
                el_total: rng.int_n(90_000) as f64,
            })
            .collect()
    }
}

fn fips_key(fips: &str) -> u64 {
    // FNV-1a; only needs to be stable, not strong.
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in fips.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// A synthetic FeatureCollection placing each fixture county on a square
/// grid over the Texas bounding box. Real topology is not needed to
/// exercise joins, shading, centroids, and hit testing.
pub fn county_grid_geojson() -> String {
    const COLUMNS: usize = 6;
    const CELL: f64 = 1.2;
    const ORIGIN: (f64, f64) = (-104.0, 26.0);

    let features: Vec<serde_json::Value> = TEXAS_COUNTIES
        .iter()
        .enumerate()
        .map(|(index, (fips, name))| {
            let column = (index % COLUMNS) as f64;
            let row = (index / COLUMNS) as f64;
            let west = ORIGIN.0 + column * CELL;
            let south = ORIGIN.1 + row * CELL;
            let east = west + CELL * 0.9;
            let north = south + CELL * 0.9;
            json!({
                "type": "Feature",
                "properties": {"GEOID": fips, "NAME": name},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [west, south],
                        [east, south],
                        [east, north],
                        [west, north],
                        [west, south]
                    ]]
                }
            })
        })
        .collect();

    json!({"type": "FeatureCollection", "features": features}).to_string()
}
