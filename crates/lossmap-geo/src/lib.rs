// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use geojson::{Feature, GeoJson, Value};
use lossmap_app::normalize_fips;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// The fixed region: Texas county FIPS codes start with `48`.
pub const REGION_FIPS_PREFIX: &str = "48";

/// One county's polygon outline(s). Only exterior rings are kept; interior
/// holes do not occur in county topology at the resolutions we draw.
#[derive(Debug, Clone, PartialEq)]
pub struct CountyShape {
    pub fips: String,
    pub name: String,
    pub rings: Vec<Vec<(f64, f64)>>,
}

/// The region's county polygons plus a memoized centroid cache.
///
/// Topology is static for the session, so centroids are computed once per
/// fips and never invalidated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CountyAtlas {
    shapes: Vec<CountyShape>,
    by_fips: HashMap<String, usize>,
    centroids: HashMap<String, (f64, f64)>,
}

impl CountyAtlas {
    pub fn from_geojson_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read county geojson {}", path.display()))?;
        Self::from_geojson_str(&raw)
            .with_context(|| format!("parse county geojson {}", path.display()))
    }

    /// Parse a GeoJSON FeatureCollection and keep the fixed region's
    /// counties. Features without a resolvable identifier or polygon
    /// geometry are skipped, not errors; topology files mix feature kinds.
    pub fn from_geojson_str(raw: &str) -> Result<Self> {
        let geojson: GeoJson = raw.parse().context("parse GeoJSON")?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            bail!("county topology must be a FeatureCollection");
        };

        let mut shapes = Vec::new();
        for feature in collection.features {
            let Some(fips) = feature_fips(&feature) else {
                continue;
            };
            if !fips.starts_with(REGION_FIPS_PREFIX) {
                continue;
            }
            let rings = feature
                .geometry
                .as_ref()
                .map(|geometry| exterior_rings(&geometry.value))
                .unwrap_or_default();
            if rings.is_empty() {
                continue;
            }
            shapes.push(CountyShape {
                fips,
                name: feature_name(&feature),
                rings,
            });
        }

        let by_fips = shapes
            .iter()
            .enumerate()
            .map(|(index, shape)| (shape.fips.clone(), index))
            .collect();

        Ok(Self {
            shapes,
            by_fips,
            centroids: HashMap::new(),
        })
    }

    pub fn shapes(&self) -> &[CountyShape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, fips: &str) -> Option<&CountyShape> {
        self.by_fips
            .get(&normalize_fips(fips))
            .map(|index| &self.shapes[*index])
    }

    /// Region bounding box as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for shape in &self.shapes {
            for ring in &shape.rings {
                for &(lon, lat) in ring {
                    bounds = Some(match bounds {
                        None => (lon, lat, lon, lat),
                        Some((min_lon, min_lat, max_lon, max_lat)) => (
                            min_lon.min(lon),
                            min_lat.min(lat),
                            max_lon.max(lon),
                            max_lat.max(lat),
                        ),
                    });
                }
            }
        }
        bounds
    }

    /// Centroid of a county's largest ring, memoized per fips.
    pub fn centroid(&mut self, fips: &str) -> Option<(f64, f64)> {
        let key = normalize_fips(fips);
        if let Some(cached) = self.centroids.get(&key) {
            return Some(*cached);
        }
        let index = *self.by_fips.get(&key)?;
        let centroid = shape_centroid(&self.shapes[index])?;
        self.centroids.insert(key, centroid);
        Some(centroid)
    }

    /// The first county whose outline contains the point, if any.
    pub fn hit_test(&self, lon: f64, lat: f64) -> Option<&CountyShape> {
        self.shapes.iter().find(|shape| {
            shape
                .rings
                .iter()
                .any(|ring| point_in_ring(ring, lon, lat))
        })
    }
}

fn feature_fips(feature: &Feature) -> Option<String> {
    let from_properties = feature.properties.as_ref().and_then(|properties| {
        ["fips", "FIPS", "geoid", "GEOID", "id"]
            .iter()
            .find_map(|key| properties.get(*key))
            .and_then(property_string)
    });
    let raw = from_properties.or_else(|| match &feature.id {
        Some(geojson::feature::Id::String(value)) => Some(value.clone()),
        Some(geojson::feature::Id::Number(value)) => Some(value.to_string()),
        None => None,
    })?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(normalize_fips(trimmed))
}

fn feature_name(feature: &Feature) -> String {
    feature
        .properties
        .as_ref()
        .and_then(|properties| {
            ["name", "NAME", "county", "NAMELSAD"]
                .iter()
                .find_map(|key| properties.get(*key))
                .and_then(property_string)
        })
        .unwrap_or_default()
}

fn property_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text.clone()),
        serde_json::Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Exterior rings of a polygonal geometry, as lon/lat pairs.
fn exterior_rings(value: &Value) -> Vec<Vec<(f64, f64)>> {
    match value {
        Value::Polygon(rings) => rings
            .first()
            .map(|exterior| vec![positions_to_ring(exterior)])
            .unwrap_or_default(),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .filter_map(|rings| rings.first())
            .map(|exterior| positions_to_ring(exterior))
            .collect(),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .flat_map(|geometry| exterior_rings(&geometry.value))
            .collect(),
        _ => Vec::new(),
    }
}

fn positions_to_ring(positions: &[Vec<f64>]) -> Vec<(f64, f64)> {
    positions
        .iter()
        .filter(|position| position.len() >= 2)
        .map(|position| (position[0], position[1]))
        .collect()
}

/// Centroid of the shape's largest-area ring; multi-part counties label on
/// their mainland rather than an averaged open-water point.
fn shape_centroid(shape: &CountyShape) -> Option<(f64, f64)> {
    shape
        .rings
        .iter()
        .filter(|ring| !ring.is_empty())
        .max_by(|a, b| ring_area(a).abs().total_cmp(&ring_area(b).abs()))
        .map(|ring| ring_centroid(ring))
}

fn ring_area(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let mut area2 = 0.0;
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        area2 += x0 * y1 - x1 * y0;
    }
    area2 / 2.0
}

fn ring_centroid(ring: &[(f64, f64)]) -> (f64, f64) {
    let n = ring.len();
    let area = ring_area(ring);
    if area.abs() < 1e-12 {
        // Degenerate ring; fall back to the vertex mean.
        let (sum_x, sum_y) = ring
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        let count = n.max(1) as f64;
        return (sum_x / count, sum_y / count);
    }

    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let (x0, y0) = ring[i];
        let (x1, y1) = ring[(i + 1) % n];
        let cross = x0 * y1 - x1 * y0;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    (cx / (6.0 * area), cy / (6.0 * area))
}

/// Even-odd ray cast.
fn point_in_ring(ring: &[(f64, f64)], lon: f64, lat: f64) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > lat) != (yj > lat) && lon < (xj - xi) * (lat - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
