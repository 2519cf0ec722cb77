//! Great-circle distance, centroids and postcode locations.
//!
//! Haversine distance ignores roads but is always available, which is all
//! scoring needs. Routing can swap in a road-network provider.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::normalize_postcode;
use crate::traits::DistanceMatrixProvider;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Amsterdam city centre.
pub const DEFAULT_CENTER: (f64, f64) = (52.3676, 4.9041);

/// Haversine distance between two (lat, lng) points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Arithmetic mean of the points, `None` for an empty input.
pub fn centroid<I>(points: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let (mut lat, mut lng, mut count) = (0.0, 0.0, 0usize);
    for (p_lat, p_lng) in points {
        lat += p_lat;
        lng += p_lng;
        count += 1;
    }
    (count > 0).then(|| (lat / count as f64, lng / count as f64))
}

/// Postcode to centroid lookup with a fallback centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostcodeCentroids {
    centroids: BTreeMap<String, (f64, f64)>,
    fallback: (f64, f64),
}

impl Default for PostcodeCentroids {
    fn default() -> Self {
        Self {
            centroids: BTreeMap::new(),
            fallback: DEFAULT_CENTER,
        }
    }
}

impl PostcodeCentroids {
    pub fn new(fallback: (f64, f64)) -> Self {
        Self {
            centroids: BTreeMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, postcode: &str, location: (f64, f64)) -> Self {
        self.insert(postcode, location);
        self
    }

    pub fn insert(&mut self, postcode: &str, location: (f64, f64)) {
        self.centroids.insert(normalize_postcode(postcode), location);
    }

    pub fn fallback(&self) -> (f64, f64) {
        self.fallback
    }

    /// Exact match first, then the four-digit area, then `None`.
    pub fn get(&self, postcode: &str) -> Option<(f64, f64)> {
        let key = normalize_postcode(postcode);
        if let Some(location) = self.centroids.get(&key) {
            return Some(*location);
        }
        let area: String = key.chars().take(4).collect();
        self.centroids.get(&area).copied()
    }

    pub fn lookup(&self, postcode: &str) -> (f64, f64) {
        self.get(postcode).unwrap_or(self.fallback)
    }

    /// Mean of the known centroids of `postcodes`, or the fallback centre.
    pub fn zone_center<'a, I>(&self, postcodes: I) -> (f64, f64)
    where
        I: IntoIterator<Item = &'a String>,
    {
        centroid(postcodes.into_iter().filter_map(|p| self.get(p))).unwrap_or(self.fallback)
    }
}

/// Haversine-based distance matrix provider, values in kilometers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<f64>> {
        let n = locations.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    matrix[i][j] = haversine_km(*from, *to);
                }
            }
        }

        matrix
    }
}
