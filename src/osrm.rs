//! OSRM HTTP adapter for road-network travel-time matrices.
//!
//! Lets the route proposer order visits by driving time instead of
//! straight-line distance.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DispatchError;
use crate::traits::DistanceMatrixProvider;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, DispatchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn table_url(&self, locations: &[(f64, f64)]) -> String {
        let coords = locations
            .iter()
            .map(|(lat, lng)| format!("{:.6},{:.6}", lng, lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/table/v1/{}/{}?annotations=duration",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coords
        )
    }

    /// Travel-time matrix in seconds. Unreachable pairs come back as
    /// infinity.
    pub fn try_matrix(&self, locations: &[(f64, f64)]) -> Result<Vec<Vec<f64>>, DispatchError> {
        if locations.is_empty() {
            return Ok(Vec::new());
        }

        let body = self
            .client
            .get(self.table_url(locations))
            .send()?
            .error_for_status()?
            .json::<OsrmTableResponse>()?;

        let matrix: Vec<Vec<f64>> = body
            .durations
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(|value| value.unwrap_or(f64::INFINITY)).collect())
            .collect();

        if matrix.len() != locations.len() {
            return Err(DispatchError::MalformedMatrix {
                expected: locations.len(),
                actual: matrix.len(),
            });
        }
        Ok(matrix)
    }
}

impl DistanceMatrixProvider for OsrmClient {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<f64>> {
        match self.try_matrix(locations) {
            Ok(matrix) => matrix,
            Err(err) => {
                warn!(error = %err, base_url = %self.config.base_url, "OSRM table request failed");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmTableResponse {
    durations: Option<Vec<Vec<Option<f64>>>>,
}
