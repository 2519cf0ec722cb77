//! Seams to the collaborators that live outside the planning core.
//!
//! These are intentionally minimal. Applications implement them for their own
//! storage and routing backends.

use std::collections::BTreeMap;

/// Provides a travel-cost matrix for a set of locations.
///
/// The matrix is indexed by the provided location order. Units are up to the
/// provider (kilometres for haversine, seconds for OSRM); the router only
/// compares values. A matrix whose shape does not match `locations` is
/// treated as unusable.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> Vec<Vec<f64>>;
}

/// Persists the first inspector ever assigned to each work.
///
/// Read once before a run to seed sticky hints, written once after it.
pub trait ContinuityStore {
    /// Current `work id -> inspector id` hints.
    fn hints(&self) -> BTreeMap<String, String>;

    /// Record an assignment. Implementations keep the first value per work.
    fn record(&mut self, work_id: &str, inspector_id: &str);
}
