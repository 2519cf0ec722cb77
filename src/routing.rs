//! Visit ordering per inspector.
//!
//! Nearest-neighbour tour seeded from the visit closest to the inspector's
//! centroid. Only the order changes; visit content is never touched.

use std::collections::{BTreeMap, HashSet};

use rayon::prelude::*;
use tracing::warn;

use crate::geometry::{HaversineMatrix, centroid, haversine_km};
use crate::models::{Inspector, PlannedVisit};
use crate::traits::DistanceMatrixProvider;

/// Order each inspector's visits by great-circle distance.
pub fn propose_routes(
    inspectors: &[Inspector],
    visits_by_inspector: &BTreeMap<String, Vec<PlannedVisit>>,
) -> BTreeMap<String, Vec<PlannedVisit>> {
    propose_routes_with(inspectors, visits_by_inspector, &HaversineMatrix)
}

/// Order each inspector's visits using travel costs from `matrix_provider`.
///
/// Roster order decides which inspector is routed first; visits under ids
/// not in `inspectors` are routed too.
///
/// A provider that returns a matrix of the wrong shape is ignored for that
/// inspector and haversine distance is used instead.
pub fn propose_routes_with<M>(
    inspectors: &[Inspector],
    visits_by_inspector: &BTreeMap<String, Vec<PlannedVisit>>,
    matrix_provider: &M,
) -> BTreeMap<String, Vec<PlannedVisit>>
where
    M: DistanceMatrixProvider + Sync,
{
    let mut seen = HashSet::new();
    let mut work: Vec<(&str, &[PlannedVisit])> = inspectors
        .iter()
        .filter(|inspector| seen.insert(inspector.id.as_str()))
        .filter_map(|inspector| {
            visits_by_inspector
                .get(&inspector.id)
                .filter(|visits| !visits.is_empty())
                .map(|visits| (inspector.id.as_str(), visits.as_slice()))
        })
        .collect();

    // Visits filed under an id missing from the roster still get a route.
    for (inspector_id, visits) in visits_by_inspector {
        if visits.is_empty() || seen.contains(inspector_id.as_str()) {
            continue;
        }
        warn!(inspector_id = %inspector_id, visits = visits.len(), "routing visits for inspector missing from roster");
        work.push((inspector_id.as_str(), visits.as_slice()));
    }

    work.par_iter()
        .map(|(inspector_id, visits)| {
            let order = nearest_neighbor_order(inspector_id, visits, matrix_provider);
            let route = order.into_iter().map(|index| visits[index].clone()).collect();
            (inspector_id.to_string(), route)
        })
        .collect::<Vec<(String, Vec<PlannedVisit>)>>()
        .into_iter()
        .collect()
}

fn usable(matrix: &[Vec<f64>], n: usize) -> bool {
    matrix.len() == n && matrix.iter().all(|row| row.len() == n && row.iter().all(|v| v.is_finite()))
}

/// Indices into `visits` in tour order.
fn nearest_neighbor_order<M>(inspector_id: &str, visits: &[PlannedVisit], matrix_provider: &M) -> Vec<usize>
where
    M: DistanceMatrixProvider,
{
    let n = visits.len();
    if n <= 1 {
        return (0..n).collect();
    }

    let locations: Vec<(f64, f64)> = visits.iter().map(PlannedVisit::location).collect();
    let mut matrix = matrix_provider.matrix_for(&locations);
    if !usable(&matrix, n) {
        warn!(inspector_id, rows = matrix.len(), expected = n, "unusable distance matrix, using haversine");
        matrix = HaversineMatrix.matrix_for(&locations);
    }

    // Seed: the visit closest to the centroid, first one on ties.
    let center = centroid(locations.iter().copied()).unwrap_or(locations[0]);
    let mut current = 0;
    let mut best = f64::INFINITY;
    for (i, location) in locations.iter().enumerate() {
        let d = haversine_km(*location, center);
        if d < best {
            best = d;
            current = i;
        }
    }

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    visited[current] = true;
    order.push(current);

    while order.len() < n {
        let mut next: Option<(usize, f64)> = None;
        for i in 0..n {
            if visited[i] {
                continue;
            }
            let d = matrix[current][i];
            if next.is_none_or(|(_, best)| d < best) {
                next = Some((i, d));
            }
        }
        let Some((i, _)) = next else { break };
        visited[i] = true;
        order.push(i);
        current = i;
    }

    order
}

/// Flatten routes into `visit id -> 1-based position` within its route.
pub fn build_route_index_map(routes: &BTreeMap<String, Vec<PlannedVisit>>) -> BTreeMap<String, usize> {
    routes
        .values()
        .flat_map(|route| route.iter().enumerate().map(|(i, visit)| (visit.id.clone(), i + 1)))
        .collect()
}
