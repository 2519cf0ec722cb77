//! Inspector/work affinity score shared by the preferred-map pre-pass and the
//! assignment engine.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::geometry::haversine_km;
use crate::models::{Inspector, WorkRecord, normalize_postcode};

/// Scoring constants. Defaults are the production tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoringWeights {
    pub primary_match: f64,
    pub backup_match: f64,
    pub no_zone_match: f64,
    /// Bonus for the preferred (continuity) inspector.
    pub continuity_bonus: f64,
    /// Inspector already visits this postcode today.
    pub same_postcode_bonus: f64,
    /// Applied to out-of-zone inspectors without a visit in this postcode.
    pub fragmentation_penalty: f64,
    pub primary_distance_weight: f64,
    pub backup_distance_weight: f64,
    pub non_zone_distance_weight: f64,
    pub load_penalty: f64,
    /// Extra penalty for loading an inspector with no claim on the work.
    pub unrelated_load_penalty: f64,
    pub mandatory_bonus: f64,
    /// Per unit of pre-pass load in the preferred-map builder.
    pub preferred_balance_penalty: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            primary_match: 180.0,
            backup_match: 110.0,
            no_zone_match: -120.0,
            continuity_bonus: 340.0,
            same_postcode_bonus: 42.0,
            fragmentation_penalty: 62.0,
            primary_distance_weight: 3.0,
            backup_distance_weight: 5.0,
            non_zone_distance_weight: 8.5,
            load_penalty: 18.0,
            unrelated_load_penalty: 55.0,
            mandatory_bonus: 14.0,
            preferred_balance_penalty: 2.0,
        }
    }
}

/// Everything the score depends on besides the work and the inspector.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    /// Where the inspector currently "is": running mean of today's visits,
    /// or the centre of their primary zone.
    pub centroid: (f64, f64),
    pub current_load: f64,
    pub preferred_id: Option<&'a str>,
    /// Normalized postcodes the inspector already visits today.
    pub assigned_postcodes: Option<&'a HashSet<String>>,
}

pub fn score(work: &WorkRecord, inspector: &Inspector, input: ScoreInput<'_>, weights: &ScoringWeights) -> f64 {
    let primary = inspector.is_primary_for(&work.postcode);
    let backup = !primary && inspector.is_backup_for(&work.postcode);
    let preferred = input.preferred_id == Some(inspector.id.as_str());

    let (mut total, distance_weight) = if primary {
        (weights.primary_match, weights.primary_distance_weight)
    } else if backup {
        (weights.backup_match, weights.backup_distance_weight)
    } else {
        (weights.no_zone_match, weights.non_zone_distance_weight)
    };

    if preferred {
        total += weights.continuity_bonus;
    }

    let postcode = normalize_postcode(&work.postcode);
    if input.assigned_postcodes.is_some_and(|set| set.contains(&postcode)) {
        total += weights.same_postcode_bonus;
    } else if !primary && !backup {
        total -= weights.fragmentation_penalty;
    }

    total -= haversine_km(work.location, input.centroid) * distance_weight;

    total -= input.current_load * weights.load_penalty;
    if input.current_load > 0.0 && !primary && !backup && !preferred {
        total -= weights.unrelated_load_penalty;
    }

    total
}
