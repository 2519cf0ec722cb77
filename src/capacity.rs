//! Variable daily capacity.
//!
//! Capacity is measured in load units, not visit counts. A visit costs its
//! category weight divided by the inspector's experience factor, and the
//! running sum is compared against soft and hard daily limits.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::WorkRecord;

const LIMIT_RANGE: (u32, u32) = (1, 20);
const FIXED_LOAD_RANGE: (f64, f64) = (0.0, 12.0);
const EXPERIENCE_RANGE: (f64, f64) = (0.5, 1.5);
const WEIGHT_RANGE: (f64, f64) = (0.25, 4.0);

const COMPLEX_MARKERS: [&str; 3] = ["categorie 1", "categorie 2", "dringend"];

/// Global capacity configuration plus per-inspector overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapacitySettings {
    pub soft_daily_limit: u32,
    pub hard_daily_limit: u32,
    pub standard_visit_weight: f64,
    pub complex_visit_weight: f64,
    pub overrides: BTreeMap<String, CapacityOverride>,
}

impl Default for CapacitySettings {
    fn default() -> Self {
        Self {
            soft_daily_limit: 6,
            hard_daily_limit: 8,
            standard_visit_weight: 1.0,
            complex_visit_weight: 1.5,
            overrides: BTreeMap::new(),
        }
    }
}

/// Per-inspector override. `None` keeps the global value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapacityOverride {
    pub soft_daily_limit: Option<u32>,
    pub hard_daily_limit: Option<u32>,
    pub fixed_daily_load: Option<f64>,
    pub experience_factor: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorCapacityProfile {
    pub soft_daily_limit: u32,
    pub hard_daily_limit: u32,
    pub fixed_daily_load: f64,
    pub experience_factor: f64,
    pub standard_visit_weight: f64,
    pub complex_visit_weight: f64,
}

fn clamp_limit(value: u32) -> u32 {
    value.clamp(LIMIT_RANGE.0, LIMIT_RANGE.1)
}

/// Clamp into `range`; non-finite input resolves to `fallback`.
fn clamp_finite(value: f64, range: (f64, f64), fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(range.0, range.1)
    } else {
        fallback
    }
}

/// Round a load to two decimals, the precision loads are compared at.
pub fn round_load(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn resolve_capacity_profile(settings: &CapacitySettings, inspector_id: &str) -> InspectorCapacityProfile {
    let global_soft = clamp_limit(settings.soft_daily_limit);
    let global_hard = clamp_limit(settings.hard_daily_limit).max(global_soft);
    let overrides = settings.overrides.get(inspector_id).cloned().unwrap_or_default();

    let soft_daily_limit = overrides.soft_daily_limit.map_or(global_soft, clamp_limit);
    let hard_daily_limit = overrides
        .hard_daily_limit
        .map_or(global_hard, clamp_limit)
        .max(soft_daily_limit);

    InspectorCapacityProfile {
        soft_daily_limit,
        hard_daily_limit,
        fixed_daily_load: overrides
            .fixed_daily_load
            .map_or(0.0, |v| round_load(clamp_finite(v, FIXED_LOAD_RANGE, 0.0))),
        experience_factor: overrides
            .experience_factor
            .map_or(1.0, |v| clamp_finite(v, EXPERIENCE_RANGE, 1.0)),
        standard_visit_weight: clamp_finite(settings.standard_visit_weight, WEIGHT_RANGE, 1.0),
        complex_visit_weight: clamp_finite(settings.complex_visit_weight, WEIGHT_RANGE, 1.5),
    }
}

/// Categories 1 and 2 and urgent works are complex.
pub fn is_complex_category(category: Option<&str>) -> bool {
    category.is_some_and(|category| {
        let category = category.to_lowercase();
        COMPLEX_MARKERS.iter().any(|marker| category.contains(marker))
    })
}

/// Capacity cost of visiting `work` for an inspector with `profile`.
pub fn effective_visit_load(profile: &InspectorCapacityProfile, work: &WorkRecord) -> f64 {
    let base = if is_complex_category(work.category.as_deref()) {
        profile.complex_visit_weight
    } else {
        profile.standard_visit_weight
    };
    round_load((base / profile.experience_factor).clamp(WEIGHT_RANGE.0, WEIGHT_RANGE.1))
}
