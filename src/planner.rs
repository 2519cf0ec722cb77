//! Daily dispatch plan: candidates, continuity pre-pass, assignment and
//! follow-ups over one immutable input snapshot.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::calendar::{WorkdayCalendar, format_iso_date};
use crate::candidates::{WorkFilters, generate_candidates};
use crate::capacity::CapacitySettings;
use crate::follow_up::schedule_follow_ups;
use crate::geometry::PostcodeCentroids;
use crate::models::{DispatchPlan, Inspector, PlanTotals, WorkRecord};
use crate::preferred::build_preferred_map;
use crate::scoring::ScoringWeights;
use crate::solver::{LOAD_EPSILON, assign_candidates};

/// Everything a planning run reads. Deserializable, so a whole snapshot can be
/// loaded from a JSON or TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOptions {
    pub date: NaiveDate,
    #[serde(default)]
    pub works: Vec<WorkRecord>,
    #[serde(default)]
    pub inspectors: Vec<Inspector>,
    #[serde(default)]
    pub holidays: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub filters: WorkFilters,
    /// Continuity hints, `work id -> inspector id`.
    #[serde(default)]
    pub sticky_inspectors: BTreeMap<String, String>,
    #[serde(default)]
    pub unavailable_inspectors: BTreeSet<String>,
    #[serde(default)]
    pub capacity: CapacitySettings,
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub postcodes: PostcodeCentroids,
}

impl PlanOptions {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            works: Vec::new(),
            inspectors: Vec::new(),
            holidays: BTreeSet::new(),
            filters: WorkFilters::default(),
            sticky_inspectors: BTreeMap::new(),
            unavailable_inspectors: BTreeSet::new(),
            capacity: CapacitySettings::default(),
            weights: ScoringWeights::default(),
            postcodes: PostcodeCentroids::default(),
        }
    }
}

/// Inspectors that can work on `date`, in input order.
pub fn active_inspectors<'a>(
    inspectors: &'a [Inspector],
    unavailable: &BTreeSet<String>,
    date: NaiveDate,
) -> Vec<&'a Inspector> {
    inspectors
        .iter()
        .filter(|inspector| !unavailable.contains(&inspector.id) && inspector.is_active_on(date))
        .collect()
}

fn home_centroids(inspectors: &[&Inspector], postcodes: &PostcodeCentroids) -> HashMap<String, (f64, f64)> {
    inspectors
        .iter()
        .map(|inspector| (inspector.id.clone(), postcodes.zone_center(&inspector.primary_postcodes)))
        .collect()
}

pub fn build_dispatch_plan(options: &PlanOptions) -> DispatchPlan {
    let date = options.date;
    let span = info_span!("dispatch_plan", date = %format_iso_date(date));
    let _guard = span.enter();

    let calendar = WorkdayCalendar::new(options.holidays.iter().copied());
    let active = active_inspectors(&options.inspectors, &options.unavailable_inspectors, date);
    let empty_visits = active.iter().map(|i| (i.id.clone(), Vec::new())).collect();

    if !calendar.is_workday(date) {
        info!(active_inspectors = active.len(), "not a workday, no visits planned");
        return DispatchPlan {
            date,
            is_workday: false,
            visits_by_inspector: empty_visits,
            follow_ups_by_inspector: BTreeMap::new(),
            preferred_inspector_by_work_id: BTreeMap::new(),
            unassigned: Vec::new(),
            inspector_loads: BTreeMap::new(),
            totals: PlanTotals {
                active_inspectors: active.len(),
                ..Default::default()
            },
        };
    }

    let homes = home_centroids(&active, &options.postcodes);
    let candidates = generate_candidates(
        date,
        options.works.iter().filter(|work| options.filters.matches(work)),
        &calendar,
    );
    let preferred = build_preferred_map(
        candidates.iter().map(|candidate| &candidate.work),
        &active,
        &options.sticky_inspectors,
        &homes,
        &options.weights,
    );
    let outcome = assign_candidates(
        date,
        &candidates,
        &active,
        &options.capacity,
        &homes,
        &preferred,
        &options.weights,
    );

    let mut follow_up_hints = options.sticky_inspectors.clone();
    follow_up_hints.extend(preferred.iter().map(|(w, i)| (w.clone(), i.clone())));
    let follow_ups = schedule_follow_ups(
        date,
        options
            .works
            .iter()
            .filter(|work| options.filters.matches_ignoring_status(work)),
        &active,
        &calendar,
        &follow_up_hints,
        &homes,
    );

    let totals = PlanTotals {
        candidates: candidates.len(),
        mandatory_candidates: candidates.iter().filter(|c| c.mandatory).count(),
        assigned: outcome.visits_by_inspector.values().map(Vec::len).sum(),
        unassigned: outcome.unassigned.len(),
        unassigned_mandatory: outcome.unassigned.iter().filter(|u| u.candidate.mandatory).count(),
        follow_ups: follow_ups.values().map(Vec::len).sum(),
        active_inspectors: active.len(),
        overflow_inspectors: outcome
            .inspector_loads
            .values()
            .filter(|l| l.visits > 0 && l.load > f64::from(l.soft_daily_limit) + LOAD_EPSILON)
            .count(),
    };

    info!(
        candidates = totals.candidates,
        assigned = totals.assigned,
        unassigned = totals.unassigned,
        unassigned_mandatory = totals.unassigned_mandatory,
        follow_ups = totals.follow_ups,
        overflow_inspectors = totals.overflow_inspectors,
        "dispatch plan built"
    );

    DispatchPlan {
        date,
        is_workday: true,
        visits_by_inspector: outcome.visits_by_inspector,
        follow_ups_by_inspector: follow_ups,
        preferred_inspector_by_work_id: preferred,
        unassigned: outcome.unassigned,
        inspector_loads: outcome.inspector_loads,
        totals,
    }
}
