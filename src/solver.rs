//! Assignment engine (greedy, tiered).
//!
//! Candidates are processed in generator order. Each one goes to the
//! best-scoring inspector of the first pool tier that has room:
//!
//! 1. zone (primary or backup) within the soft limit
//! 2. reserve within the soft limit
//! 3. zone up to the hard limit
//! 4. reserve up to the hard limit
//! 5. emergency, mandatory candidates only, soft then hard
//!
//! The emergency pool only exists when no active inspector is flagged reserve.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::capacity::{
    CapacitySettings, InspectorCapacityProfile, effective_visit_load, resolve_capacity_profile, round_load,
};
use crate::geometry::DEFAULT_CENTER;
use crate::models::{
    Candidate, Inspector, InspectorLoad, PlannedVisit, UNASSIGNED_INSPECTOR_ID, UnassignedReason, UnassignedVisit,
    normalize_postcode,
};
use crate::scoring::{ScoreInput, ScoringWeights, score};

/// Tolerance for comparing two-decimal loads against a limit.
pub const LOAD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct AssignmentOutcome {
    /// One entry per active inspector, possibly empty.
    pub visits_by_inspector: BTreeMap<String, Vec<PlannedVisit>>,
    pub unassigned: Vec<UnassignedVisit>,
    pub inspector_loads: BTreeMap<String, InspectorLoad>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Zone,
    Reserve,
    Emergency,
}

/// Per-run mutable state, keyed by inspector id. Lives for one call only.
struct AssignmentContext<'a> {
    profiles: HashMap<&'a str, InspectorCapacityProfile>,
    loads: HashMap<&'a str, f64>,
    location_sums: HashMap<&'a str, (f64, f64, usize)>,
    postcodes: HashMap<&'a str, HashSet<String>>,
    home_centroids: &'a HashMap<String, (f64, f64)>,
}

impl<'a> AssignmentContext<'a> {
    fn new(
        inspectors: &[&'a Inspector],
        settings: &CapacitySettings,
        home_centroids: &'a HashMap<String, (f64, f64)>,
    ) -> Self {
        let mut profiles = HashMap::new();
        let mut loads = HashMap::new();
        for inspector in inspectors {
            let profile = resolve_capacity_profile(settings, &inspector.id);
            loads.insert(inspector.id.as_str(), profile.fixed_daily_load);
            profiles.insert(inspector.id.as_str(), profile);
        }

        Self {
            profiles,
            loads,
            location_sums: HashMap::new(),
            postcodes: HashMap::new(),
            home_centroids,
        }
    }

    fn profile(&self, inspector_id: &str) -> InspectorCapacityProfile {
        self.profiles[inspector_id]
    }

    fn load(&self, inspector_id: &str) -> f64 {
        self.loads.get(inspector_id).copied().unwrap_or(0.0)
    }

    /// Mean of today's visit locations, else the inspector's zone centre.
    fn centroid(&self, inspector_id: &str) -> (f64, f64) {
        match self.location_sums.get(inspector_id) {
            Some(&(lat, lng, count)) if count > 0 => (lat / count as f64, lng / count as f64),
            _ => self
                .home_centroids
                .get(inspector_id)
                .copied()
                .unwrap_or(DEFAULT_CENTER),
        }
    }

    fn record(&mut self, inspector: &'a Inspector, visit_load: f64, location: (f64, f64), postcode: &str) {
        let id = inspector.id.as_str();
        let load = self.loads.entry(id).or_default();
        *load = round_load(*load + visit_load);

        let sums = self.location_sums.entry(id).or_insert((0.0, 0.0, 0));
        sums.0 += location.0;
        sums.1 += location.1;
        sums.2 += 1;

        self.postcodes.entry(id).or_default().insert(normalize_postcode(postcode));
    }
}

struct Pick<'a> {
    inspector: &'a Inspector,
    score: f64,
    load: f64,
}

/// Whether `visit_load` fits on top of `load`. Without overflow the inspector
/// must still be under the soft limit; the hard limit is never exceeded.
fn fits(load: f64, visit_load: f64, profile: &InspectorCapacityProfile, allow_overflow: bool) -> bool {
    let limit = if allow_overflow {
        profile.hard_daily_limit
    } else {
        profile.soft_daily_limit
    };
    load < f64::from(limit) - LOAD_EPSILON && load + visit_load <= f64::from(profile.hard_daily_limit) + LOAD_EPSILON
}

fn pick_from_pool<'a>(
    candidate: &Candidate,
    pool: &[&'a Inspector],
    allow_overflow: bool,
    preferred_id: Option<&str>,
    context: &AssignmentContext<'a>,
    weights: &ScoringWeights,
) -> Option<Pick<'a>> {
    let mut best: Option<Pick<'a>> = None;

    for &inspector in pool {
        let profile = context.profile(&inspector.id);
        let load = context.load(&inspector.id);
        let visit_load = effective_visit_load(&profile, &candidate.work);
        if !fits(load, visit_load, &profile, allow_overflow) {
            continue;
        }

        let input = ScoreInput {
            centroid: context.centroid(&inspector.id),
            current_load: load,
            preferred_id,
            assigned_postcodes: context.postcodes.get(inspector.id.as_str()),
        };
        let mut value = score(&candidate.work, inspector, input, weights);
        if candidate.mandatory {
            value += weights.mandatory_bonus;
        }

        if best.as_ref().is_none_or(|b| value > b.score) {
            best = Some(Pick {
                inspector,
                score: value,
                load: visit_load,
            });
        }
    }

    best
}

/// Assign `candidates` (already in processing order) to `inspectors` (active
/// roster, in input order).
pub fn assign_candidates(
    date: NaiveDate,
    candidates: &[Candidate],
    inspectors: &[&Inspector],
    settings: &CapacitySettings,
    home_centroids: &HashMap<String, (f64, f64)>,
    preferred: &BTreeMap<String, String>,
    weights: &ScoringWeights,
) -> AssignmentOutcome {
    let mut context = AssignmentContext::new(inspectors, settings, home_centroids);
    let mut outcome = AssignmentOutcome {
        visits_by_inspector: inspectors
            .iter()
            .map(|inspector| (inspector.id.clone(), Vec::new()))
            .collect(),
        ..Default::default()
    };
    let has_reserve_tier = inspectors.iter().any(|inspector| inspector.is_reserve);

    for candidate in candidates {
        let postcode = &candidate.work.postcode;
        let zone: Vec<&Inspector> = inspectors
            .iter()
            .copied()
            .filter(|i| i.is_primary_for(postcode) || i.is_backup_for(postcode))
            .collect();
        let in_zone = |i: &Inspector| zone.iter().any(|z| z.id == i.id);
        let reserve: Vec<&Inspector> = inspectors
            .iter()
            .copied()
            .filter(|i| i.is_reserve && !in_zone(*i))
            .collect();
        let emergency: Vec<&Inspector> = if has_reserve_tier {
            Vec::new()
        } else {
            inspectors.iter().copied().filter(|i| !in_zone(*i)).collect()
        };

        let mut attempts = vec![
            (Tier::Zone, &zone, false),
            (Tier::Reserve, &reserve, false),
            (Tier::Zone, &zone, true),
            (Tier::Reserve, &reserve, true),
        ];
        if candidate.mandatory {
            attempts.push((Tier::Emergency, &emergency, false));
            attempts.push((Tier::Emergency, &emergency, true));
        }

        let preferred_id = preferred.get(&candidate.work.id).map(String::as_str);
        let picked = attempts.iter().find_map(|(tier, pool, allow_overflow)| {
            pick_from_pool(candidate, pool, *allow_overflow, preferred_id, &context, weights)
                .map(|pick| (*tier, *allow_overflow, pick))
        });

        let visit_id = candidate.visit_id(date);
        match picked {
            Some((tier, overflow, pick)) => {
                debug!(
                    visit_id = %visit_id,
                    inspector_id = %pick.inspector.id,
                    ?tier,
                    overflow,
                    score = pick.score,
                    load = pick.load,
                    "assigned visit"
                );
                context.record(pick.inspector, pick.load, candidate.work.location, postcode);
                let visit = PlannedVisit {
                    id: visit_id,
                    candidate: candidate.clone(),
                    inspector_id: pick.inspector.id.clone(),
                    inspector_initials: pick.inspector.initials.clone(),
                    inspector_name: pick.inspector.name.clone(),
                    inspector_color: pick.inspector.color.clone(),
                    role: pick.inspector.role_for(postcode),
                    score: pick.score,
                    load: pick.load,
                };
                outcome
                    .visits_by_inspector
                    .entry(visit.inspector_id.clone())
                    .or_default()
                    .push(visit);
            }
            None => {
                let reason = if inspectors.is_empty() {
                    UnassignedReason::NoActiveInspectors
                } else if attempts.iter().all(|(_, pool, _)| pool.is_empty()) {
                    UnassignedReason::NoEligibleInspector
                } else {
                    UnassignedReason::CapacityExhausted
                };
                if candidate.mandatory {
                    warn!(visit_id = %visit_id, ?reason, "mandatory visit needs manual assignment");
                } else {
                    debug!(visit_id = %visit_id, ?reason, "optional visit left unassigned");
                }
                outcome.unassigned.push(UnassignedVisit {
                    id: format!("{visit_id}-unassigned"),
                    candidate: candidate.clone(),
                    inspector_id: UNASSIGNED_INSPECTOR_ID.to_string(),
                    reason,
                });
            }
        }
    }

    for inspector in inspectors {
        let profile = context.profile(&inspector.id);
        outcome.inspector_loads.insert(
            inspector.id.clone(),
            InspectorLoad {
                load: context.load(&inspector.id),
                soft_daily_limit: profile.soft_daily_limit,
                hard_daily_limit: profile.hard_daily_limit,
                visits: outcome.visits_by_inspector.get(&inspector.id).map_or(0, Vec::len),
            },
        );
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::CapacityOverride;
    use crate::models::{AssignmentRole, LocationSource, VisitType, WorkRecord};

    const HERE: (f64, f64) = (52.37, 4.89);

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 4).unwrap()
    }

    fn candidate(id: &str, postcode: &str, mandatory: bool) -> Candidate {
        Candidate {
            work: WorkRecord {
                id: id.into(),
                dossier_id: String::new(),
                status: String::new(),
                start_date: day(),
                end_date: day(),
                postcode: postcode.into(),
                district: String::new(),
                street: String::new(),
                location: HERE,
                location_source: LocationSource::Exact,
                owner: String::new(),
                category: None,
                source: None,
                permit_status: None,
            },
            visit_type: if mandatory { VisitType::Start } else { VisitType::Tussen },
            mandatory,
            priority: if mandatory { 120 } else { 80 },
        }
    }

    fn inspector(id: &str, primary: &[&str], backup: &[&str], reserve: bool) -> Inspector {
        Inspector {
            id: id.into(),
            initials: id.to_uppercase(),
            name: id.into(),
            color: String::new(),
            primary_postcodes: primary.iter().map(|p| p.to_string()).collect(),
            backup_postcodes: backup.iter().map(|p| p.to_string()).collect(),
            is_reserve: reserve,
            active_from: None,
            active_until: None,
        }
    }

    fn homes(inspectors: &[&Inspector]) -> HashMap<String, (f64, f64)> {
        inspectors.iter().map(|i| (i.id.clone(), HERE)).collect()
    }

    fn run(candidates: &[Candidate], inspectors: &[&Inspector], settings: &CapacitySettings) -> AssignmentOutcome {
        assign_candidates(
            day(),
            candidates,
            inspectors,
            settings,
            &homes(inspectors),
            &BTreeMap::new(),
            &ScoringWeights::default(),
        )
    }

    fn limits(soft: u32, hard: u32) -> CapacitySettings {
        CapacitySettings {
            soft_daily_limit: soft,
            hard_daily_limit: hard,
            ..Default::default()
        }
    }

    #[test]
    fn test_fits_respects_soft_and_hard() {
        let profile = resolve_capacity_profile(&limits(2, 3), "x");
        assert!(fits(1.5, 1.0, &profile, false));
        assert!(!fits(2.0, 1.0, &profile, false));
        assert!(fits(2.0, 1.0, &profile, true));
        assert!(!fits(2.5, 1.0, &profile, true), "would exceed hard limit");
        assert!(!fits(3.0, 0.25, &profile, true));
    }

    #[test]
    fn test_dedicated_assignment() {
        let a = inspector("a", &["1011"], &[], false);
        let outcome = run(&[candidate("w1", "1011AB", true)], &[&a], &CapacitySettings::default());
        let visits = &outcome.visits_by_inspector["a"];
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].role, AssignmentRole::Dedicated);
        assert_eq!(visits[0].score, 194.0);
        assert!(outcome.unassigned.is_empty());
    }

    #[test]
    fn test_reserve_before_zone_overflow() {
        let a = inspector("a", &["1011"], &[], false);
        let r = inspector("r", &[], &[], true);
        let candidates: Vec<_> = (0..3).map(|i| candidate(&format!("w{i}"), "1011AB", true)).collect();
        let outcome = run(&candidates, &[&a, &r], &limits(2, 4));
        assert_eq!(outcome.visits_by_inspector["a"].len(), 2);
        assert_eq!(outcome.visits_by_inspector["r"].len(), 1);
        assert_eq!(outcome.visits_by_inspector["r"][0].role, AssignmentRole::Reserve);
    }

    #[test]
    fn test_fractional_loads_stop_exactly_at_soft_limit() {
        let a = inspector("a", &["1011"], &[], false);
        let r = inspector("r", &[], &[], true);
        let settings = CapacitySettings {
            overrides: BTreeMap::from([(
                "a".to_string(),
                CapacityOverride {
                    experience_factor: Some(1.25),
                    ..Default::default()
                },
            )]),
            ..limits(8, 10)
        };
        let candidates: Vec<_> = (0..11).map(|i| candidate(&format!("w{i}"), "1011AB", true)).collect();
        let outcome = run(&candidates, &[&a, &r], &settings);

        assert_eq!(outcome.visits_by_inspector["a"].len(), 10);
        assert_eq!(outcome.inspector_loads["a"].load, 8.0);
        assert_eq!(outcome.visits_by_inspector["r"].len(), 1);
        assert_eq!(outcome.visits_by_inspector["r"][0].candidate.work.id, "w10");
    }

    #[test]
    fn test_reserve_overflow_after_zone_reaches_hard() {
        let a = inspector("a", &["1011"], &[], false);
        let r = inspector("r", &[], &[], true);
        let candidates: Vec<_> = (0..5).map(|i| candidate(&format!("w{i}"), "1011AB", true)).collect();
        let outcome = run(&candidates, &[&a, &r], &limits(1, 2));

        let work_ids = |id: &str| -> Vec<String> {
            outcome.visits_by_inspector[id]
                .iter()
                .map(|v| v.candidate.work.id.clone())
                .collect()
        };
        // zone soft, reserve soft, zone hard, reserve hard, then nothing left.
        assert_eq!(work_ids("a"), vec!["w0", "w2"]);
        assert_eq!(work_ids("r"), vec!["w1", "w3"]);
        assert_eq!(outcome.unassigned.len(), 1);
        assert_eq!(outcome.unassigned[0].candidate.work.id, "w4");
        assert_eq!(outcome.unassigned[0].reason, UnassignedReason::CapacityExhausted);
    }

    #[test]
    fn test_emergency_overflow_after_emergency_soft() {
        let z = inspector("z", &["1011"], &[], false);
        let e = inspector("e", &["2000"], &[], false);
        let settings = CapacitySettings {
            overrides: BTreeMap::from([(
                "z".to_string(),
                CapacityOverride {
                    soft_daily_limit: Some(1),
                    hard_daily_limit: Some(1),
                    ..Default::default()
                },
            )]),
            ..limits(1, 2)
        };
        let candidates: Vec<_> = (0..4).map(|i| candidate(&format!("w{i}"), "1011AB", true)).collect();
        let outcome = run(&candidates, &[&z, &e], &settings);

        assert_eq!(outcome.visits_by_inspector["z"].len(), 1);
        let emergency = &outcome.visits_by_inspector["e"];
        assert_eq!(emergency.len(), 2);
        assert_eq!(emergency[1].candidate.work.id, "w2");
        assert!(emergency.iter().all(|v| v.role == AssignmentRole::Reserve));
        assert_eq!(outcome.inspector_loads["e"].load, 2.0);
        assert_eq!(outcome.unassigned.len(), 1);
        assert_eq!(outcome.unassigned[0].candidate.work.id, "w3");
    }

    #[test]
    fn test_optional_visit_never_uses_emergency_pool() {
        let a = inspector("a", &["2000"], &[], false);
        let outcome = run(&[candidate("w1", "1011AB", false)], &[&a], &CapacitySettings::default());
        assert!(outcome.visits_by_inspector["a"].is_empty());
        assert_eq!(outcome.unassigned.len(), 1);
        assert_eq!(outcome.unassigned[0].reason, UnassignedReason::NoEligibleInspector);
        assert_eq!(outcome.unassigned[0].inspector_id, UNASSIGNED_INSPECTOR_ID);
    }

    #[test]
    fn test_mandatory_visit_uses_emergency_pool() {
        let a = inspector("a", &["2000"], &[], false);
        let outcome = run(&[candidate("w1", "1011AB", true)], &[&a], &CapacitySettings::default());
        assert_eq!(outcome.visits_by_inspector["a"].len(), 1);
        assert_eq!(outcome.visits_by_inspector["a"][0].role, AssignmentRole::Reserve);
    }

    #[test]
    fn test_explicit_reserve_disables_emergency_pool() {
        let a = inspector("a", &["2000"], &[], false);
        let r = inspector("r", &[], &[], true);
        let settings = CapacitySettings {
            overrides: BTreeMap::from([(
                "r".to_string(),
                CapacityOverride {
                    soft_daily_limit: Some(1),
                    hard_daily_limit: Some(1),
                    ..Default::default()
                },
            )]),
            ..Default::default()
        };
        let candidates = vec![candidate("w1", "1011AB", true), candidate("w2", "1011AB", true)];
        let outcome = run(&candidates, &[&a, &r], &settings);
        assert_eq!(outcome.visits_by_inspector["r"].len(), 1);
        assert!(outcome.visits_by_inspector["a"].is_empty());
        assert_eq!(outcome.unassigned.len(), 1);
        assert_eq!(outcome.unassigned[0].reason, UnassignedReason::CapacityExhausted);
    }

    #[test]
    fn test_fixed_daily_load_counts_against_limits() {
        let a = inspector("a", &["1011"], &[], false);
        let settings = CapacitySettings {
            soft_daily_limit: 2,
            hard_daily_limit: 2,
            overrides: BTreeMap::from([(
                "a".to_string(),
                CapacityOverride {
                    fixed_daily_load: Some(1.0),
                    ..Default::default()
                },
            )]),
            ..Default::default()
        };
        let candidates = vec![candidate("w1", "1011AB", true), candidate("w2", "1011AB", true)];
        let outcome = run(&candidates, &[&a], &settings);
        assert_eq!(outcome.visits_by_inspector["a"].len(), 1);
        assert_eq!(outcome.inspector_loads["a"].load, 2.0);
    }

    #[test]
    fn test_first_maximum_wins_ties() {
        let a = inspector("a", &["1011"], &[], false);
        let b = inspector("b", &["1011"], &[], false);
        let outcome = run(&[candidate("w1", "1011AB", true)], &[&b, &a], &CapacitySettings::default());
        assert_eq!(outcome.visits_by_inspector["b"].len(), 1);
    }

    #[test]
    fn test_no_active_inspectors() {
        let outcome = run(&[candidate("w1", "1011AB", true)], &[], &CapacitySettings::default());
        assert!(outcome.visits_by_inspector.is_empty());
        assert_eq!(outcome.unassigned[0].reason, UnassignedReason::NoActiveInspectors);
    }

    #[test]
    fn test_clustering_keeps_postcode_together() {
        // After the first visit, the backup inspector gains the same-postcode
        // bonus and beats an equal backup inspector for the second.
        let b1 = inspector("b1", &[], &["1011"], false);
        let b2 = inspector("b2", &[], &["1011"], false);
        let candidates = vec![candidate("w1", "1011AB", true), candidate("w2", "1011AB", true)];
        let outcome = run(&candidates, &[&b1, &b2], &CapacitySettings::default());
        assert_eq!(outcome.visits_by_inspector["b1"].len(), 2);
    }
}
