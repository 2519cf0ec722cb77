//! Continuity pre-pass: one preferred inspector per candidate work.
//!
//! The map only feeds a scoring bonus to the assignment engine; it never
//! reserves capacity.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::models::{Inspector, WorkRecord};
use crate::scoring::{ScoreInput, ScoringWeights, score};

/// Build `work id -> inspector id`.
///
/// Works are visited by `(start_date, id)`. A sticky hint naming an active
/// inspector is adopted as-is; otherwise the best-scoring inspector wins, with
/// the pre-pass load spreading works across the roster. First maximum wins.
pub fn build_preferred_map<'a, I>(
    works: I,
    inspectors: &[&Inspector],
    sticky: &BTreeMap<String, String>,
    home_centroids: &HashMap<String, (f64, f64)>,
    weights: &ScoringWeights,
) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = &'a WorkRecord>,
{
    let mut preferred = BTreeMap::new();
    if inspectors.is_empty() {
        return preferred;
    }

    let mut ordered: Vec<&WorkRecord> = works.into_iter().collect();
    ordered.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));
    ordered.dedup_by(|a, b| a.id == b.id);

    let mut loads: HashMap<&str, u32> = HashMap::new();

    for work in ordered {
        let hinted = sticky
            .get(&work.id)
            .and_then(|id| inspectors.iter().find(|inspector| &inspector.id == id));

        let chosen = match hinted {
            Some(inspector) => Some(*inspector),
            None => {
                if let Some(stale) = sticky.get(&work.id) {
                    warn!(work_id = %work.id, inspector_id = %stale, "ignoring sticky hint for inactive inspector");
                }
                best_by_score(work, inspectors, &loads, home_centroids, weights)
            }
        };

        if let Some(inspector) = chosen {
            *loads.entry(inspector.id.as_str()).or_default() += 1;
            preferred.insert(work.id.clone(), inspector.id.clone());
        }
    }

    preferred
}

fn best_by_score<'i>(
    work: &WorkRecord,
    inspectors: &[&'i Inspector],
    loads: &HashMap<&str, u32>,
    home_centroids: &HashMap<String, (f64, f64)>,
    weights: &ScoringWeights,
) -> Option<&'i Inspector> {
    let mut best: Option<(&Inspector, f64)> = None;
    for &inspector in inspectors {
        let load = f64::from(loads.get(inspector.id.as_str()).copied().unwrap_or(0));
        let centroid = home_centroids.get(&inspector.id).copied().unwrap_or(work.location);
        let input = ScoreInput {
            centroid,
            current_load: load,
            preferred_id: None,
            assigned_postcodes: None,
        };
        let value = score(work, inspector, input, weights) - load * weights.preferred_balance_penalty;
        if best.is_none_or(|(_, best_value)| value > best_value) {
            best = Some((inspector, value));
        }
    }
    best.map(|(inspector, _)| inspector)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::LocationSource;

    fn work(id: &str, day: u32) -> WorkRecord {
        let date = NaiveDate::from_ymd_opt(2026, 3, day).unwrap();
        WorkRecord {
            id: id.into(),
            dossier_id: String::new(),
            status: String::new(),
            start_date: date,
            end_date: date,
            postcode: "1011AB".into(),
            district: String::new(),
            street: String::new(),
            location: (52.37, 4.89),
            location_source: LocationSource::Exact,
            owner: String::new(),
            category: None,
            source: None,
            permit_status: None,
        }
    }

    fn inspector(id: &str, primary: &[&str]) -> Inspector {
        Inspector {
            id: id.into(),
            initials: String::new(),
            name: id.into(),
            color: String::new(),
            primary_postcodes: primary.iter().map(|p| p.to_string()).collect(),
            backup_postcodes: Vec::new(),
            is_reserve: false,
            active_from: None,
            active_until: None,
        }
    }

    fn homes(ids: &[&str]) -> HashMap<String, (f64, f64)> {
        ids.iter().map(|id| (id.to_string(), (52.37, 4.89))).collect()
    }

    #[test]
    fn test_sticky_hint_is_adopted() {
        let (a, b) = (inspector("a", &["1011"]), inspector("b", &[]));
        let works = vec![work("w1", 2)];
        let sticky = BTreeMap::from([("w1".to_string(), "b".to_string())]);
        let map = build_preferred_map(&works, &[&a, &b], &sticky, &homes(&["a", "b"]), &ScoringWeights::default());
        assert_eq!(map["w1"], "b");
    }

    #[test]
    fn test_stale_hint_falls_back_to_scoring() {
        let (a, b) = (inspector("a", &["1011"]), inspector("b", &[]));
        let works = vec![work("w1", 2)];
        let sticky = BTreeMap::from([("w1".to_string(), "gone".to_string())]);
        let map = build_preferred_map(&works, &[&a, &b], &sticky, &homes(&["a", "b"]), &ScoringWeights::default());
        assert_eq!(map["w1"], "a");
    }

    #[test]
    fn test_load_spreads_between_equal_owners() {
        let (a, b) = (inspector("a", &["1011"]), inspector("b", &["1011"]));
        let works = vec![work("w2", 3), work("w1", 2), work("w3", 4)];
        let map = build_preferred_map(&works, &[&a, &b], &BTreeMap::new(), &homes(&["a", "b"]), &ScoringWeights::default());
        // Ties go to the first inspector; load then alternates the pick.
        assert_eq!(map["w1"], "a");
        assert_eq!(map["w2"], "b");
        assert_eq!(map["w3"], "a");
    }

    #[test]
    fn test_no_inspectors_yields_empty_map() {
        let works = vec![work("w1", 2)];
        let map = build_preferred_map(&works, &[], &BTreeMap::new(), &HashMap::new(), &ScoringWeights::default());
        assert!(map.is_empty());
    }
}
