//! Weekly follow-up check-ins after a work has ended.
//!
//! Follow-ups never consume daily capacity and never go unassigned while at
//! least one inspector is active.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::calendar::{Direction, WorkdayCalendar};
use crate::geometry::{DEFAULT_CENTER, haversine_km};
use crate::models::{FollowUpTask, Inspector, WorkRecord};

pub const FOLLOW_UP_REASON: &str = "Wekelijkse opvolging na afronding: telefonisch of per mail contact opnemen";

const MIN_DAYS_AFTER_END: i64 = 7;
const MAX_DAYS_AFTER_END: i64 = 56;

/// Whole weeks between the adjusted end of `work` and `date`, when a weekly
/// follow-up falls on `date`.
pub fn follow_up_week(work: &WorkRecord, date: NaiveDate, calendar: &WorkdayCalendar) -> Option<u32> {
    let adjusted_end = calendar.adjust_to_workday(work.end_date, Direction::Backward);
    let offset = (date - adjusted_end).num_days();
    ((MIN_DAYS_AFTER_END..=MAX_DAYS_AFTER_END).contains(&offset) && offset % 7 == 0).then(|| (offset / 7) as u32)
}

fn follow_up_inspector<'a>(
    work: &WorkRecord,
    inspectors: &[&'a Inspector],
    preferred: &BTreeMap<String, String>,
    home_centroids: &HashMap<String, (f64, f64)>,
) -> Option<&'a Inspector> {
    if let Some(id) = preferred.get(&work.id) {
        if let Some(inspector) = inspectors.iter().find(|i| &i.id == id) {
            return Some(*inspector);
        }
    }

    inspectors
        .iter()
        .find(|i| i.is_primary_for(&work.postcode))
        .or_else(|| inspectors.iter().find(|i| i.is_backup_for(&work.postcode)))
        .copied()
        .or_else(|| nearest(work.location, inspectors, home_centroids))
}

fn nearest<'a>(
    location: (f64, f64),
    inspectors: &[&'a Inspector],
    home_centroids: &HashMap<String, (f64, f64)>,
) -> Option<&'a Inspector> {
    let mut best: Option<(&Inspector, f64)> = None;
    for &inspector in inspectors {
        let home = home_centroids.get(&inspector.id).copied().unwrap_or(DEFAULT_CENTER);
        let distance = haversine_km(location, home);
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((inspector, distance));
        }
    }
    best.map(|(inspector, _)| inspector)
}

/// Assign every due follow-up on `date`. `preferred` may hold both the
/// preferred map and sticky hints; the first valid id wins.
pub fn schedule_follow_ups<'a, I>(
    date: NaiveDate,
    works: I,
    inspectors: &[&Inspector],
    calendar: &WorkdayCalendar,
    preferred: &BTreeMap<String, String>,
    home_centroids: &HashMap<String, (f64, f64)>,
) -> BTreeMap<String, Vec<FollowUpTask>>
where
    I: IntoIterator<Item = &'a WorkRecord>,
{
    let mut by_inspector: BTreeMap<String, Vec<FollowUpTask>> = BTreeMap::new();
    if !calendar.is_workday(date) || inspectors.is_empty() {
        return by_inspector;
    }

    for work in works {
        let Some(week) = follow_up_week(work, date, calendar) else {
            continue;
        };
        let Some(inspector) = follow_up_inspector(work, inspectors, preferred, home_centroids) else {
            continue;
        };
        by_inspector.entry(inspector.id.clone()).or_default().push(FollowUpTask {
            id: format!("{}-followup-w{week}", work.id),
            work_id: work.id.clone(),
            dossier_id: work.dossier_id.clone(),
            inspector_id: inspector.id.clone(),
            weeks_since_end: week,
            reason: FOLLOW_UP_REASON.to_string(),
        });
    }

    by_inspector
}
