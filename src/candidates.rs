//! Which works need a visit on the planning date, and what kind.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{Direction, WorkdayCalendar};
use crate::models::{Candidate, VisitType, WorkRecord, normalize_postcode};

pub const START_PRIORITY: u32 = 120;
pub const EIND_PRIORITY: u32 = 116;
pub const TUSSEN_PRIORITY: u32 = 80;

/// Work selection filters. An empty set means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkFilters {
    pub statuses: BTreeSet<String>,
    pub sources: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub permit_statuses: BTreeSet<String>,
    pub districts: BTreeSet<String>,
    pub postcodes: BTreeSet<String>,
}

fn accepts(filter: &BTreeSet<String>, value: &str) -> bool {
    filter.is_empty() || filter.iter().any(|allowed| allowed.eq_ignore_ascii_case(value))
}

fn accepts_optional(filter: &BTreeSet<String>, value: Option<&str>) -> bool {
    filter.is_empty() || value.is_some_and(|value| accepts(filter, value))
}

impl WorkFilters {
    pub fn matches(&self, work: &WorkRecord) -> bool {
        accepts(&self.statuses, &work.status) && self.matches_ignoring_status(work)
    }

    /// Follow-ups target works that are usually closed already, so the
    /// status filter does not apply to them.
    pub fn matches_ignoring_status(&self, work: &WorkRecord) -> bool {
        accepts_optional(&self.sources, work.source.as_deref())
            && accepts_optional(&self.categories, work.category.as_deref())
            && accepts_optional(&self.permit_statuses, work.permit_status.as_deref())
            && accepts(&self.districts, &work.district)
            && (self.postcodes.is_empty() || {
                let postcode = normalize_postcode(&work.postcode);
                self.postcodes
                    .iter()
                    .any(|prefix| postcode.starts_with(&normalize_postcode(prefix)))
            })
    }
}

/// Classify the visit `work` needs on `date`, if any.
pub fn candidate_for(work: &WorkRecord, date: NaiveDate, calendar: &WorkdayCalendar) -> Option<Candidate> {
    if date < work.start_date || date > work.end_date {
        return None;
    }

    let adjusted_start = calendar.adjust_to_workday(work.start_date, Direction::Forward);
    let adjusted_end = calendar.adjust_to_workday(work.end_date, Direction::Backward);

    let (visit_type, mandatory, priority) = if date == adjusted_start {
        (VisitType::Start, true, START_PRIORITY)
    } else if date == adjusted_end {
        (VisitType::Eind, true, EIND_PRIORITY)
    } else if date > adjusted_start && calendar.workdays_between(adjusted_start, date) % 2 == 0 {
        (VisitType::Tussen, false, TUSSEN_PRIORITY)
    } else {
        return None;
    };

    Some(Candidate {
        work: work.clone(),
        visit_type,
        mandatory,
        priority,
    })
}

/// Candidates for `date` in greedy processing order: priority descending,
/// then soonest end date, then input order.
pub fn generate_candidates<'a, I>(date: NaiveDate, works: I, calendar: &WorkdayCalendar) -> Vec<Candidate>
where
    I: IntoIterator<Item = &'a WorkRecord>,
{
    let mut indexed: Vec<(usize, Candidate)> = works
        .into_iter()
        .filter_map(|work| candidate_for(work, date, calendar))
        .enumerate()
        .collect();

    indexed.sort_by_key(|(index, candidate)| (Reverse(candidate.priority), candidate.work.end_date, *index));
    indexed.into_iter().map(|(_, candidate)| candidate).collect()
}
