//! Planning domain records.
//!
//! Inputs (`WorkRecord`, `Inspector`) are read-only for a run. Everything else
//! is produced by the planner and rebuilt from scratch on every invocation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inspector id written on visits that could not be assigned.
pub const UNASSIGNED_INSPECTOR_ID: &str = "UNASSIGNED";

/// Upper-case a postcode and strip whitespace, so `"1011 ab"` equals `"1011AB"`.
pub fn normalize_postcode(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// A zone entry owns a postcode when it equals it or is a prefix of it.
fn zone_owns(zone: &str, postcode: &str) -> bool {
    let zone = normalize_postcode(zone);
    !zone.is_empty() && normalize_postcode(postcode).starts_with(&zone)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationSource {
    #[default]
    Exact,
    PostcodeCentroid,
}

/// An excavation/repair site with the window during which visits may occur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkRecord {
    pub id: String,
    #[serde(default)]
    pub dossier_id: String,
    #[serde(default)]
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub street: String,
    /// (lat, lng).
    pub location: (f64, f64),
    #[serde(default)]
    pub location_source: LocationSource,
    /// Utility company owning the work.
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub permit_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspector {
    pub id: String,
    #[serde(default)]
    pub initials: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub primary_postcodes: Vec<String>,
    #[serde(default)]
    pub backup_postcodes: Vec<String>,
    #[serde(default)]
    pub is_reserve: bool,
    /// Inclusive.
    #[serde(default)]
    pub active_from: Option<NaiveDate>,
    /// Inclusive.
    #[serde(default)]
    pub active_until: Option<NaiveDate>,
}

impl Inspector {
    pub fn is_primary_for(&self, postcode: &str) -> bool {
        self.primary_postcodes.iter().any(|zone| zone_owns(zone, postcode))
    }

    pub fn is_backup_for(&self, postcode: &str) -> bool {
        self.backup_postcodes.iter().any(|zone| zone_owns(zone, postcode))
    }

    /// Whether the inspector's activity window contains `date`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.active_from.is_none_or(|from| date >= from)
            && self.active_until.is_none_or(|until| date <= until)
    }

    pub fn role_for(&self, postcode: &str) -> AssignmentRole {
        if self.is_primary_for(postcode) {
            AssignmentRole::Dedicated
        } else if self.is_backup_for(postcode) {
            AssignmentRole::Backup
        } else {
            AssignmentRole::Reserve
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VisitType {
    #[serde(rename = "START")]
    Start,
    #[serde(rename = "EIND")]
    Eind,
    #[serde(rename = "TUSSEN")]
    Tussen,
}

impl VisitType {
    pub fn code(self) -> &'static str {
        match self {
            VisitType::Start => "START",
            VisitType::Eind => "EIND",
            VisitType::Tussen => "TUSSEN",
        }
    }
}

/// A work that needs a visit on the planning date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub work: WorkRecord,
    pub visit_type: VisitType,
    pub mandatory: bool,
    pub priority: u32,
}

impl Candidate {
    /// Stable visit id: `<work>-<date>-<type>`.
    pub fn visit_id(&self, date: NaiveDate) -> String {
        format!("{}-{}-{}", self.work.id, date.format("%Y-%m-%d"), self.visit_type.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentRole {
    Dedicated,
    Backup,
    Reserve,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedVisit {
    pub id: String,
    pub candidate: Candidate,
    pub inspector_id: String,
    pub inspector_initials: String,
    pub inspector_name: String,
    pub inspector_color: String,
    pub role: AssignmentRole,
    pub score: f64,
    /// Effective capacity cost of this visit for the chosen inspector.
    pub load: f64,
}

impl PlannedVisit {
    pub fn location(&self) -> (f64, f64) {
        self.candidate.work.location
    }
}

/// Why a candidate ended up without an inspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnassignedReason {
    NoActiveInspectors,
    /// Every pool the candidate may draw from was empty.
    NoEligibleInspector,
    CapacityExhausted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignedVisit {
    pub id: String,
    pub candidate: Candidate,
    pub inspector_id: String,
    pub reason: UnassignedReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpTask {
    pub id: String,
    pub work_id: String,
    pub dossier_id: String,
    pub inspector_id: String,
    /// Whole weeks since the adjusted end date.
    pub weeks_since_end: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectorLoad {
    pub load: f64,
    pub soft_daily_limit: u32,
    pub hard_daily_limit: u32,
    pub visits: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTotals {
    pub candidates: usize,
    pub mandatory_candidates: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub unassigned_mandatory: usize,
    pub follow_ups: usize,
    pub active_inspectors: usize,
    pub overflow_inspectors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPlan {
    pub date: NaiveDate,
    pub is_workday: bool,
    pub visits_by_inspector: BTreeMap<String, Vec<PlannedVisit>>,
    pub follow_ups_by_inspector: BTreeMap<String, Vec<FollowUpTask>>,
    pub preferred_inspector_by_work_id: BTreeMap<String, String>,
    pub unassigned: Vec<UnassignedVisit>,
    pub inspector_loads: BTreeMap<String, InspectorLoad>,
    pub totals: PlanTotals,
}

impl DispatchPlan {
    pub fn all_visits(&self) -> impl Iterator<Item = &PlannedVisit> {
        self.visits_by_inspector.values().flatten()
    }
}
