//! Continuity registry: the first inspector ever assigned to each work.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::DispatchPlan;
use crate::traits::ContinuityStore;

/// Map-backed store, suitable for tests and for callers that persist the map
/// themselves (it serializes as a plain JSON object).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InMemoryContinuityStore {
    first_inspector: BTreeMap<String, String>,
}

impl InMemoryContinuityStore {
    pub fn new(first_inspector: BTreeMap<String, String>) -> Self {
        Self { first_inspector }
    }

    pub fn get(&self, work_id: &str) -> Option<&str> {
        self.first_inspector.get(work_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.first_inspector.len()
    }

    pub fn is_empty(&self) -> bool {
        self.first_inspector.is_empty()
    }
}

impl ContinuityStore for InMemoryContinuityStore {
    fn hints(&self) -> BTreeMap<String, String> {
        self.first_inspector.clone()
    }

    fn record(&mut self, work_id: &str, inspector_id: &str) {
        self.first_inspector
            .entry(work_id.to_string())
            .or_insert_with(|| inspector_id.to_string());
    }
}

/// Entries a plan adds to `existing`: works visited today that have no
/// recorded inspector yet. Existing entries are never overwritten.
pub fn continuity_updates(plan: &DispatchPlan, existing: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut updates = BTreeMap::new();
    for visit in plan.all_visits() {
        let work_id = &visit.candidate.work.id;
        if !existing.contains_key(work_id) {
            updates
                .entry(work_id.clone())
                .or_insert_with(|| visit.inspector_id.clone());
        }
    }
    updates
}

/// Write the plan's first assignments back into `store`. Returns the number
/// of new entries.
pub fn record_continuity<S>(plan: &DispatchPlan, store: &mut S) -> usize
where
    S: ContinuityStore + ?Sized,
{
    let updates = continuity_updates(plan, &store.hints());
    for (work_id, inspector_id) in &updates {
        store.record(work_id, inspector_id);
    }
    updates.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_first_value() {
        let mut store = InMemoryContinuityStore::default();
        store.record("w1", "a");
        store.record("w1", "b");
        assert_eq!(store.get("w1"), Some("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let store = InMemoryContinuityStore::new(BTreeMap::from([("w1".to_string(), "a".to_string())]));
        assert_eq!(serde_json::to_string(&store).unwrap(), r#"{"w1":"a"}"#);
    }
}
