//! Builders with sensible defaults for planner inputs.

use chrono::NaiveDate;

use dispatch_planner::calendar::parse_iso_date;
use dispatch_planner::models::{Inspector, LocationSource, WorkRecord};

use super::amsterdam_locations::area;

pub fn date(s: &str) -> NaiveDate {
    parse_iso_date(s).expect("fixture date")
}

/// Builder for test works. Defaults to a single-day work on the given date in
/// postcode area 1011.
#[derive(Clone, Debug)]
pub struct TestWork {
    record: WorkRecord,
}

impl TestWork {
    pub fn new(id: &str, start: &str) -> Self {
        let a = area("1011");
        Self {
            record: WorkRecord {
                id: id.to_string(),
                dossier_id: format!("DOS-{id}"),
                status: "In uitvoering".to_string(),
                start_date: date(start),
                end_date: date(start),
                postcode: format!("{}AB", a.postcode),
                district: "Centrum".to_string(),
                street: "Damrak".to_string(),
                location: a.coords(),
                location_source: LocationSource::PostcodeCentroid,
                owner: "Liander".to_string(),
                category: None,
                source: Some("KLIC".to_string()),
                permit_status: Some("Verleend".to_string()),
            },
        }
    }

    pub fn ends(mut self, end: &str) -> Self {
        self.record.end_date = date(end);
        self
    }

    /// Place the work at the centroid of a fixture postcode area.
    pub fn in_area(mut self, postcode: &str) -> Self {
        let a = area(postcode);
        self.record.postcode = format!("{}AB", a.postcode);
        self.record.location = a.coords();
        self.record.location_source = LocationSource::PostcodeCentroid;
        self
    }

    pub fn at(mut self, lat: f64, lng: f64) -> Self {
        self.record.location = (lat, lng);
        self.record.location_source = LocationSource::Exact;
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.record.status = status.to_string();
        self
    }

    pub fn district(mut self, district: &str) -> Self {
        self.record.district = district.to_string();
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.record.category = Some(category.to_string());
        self
    }

    pub fn build(self) -> WorkRecord {
        self.record
    }
}

/// Builder for test inspectors.
#[derive(Clone, Debug)]
pub struct TestInspector {
    inspector: Inspector,
}

impl TestInspector {
    pub fn new(id: &str) -> Self {
        Self {
            inspector: Inspector {
                id: id.to_string(),
                initials: id.to_uppercase(),
                name: format!("Inspector {id}"),
                color: "#3366cc".to_string(),
                primary_postcodes: Vec::new(),
                backup_postcodes: Vec::new(),
                is_reserve: false,
                active_from: None,
                active_until: None,
            },
        }
    }

    pub fn primary(mut self, postcode: &str) -> Self {
        self.inspector.primary_postcodes.push(postcode.to_string());
        self
    }

    pub fn backup(mut self, postcode: &str) -> Self {
        self.inspector.backup_postcodes.push(postcode.to_string());
        self
    }

    pub fn reserve(mut self) -> Self {
        self.inspector.is_reserve = true;
        self
    }

    pub fn active_until(mut self, until: &str) -> Self {
        self.inspector.active_until = Some(date(until));
        self
    }

    pub fn build(self) -> Inspector {
        self.inspector
    }
}
