//! Amsterdam postcode areas for realistic test fixtures.
//!
//! Centroids are approximate (four-digit PC4 areas), good enough for
//! distance-based scoring and routing.

use dispatch_planner::geometry::PostcodeCentroids;

/// A named postcode area with its centroid.
#[derive(Debug, Clone)]
pub struct Area {
    pub name: &'static str,
    pub postcode: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Area {
    pub const fn new(name: &'static str, postcode: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, postcode, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

// ============================================================================
// Centrum
// ============================================================================

pub const CENTRUM: &[Area] = &[
    Area::new("Burgwallen-Oude Zijde", "1011", 52.3727, 4.9003),
    Area::new("Burgwallen-Nieuwe Zijde", "1012", 52.3738, 4.8932),
    Area::new("Haarlemmerbuurt", "1013", 52.3829, 4.8876),
    Area::new("Jordaan", "1015", 52.3780, 4.8820),
    Area::new("Grachtengordel-West", "1016", 52.3722, 4.8848),
    Area::new("Weteringschans", "1017", 52.3621, 4.8914),
];

// ============================================================================
// Oost
// ============================================================================

pub const OOST: &[Area] = &[
    Area::new("Plantage", "1018", 52.3653, 4.9135),
    Area::new("Oostelijk Havengebied", "1019", 52.3720, 4.9390),
    Area::new("Dapperbuurt", "1093", 52.3627, 4.9289),
    Area::new("Watergraafsmeer", "1097", 52.3522, 4.9361),
];

// ============================================================================
// Noord / Zuid
// ============================================================================

pub const NOORD: &[Area] = &[
    Area::new("Volewijck", "1021", 52.3910, 4.9138),
    Area::new("Nieuwendam", "1025", 52.4006, 4.9427),
];

pub const ZUID: &[Area] = &[
    Area::new("De Pijp", "1072", 52.3551, 4.8936),
    Area::new("Rivierenbuurt", "1078", 52.3456, 4.8990),
    Area::new("Buitenveldert", "1081", 52.3286, 4.8726),
];

/// All fixture areas.
pub fn all_areas() -> Vec<&'static Area> {
    CENTRUM.iter().chain(OOST).chain(NOORD).chain(ZUID).collect()
}

pub fn area(postcode: &str) -> &'static Area {
    all_areas()
        .into_iter()
        .find(|a| a.postcode == postcode)
        .unwrap_or_else(|| panic!("no fixture area {postcode}"))
}

/// Centroid lookup covering every fixture area.
pub fn amsterdam_centroids() -> PostcodeCentroids {
    all_areas()
        .into_iter()
        .fold(PostcodeCentroids::default(), |centroids, a| centroids.with(a.postcode, a.coords()))
}
