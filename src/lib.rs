//! dispatch-planner core
//!
//! Daily inspector dispatch: which works need a visit, who goes where, and in
//! which order.

pub mod traits;
pub mod error;
pub mod models;
pub mod calendar;
pub mod geometry;
pub mod capacity;
pub mod candidates;
pub mod scoring;
pub mod preferred;
pub mod solver;
pub mod follow_up;
pub mod routing;
pub mod continuity;
pub mod planner;
pub mod osrm;

pub use calendar::next_workday_iso;
pub use error::DispatchError;
pub use planner::{PlanOptions, build_dispatch_plan};
pub use routing::{build_route_index_map, propose_routes};
