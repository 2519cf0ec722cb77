//! Test fixtures for dispatch-planner.
//!
//! Provides realistic test data including:
//! - Amsterdam postcode areas with their approximate centroids
//! - Builders for works, inspectors and planning options

#![allow(dead_code)]

pub mod amsterdam_locations;
pub mod builders;

pub use amsterdam_locations::*;
pub use builders::*;
