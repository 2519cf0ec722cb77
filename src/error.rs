//! Errors raised at the fallible edges of the planner.
//!
//! Planning itself never fails; only date parsing and the OSRM adapter do.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid ISO date: {0}")]
    InvalidDate(String),

    #[error("OSRM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("distance matrix has {actual} rows, expected {expected}")]
    MalformedMatrix { expected: usize, actual: usize },
}
