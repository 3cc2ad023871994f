//! Anomaly scoring against a selected baseline

mod scorer;
mod types;

pub use scorer::AnomalyScorer;
pub use types::{Anomaly, AnomalyType, Severity};
