//! Per-region baseline store

use super::models::BaselineAnalysis;
use dashmap::DashMap;
use std::sync::Arc;

/// Latest baseline per region.
///
/// Writes are last-write-wins: `put` replaces whatever was there, with no
/// merge and no history. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct BaselineStore {
    baselines: Arc<DashMap<String, BaselineAnalysis>>,
}

impl BaselineStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline for `region`, if one has been stored
    pub fn get(&self, region: &str) -> Option<BaselineAnalysis> {
        self.baselines.get(region).map(|entry| entry.value().clone())
    }

    /// Store `analysis` for `region`, returning the baseline it replaced
    pub fn put(&self, region: &str, analysis: BaselineAnalysis) -> Option<BaselineAnalysis> {
        self.baselines.insert(region.to_string(), analysis)
    }

    /// Drop the baseline for `region`
    pub fn remove(&self, region: &str) -> Option<BaselineAnalysis> {
        self.baselines.remove(region).map(|(_, analysis)| analysis)
    }

    /// Regions with a stored baseline, sorted
    pub fn regions(&self) -> Vec<String> {
        let mut regions: Vec<String> = self
            .baselines
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        regions.sort();
        regions
    }

    /// Number of stored baselines
    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    /// Whether no baseline is stored
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}
