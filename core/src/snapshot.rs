//! Read-only engine views for hosts and the analyzer.

use crate::{
    engine::Accumulators,
    error::SimResult,
    types::SimTime,
};
use serde::Serialize;

/// A borrowed view of one engine. Holding it prevents any further
/// step() on that engine.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a, S, T: Ord> {
    pub time:         SimTime,
    pub horizon:      SimTime,
    pub state:        &'a S,
    pub accumulators: &'a Accumulators<S, T>,
}

impl<S, T: Ord + Copy> Snapshot<'_, S, T> {
    pub fn event_count(&self, transition: T) -> u64 {
        self.accumulators
            .event_counts
            .get(&transition)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_events(&self) -> u64 {
        self.accumulators.event_counts.values().sum()
    }
}

impl<S: Serialize, T: Ord + Serialize> Snapshot<'_, S, T> {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
