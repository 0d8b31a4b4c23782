//! Simulated estimators derived purely from an engine's accumulators.
//!
//! Nothing here recomputes rates. Time-weighted estimators divide areas
//! by elapsed time; sampled estimators average over recorded history
//! points. The two disagree by construction and both are reported.

use crate::{
    event::Sample,
    snapshot::Snapshot,
    types::{SimTime, StateKey},
};
use std::collections::BTreeMap;

/// Fraction of elapsed time spent in `key`. None before any time elapses.
pub fn state_occupancy_fraction<S, T: Ord>(
    snapshot: &Snapshot<'_, S, T>,
    key: StateKey,
) -> Option<f64> {
    elapsed(snapshot).map(|t| {
        snapshot
            .accumulators
            .time_in_state
            .get(&key)
            .copied()
            .unwrap_or(0.0)
            / t
    })
}

/// Occupancy fraction of every visited state.
pub fn occupancy_distribution<S, T: Ord>(
    snapshot: &Snapshot<'_, S, T>,
) -> Option<BTreeMap<StateKey, f64>> {
    let t = elapsed(snapshot)?;
    Some(
        snapshot
            .accumulators
            .time_in_state
            .iter()
            .map(|(k, d)| (*k, d / t))
            .collect(),
    )
}

/// Time-weighted mean of the level (queue length or failed units).
pub fn time_average_level<S, T: Ord>(snapshot: &Snapshot<'_, S, T>) -> Option<f64> {
    elapsed(snapshot).map(|t| snapshot.accumulators.level_area / t)
}

/// Time-weighted mean of busy servers / busy teams.
pub fn time_average_busy<S, T: Ord>(snapshot: &Snapshot<'_, S, T>) -> Option<f64> {
    elapsed(snapshot).map(|t| snapshot.accumulators.busy_area / t)
}

/// Plain mean of `value` over the recorded samples, ignoring how long
/// each sample lasted. None when nothing was recorded.
pub fn sampled_mean<S>(history: &[Sample<S>], value: impl Fn(&S) -> f64) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    let sum: f64 = history.iter().map(|s| value(&s.state)).sum();
    Some(sum / history.len() as f64)
}

fn elapsed<S, T: Ord>(snapshot: &Snapshot<'_, S, T>) -> Option<SimTime> {
    (snapshot.time > 0.0).then_some(snapshot.time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Accumulators;

    fn acc() -> Accumulators<u64, u8> {
        let mut acc = Accumulators::default();
        acc.time_in_state.insert(0, 3.0);
        acc.time_in_state.insert(1, 1.0);
        acc.level_area = 1.0;
        acc.busy_area = 2.0;
        acc.history = vec![
            Sample { time: 3.0, state: 1 },
            Sample { time: 4.0, state: 0 },
            Sample { time: 4.0, state: 3 },
        ];
        acc
    }

    #[test]
    fn estimators_need_elapsed_time() {
        let acc = acc();
        let snap = Snapshot { time: 0.0, horizon: 10.0, state: &0u64, accumulators: &acc };
        assert_eq!(state_occupancy_fraction(&snap, 0), None);
        assert_eq!(time_average_level(&snap), None);
        assert!(occupancy_distribution(&snap).is_none());
    }

    #[test]
    fn occupancy_divides_by_elapsed_time() {
        let acc = acc();
        let snap = Snapshot { time: 4.0, horizon: 10.0, state: &0u64, accumulators: &acc };
        assert_eq!(state_occupancy_fraction(&snap, 0), Some(0.75));
        assert_eq!(state_occupancy_fraction(&snap, 7), Some(0.0));
        assert_eq!(time_average_level(&snap), Some(0.25));
        assert_eq!(time_average_busy(&snap), Some(0.5));
        let total: f64 = occupancy_distribution(&snap).unwrap().values().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sampled_mean_ignores_durations() {
        let acc = acc();
        let mean = sampled_mean(&acc.history, |s| *s as f64).unwrap();
        assert!((mean - 4.0 / 3.0).abs() < 1e-12);
        assert_eq!(sampled_mean::<u64>(&[], |s| *s as f64), None);
    }
}
