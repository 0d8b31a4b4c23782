//! M/M/c queue: Poisson arrivals, c exponential servers, FIFO, no balking.

use crate::{
    analysis::SteadyStateModel,
    error::{require_count, require_finite_total, require_non_negative, require_positive, SimResult},
    metrics::{ComparisonKey, MetricTable},
    model::{MarkovModel, ModelKind, RateVector},
    snapshot::Snapshot,
    stats,
    theory,
    types::StateKey,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QueueEvent {
    Arrival,
    ServiceCompletion,
}

/// A customer is either waiting or in service, never both.
/// `busy_servers == servers` whenever `queue_length > 0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QueueState {
    pub queue_length: u64,
    pub busy_servers: u64,
}

impl QueueState {
    pub fn in_system(&self) -> u64 {
        self.queue_length + self.busy_servers
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QueueModel {
    /// λ, customers per unit time.
    pub arrival_rate: f64,
    /// μ, completions per busy server per unit time.
    pub service_rate: f64,
    /// c
    pub servers:      u32,
}

impl QueueModel {
    pub fn new(arrival_rate: f64, service_rate: f64, servers: u32) -> SimResult<Self> {
        let model = Self { arrival_rate, service_rate, servers };
        model.validate()?;
        Ok(model)
    }
}

impl MarkovModel for QueueModel {
    type State = QueueState;
    type Transition = QueueEvent;

    fn kind(&self) -> ModelKind { ModelKind::Queue }

    fn label(&self) -> String {
        format!("M/M/{}", self.servers)
    }

    fn validate(&self) -> SimResult<()> {
        require_non_negative("arrival_rate", self.arrival_rate)?;
        require_positive("service_rate", self.service_rate)?;
        require_count("servers", self.servers)?;
        // Largest total rate, reached with every server busy.
        require_finite_total(
            "total_rate",
            self.arrival_rate + self.servers as f64 * self.service_rate,
        )
    }

    fn initial_state(&self) -> QueueState {
        QueueState::default()
    }

    fn rates(&self, state: &QueueState) -> RateVector<QueueEvent> {
        let working = state.busy_servers.min(self.servers as u64);
        RateVector::new()
            .with(QueueEvent::Arrival, self.arrival_rate)
            .with(QueueEvent::ServiceCompletion, working as f64 * self.service_rate)
    }

    fn apply(&self, state: &mut QueueState, transition: QueueEvent) {
        match transition {
            QueueEvent::Arrival => {
                if state.busy_servers < self.servers as u64 {
                    state.busy_servers += 1;
                } else {
                    state.queue_length += 1;
                }
            }
            QueueEvent::ServiceCompletion => {
                if state.queue_length > 0 {
                    // Head of line moves into the freed server.
                    state.queue_length -= 1;
                } else {
                    state.busy_servers = state.busy_servers.saturating_sub(1);
                }
            }
        }
    }

    fn state_key(&self, state: &QueueState) -> StateKey {
        state.in_system()
    }

    fn level(&self, state: &QueueState) -> u64 {
        state.queue_length
    }

    fn busy(&self, state: &QueueState) -> u64 {
        state.busy_servers
    }
}

impl SteadyStateModel for QueueModel {
    fn simulated_metrics(&self, snapshot: &Snapshot<'_, QueueState, QueueEvent>) -> MetricTable {
        let mut table = MetricTable::new(format!("Simulated {}", self.label()));
        let arrivals = snapshot.event_count(QueueEvent::Arrival);
        let served = snapshot.event_count(QueueEvent::ServiceCompletion);

        // Waiting area over customers served; service is added analytically
        // as its known mean 1/μ rather than measured.
        let wq = snapshot.accumulators.level_area / served.max(1) as f64;
        let w = wq + 1.0 / self.service_rate;

        let utilization = stats::time_average_busy(snapshot).map(|b| b / self.servers as f64);
        let lq_sampled = stats::sampled_mean(&snapshot.accumulators.history, |s| {
            s.queue_length as f64
        });
        let lq_time_weighted = stats::time_average_level(snapshot);
        let l_little = self.arrival_rate * w;

        table.push("time", snapshot.time);
        table.push("arrivals", arrivals as f64);
        table.push("served", served as f64);
        table.push("served_fraction", served as f64 / arrivals.max(1) as f64);
        table.push("wq", wq);
        table.push("w", w);
        table.push_opt("utilization", utilization);
        table.push_opt("lq_sampled", lq_sampled);
        table.push_opt("lq_time_weighted", lq_time_weighted);
        table.push("l_little", l_little);
        table.push_opt("little_gap", lq_sampled.map(|lq| (lq - l_little).abs()));
        table.push_opt(
            "little_gap_time_weighted",
            lq_time_weighted.map(|lq| (lq - self.arrival_rate * wq).abs()),
        );
        table
    }

    fn theoretical_metrics(&self) -> SimResult<MetricTable> {
        let t = theory::queue_steady_state(self.arrival_rate, self.service_rate, self.servers)?;
        let mut table = MetricTable::new(format!("Theoretical {}", self.label()));
        table.push("utilization", t.utilization);
        table.push("p0", t.p0);
        table.push("w", t.w);
        table.push("wq", t.wq);
        table.push("lq", t.lq);
        table.push("l", t.l);
        Ok(table)
    }

    fn comparison_keys(&self) -> Vec<ComparisonKey> {
        vec![
            ComparisonKey::new("Utilization (ρ)", "utilization", "utilization"),
            ComparisonKey::new("Avg time in system (W)", "w", "w"),
            ComparisonKey::new("Avg time in queue (Wq)", "wq", "wq"),
            ComparisonKey::new("Avg queue length (Lq)", "lq_sampled", "lq"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(c: u32) -> QueueModel {
        QueueModel::new(1.0, 1.5, c).unwrap()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(QueueModel::new(-0.1, 1.0, 1).is_err());
        assert!(QueueModel::new(1.0, 0.0, 1).is_err());
        assert!(QueueModel::new(1.0, f64::NAN, 1).is_err());
        assert!(QueueModel::new(1.0, 1.0, 0).is_err());
        assert!(QueueModel::new(0.0, 1.0, 1).is_ok(), "λ = 0 is allowed");
    }

    #[test]
    fn reports_queue_kind_and_label() {
        let m = model(3);
        assert_eq!(m.kind(), ModelKind::Queue);
        assert_eq!(m.label(), "M/M/3");
    }

    #[test]
    fn rates_scale_with_busy_servers() {
        let m = model(2);
        let idle = m.rates(&QueueState::default());
        assert_eq!(idle.rate_of(QueueEvent::Arrival), 1.0);
        assert_eq!(idle.rate_of(QueueEvent::ServiceCompletion), 0.0);

        let full = m.rates(&QueueState { queue_length: 4, busy_servers: 2 });
        assert_eq!(full.rate_of(QueueEvent::ServiceCompletion), 3.0);
    }

    #[test]
    fn arrival_takes_free_server_before_queueing() {
        let m = model(2);
        let mut s = QueueState::default();
        m.apply(&mut s, QueueEvent::Arrival);
        m.apply(&mut s, QueueEvent::Arrival);
        assert_eq!(s, QueueState { queue_length: 0, busy_servers: 2 });
        m.apply(&mut s, QueueEvent::Arrival);
        assert_eq!(s, QueueState { queue_length: 1, busy_servers: 2 });
    }

    #[test]
    fn completion_pulls_from_queue_before_freeing_server() {
        let m = model(2);
        let mut s = QueueState { queue_length: 1, busy_servers: 2 };
        m.apply(&mut s, QueueEvent::ServiceCompletion);
        assert_eq!(s, QueueState { queue_length: 0, busy_servers: 2 });
        m.apply(&mut s, QueueEvent::ServiceCompletion);
        assert_eq!(s, QueueState { queue_length: 0, busy_servers: 1 });
    }

    #[test]
    fn state_key_counts_everyone_in_system() {
        let m = model(1);
        assert_eq!(m.state_key(&QueueState { queue_length: 3, busy_servers: 1 }), 4);
    }

    #[test]
    fn unstable_queue_has_no_theory() {
        let m = QueueModel::new(2.0, 1.0, 1).unwrap();
        assert!(m.theoretical_metrics().is_err());
    }
}
