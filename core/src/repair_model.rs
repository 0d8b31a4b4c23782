//! Machine-repair birth–death process: N machines fail independently at
//! rate λ; `teams` repair crews each fix one machine at rate μ.

use crate::{
    analysis::SteadyStateModel,
    error::{require_count, require_finite_total, require_non_negative, require_positive, SimResult},
    metrics::{ComparisonKey, MetricTable},
    model::{MarkovModel, ModelKind, RateVector},
    snapshot::Snapshot,
    stats,
    theory::{self, birth_rate, death_rate},
    types::StateKey,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PopulationEvent {
    /// A working machine fails.
    Birth,
    /// A failed machine is repaired.
    Death,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PopulationState {
    pub failed_units: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RepairModel {
    /// N
    pub machines:     u32,
    /// λ, per working machine.
    pub failure_rate: f64,
    /// μ, per busy team.
    pub repair_rate:  f64,
    pub teams:        u32,
}

impl RepairModel {
    pub fn new(machines: u32, failure_rate: f64, repair_rate: f64, teams: u32) -> SimResult<Self> {
        let model = Self { machines, failure_rate, repair_rate, teams };
        model.validate()?;
        Ok(model)
    }

    /// Generator matrix Q of this chain.
    pub fn generator_matrix(&self) -> Vec<Vec<f64>> {
        theory::generator_matrix(self.machines, self.failure_rate, self.repair_rate, self.teams)
    }

    fn failed(&self, state: &PopulationState) -> u32 {
        state.failed_units.min(self.machines as u64) as u32
    }
}

impl MarkovModel for RepairModel {
    type State = PopulationState;
    type Transition = PopulationEvent;

    fn kind(&self) -> ModelKind { ModelKind::Population }

    fn label(&self) -> String {
        format!("repair N={} teams={}", self.machines, self.teams)
    }

    fn validate(&self) -> SimResult<()> {
        require_count("machines", self.machines)?;
        require_count("teams", self.teams)?;
        require_non_negative("failure_rate", self.failure_rate)?;
        require_positive("repair_rate", self.repair_rate)?;
        require_finite_total(
            "total_rate",
            self.machines as f64 * self.failure_rate
                + self.machines.min(self.teams) as f64 * self.repair_rate,
        )
    }

    fn initial_state(&self) -> PopulationState {
        PopulationState::default()
    }

    fn rates(&self, state: &PopulationState) -> RateVector<PopulationEvent> {
        let k = self.failed(state);
        RateVector::new()
            .with(PopulationEvent::Birth, birth_rate(self.machines, self.failure_rate, k))
            .with(PopulationEvent::Death, death_rate(self.repair_rate, self.teams, k))
    }

    fn apply(&self, state: &mut PopulationState, transition: PopulationEvent) {
        match transition {
            PopulationEvent::Birth => {
                state.failed_units = (state.failed_units + 1).min(self.machines as u64);
            }
            PopulationEvent::Death => {
                state.failed_units = state.failed_units.saturating_sub(1);
            }
        }
    }

    fn state_key(&self, state: &PopulationState) -> StateKey {
        state.failed_units
    }

    fn level(&self, state: &PopulationState) -> u64 {
        state.failed_units
    }

    fn busy(&self, state: &PopulationState) -> u64 {
        state.failed_units.min(self.teams as u64)
    }
}

impl SteadyStateModel for RepairModel {
    fn simulated_metrics(
        &self,
        snapshot: &Snapshot<'_, PopulationState, PopulationEvent>,
    ) -> MetricTable {
        let mut table = MetricTable::new(format!("Simulated {}", self.label()));
        let n = self.machines as u64;

        table.push("time", snapshot.time);
        table.push("failures", snapshot.event_count(PopulationEvent::Birth) as f64);
        table.push("repairs", snapshot.event_count(PopulationEvent::Death) as f64);

        let mut availability = Some(0.0);
        for i in 0..=n {
            let p = stats::state_occupancy_fraction(snapshot, i);
            availability = availability.zip(p).map(|(a, p)| a + (n - i) as f64 * p);
            table.push_opt(format!("p_{i}"), p);
        }
        table.push_opt("availability", availability.map(|a| a / n as f64));

        let mean_failed = stats::time_average_level(snapshot);
        table.push_opt("mean_failed", mean_failed);
        table.push_opt(
            "failed_sampled",
            stats::sampled_mean(&snapshot.accumulators.history, |s| s.failed_units as f64),
        );
        // Model-specific proxy: mean_failed·λ / (teams·μ).
        table.push_opt(
            "utilization",
            mean_failed.map(|m| m * self.failure_rate / (self.teams as f64 * self.repair_rate)),
        );
        table
    }

    fn theoretical_metrics(&self) -> SimResult<MetricTable> {
        let t = theory::birth_death_steady_state(
            self.machines,
            self.failure_rate,
            self.repair_rate,
            self.teams,
        )?;
        let mut table = MetricTable::new(format!("Theoretical {}", self.label()));
        for (i, p) in t.pi.iter().enumerate() {
            table.push(format!("pi_{i}"), *p);
        }
        table.push("availability", t.availability);
        table.push("mean_failed", t.mean_failed);
        table.push("utilization", t.utilization);
        Ok(table)
    }

    fn comparison_keys(&self) -> Vec<ComparisonKey> {
        let mut keys = vec![
            ComparisonKey::new("Availability", "availability", "availability"),
            ComparisonKey::new("Mean failed machines", "mean_failed", "mean_failed"),
            ComparisonKey::new("Utilization (ρ)", "utilization", "utilization"),
        ];
        keys.extend((0..=self.machines).map(|i| {
            ComparisonKey::new(format!("P(X = {i})"), format!("p_{i}"), format!("pi_{i}"))
        }));
        keys
    }
}
