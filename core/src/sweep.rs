//! Independent replications of one scenario.
//!
//! RULE: Replications share nothing. Each one owns its engine and draws
//! from its own stream `bank.stream(index)`, so the result of replication
//! `i` does not depend on how many others run or in which order.

use crate::{
    analysis::SteadyStateModel,
    engine::CtmcEngine,
    error::SimResult,
    metrics::MetricTable,
    rng::SeedBank,
    types::SimTime,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplicationSummary {
    pub index:       u64,
    pub transitions: u64,
    pub final_time:  SimTime,
    pub metrics:     MetricTable,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepResult {
    pub master_seed:  u64,
    pub horizon:      SimTime,
    pub replications: Vec<ReplicationSummary>,
}

impl SweepResult {
    /// Mean of a simulated metric over the replications that report it.
    pub fn mean_metric(&self, name: &str) -> Option<f64> {
        let values: Vec<f64> = self
            .replications
            .iter()
            .filter_map(|r| r.metrics.get(name))
            .collect();
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Run `replications` engines to the horizon on the rayon pool.
pub fn replicate<M>(
    model: &M,
    horizon: SimTime,
    bank: SeedBank,
    replications: u64,
) -> SimResult<SweepResult>
where
    M: SteadyStateModel + Clone + Send + Sync,
{
    use rayon::prelude::*;

    model.validate()?;

    let replications = (0..replications)
        .into_par_iter()
        .map(|index| run_one(model.clone(), horizon, bank, index))
        .collect::<SimResult<Vec<_>>>()?;
    log::debug!(
        "sweep finished: {} replications, seed={}",
        replications.len(),
        bank.master_seed()
    );
    Ok(SweepResult {
        master_seed: bank.master_seed(),
        horizon,
        replications,
    })
}

fn run_one<M: SteadyStateModel>(
    model: M,
    horizon: SimTime,
    bank: SeedBank,
    index: u64,
) -> SimResult<ReplicationSummary> {
    let rng = bank.stream(index).with_name("replication");
    let mut engine = CtmcEngine::with_rng(model, horizon, rng)?;
    let transitions = engine.run_to_horizon();
    Ok(ReplicationSummary {
        index,
        transitions,
        final_time: engine.current_time(),
        metrics: engine.simulated_metrics(),
    })
}
