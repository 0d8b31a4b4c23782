//! Analyzer contract: each model family reports its own simulated
//! estimators and its own closed forms. The two are never mixed.

use crate::{
    error::SimResult,
    metrics::{ComparisonKey, MetricTable},
    model::MarkovModel,
    snapshot::Snapshot,
};

pub trait SteadyStateModel: MarkovModel {
    /// Estimators computed purely from one engine's accumulators.
    fn simulated_metrics(
        &self,
        snapshot: &Snapshot<'_, Self::State, Self::Transition>,
    ) -> MetricTable;

    /// Closed-form steady state from the fixed parameters only.
    /// Errors with UndefinedTheoreticalResult when the stability or
    /// validity precondition does not hold.
    fn theoretical_metrics(&self) -> SimResult<MetricTable>;

    /// Which simulated metric lines up with which theoretical one.
    fn comparison_keys(&self) -> Vec<ComparisonKey>;
}
