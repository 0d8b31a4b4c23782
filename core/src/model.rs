//! The rate-model trait and the competing-transition rate vector.
//!
//! RULE: Every modeled system implements MarkovModel.
//! The engine asks the model for a fresh rate vector at every step
//! and never caches it: rates depend only on the current state and
//! the model's fixed parameters.

use crate::{
    error::SimResult,
    types::StateKey,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt::Debug;

/// Variant tag for the two families of models the engine runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Queue,
    Population,
}

/// The contract every CTMC model must fulfill.
pub trait MarkovModel {
    type State: Clone + Debug + PartialEq + Serialize + DeserializeOwned;
    type Transition: Copy + Debug + Ord + Serialize + DeserializeOwned;

    fn kind(&self) -> ModelKind;

    /// Short label for logs and reports, e.g. "M/M/2".
    fn label(&self) -> String;

    /// Check every fixed parameter. The engine refuses to start otherwise.
    fn validate(&self) -> SimResult<()>;

    fn initial_state(&self) -> Self::State;

    /// Instantaneous rate of every transition out of `state`.
    fn rates(&self, state: &Self::State) -> RateVector<Self::Transition>;

    /// Apply a transition that the rate vector allowed.
    fn apply(&self, state: &mut Self::State, transition: Self::Transition);

    fn state_key(&self, state: &Self::State) -> StateKey;

    /// The level tracked by the time-weighted area: queue length, or
    /// failed units.
    fn level(&self, state: &Self::State) -> u64;

    /// Busy servers, or busy repair teams.
    fn busy(&self, state: &Self::State) -> u64;
}

/// Rates of the competing exponential clocks out of one state.
#[derive(Debug, Clone, PartialEq)]
pub struct RateVector<T> {
    entries: Vec<(T, f64)>,
}

impl<T: Copy> RateVector<T> {
    pub fn new() -> Self {
        Self { entries: Vec::with_capacity(2) }
    }

    /// Add a competing transition. Rates must be finite and >= 0.
    pub fn push(&mut self, transition: T, rate: f64) {
        debug_assert!(rate.is_finite() && rate >= 0.0, "bad rate {rate}");
        self.entries.push((transition, rate));
    }

    pub fn with(mut self, transition: T, rate: f64) -> Self {
        self.push(transition, rate);
        self
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, r)| r).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(T, f64)> {
        self.entries.iter()
    }

    pub fn rate_of(&self, transition: T) -> f64
    where
        T: PartialEq,
    {
        self.entries
            .iter()
            .filter(|(t, _)| *t == transition)
            .map(|(_, r)| r)
            .sum()
    }

    /// Pick the transition whose cumulative share of the total rate first
    /// exceeds `u` in [0, 1). Zero-rate entries can never fire.
    /// Returns None only when the total rate is zero.
    pub fn choose(&self, u: f64) -> Option<T> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        let target = u * total;
        let mut cumulative = 0.0;
        for (transition, rate) in &self.entries {
            cumulative += rate;
            if target < cumulative {
                return Some(*transition);
            }
        }
        // Rounding can leave target == cumulative at the very end.
        self.entries
            .iter()
            .rev()
            .find(|(_, r)| *r > 0.0)
            .map(|(t, _)| *t)
    }
}

impl<T: Copy> Default for RateVector<T> {
    fn default() -> Self { Self::new() }
}
