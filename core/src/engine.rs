//! The CTMC event engine — the heart of the simulation core.
//!
//! STEP ORDER (fixed, documented, never reordered):
//!   1. Rate vector for the current state
//!   2. Total rate; zero means absorbing, return without mutating
//!   3. Exponential holding time, clamped to the horizon
//!   4. Time-weighted accumulators, weighted by the state being LEFT
//!   5. Horizon truncation: record final sample, stop, no transition
//!   6. Transition choice by cumulative rate share, apply, record, count
//!   7. Report the new time and state
//!
//! RULES:
//!   - One engine is one single-writer state machine.
//!   - The model's parameters never change during a run; build a new
//!     engine instead.
//!   - All randomness flows through the engine's own StreamRng.
//!   - Only step() mutates the accumulators.

use crate::{
    analysis::SteadyStateModel,
    clock::SimClock,
    error::SimResult,
    event::{Sample, StepOutcome, TerminalReason},
    metrics::{compare, Comparison, MetricTable},
    model::MarkovModel,
    rng::{SeedBank, StreamRng},
    snapshot::Snapshot,
    types::{SimTime, StateKey},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// Running totals owned by one engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Accumulators<S, T: Ord> {
    /// Time spent in each visited state.
    pub time_in_state: BTreeMap<StateKey, SimTime>,
    /// Integral of the model's level (queue length, failed units) over time.
    pub level_area:    f64,
    /// Integral of busy servers / busy teams over time.
    pub busy_area:     f64,
    pub event_counts:  BTreeMap<T, u64>,
    pub history:       Vec<Sample<S>>,
}

impl<S, T: Ord> Default for Accumulators<S, T> {
    fn default() -> Self {
        Self {
            time_in_state: BTreeMap::new(),
            level_area:    0.0,
            busy_area:     0.0,
            event_counts:  BTreeMap::new(),
            history:       Vec::new(),
        }
    }
}

pub struct CtmcEngine<M: MarkovModel> {
    model: M,
    clock: SimClock,
    state: M::State,
    acc:   Accumulators<M::State, M::Transition>,
    rng:   StreamRng,
}

impl<M: MarkovModel> CtmcEngine<M> {
    /// Build an engine on stream 0 of `seed`.
    pub fn new(model: M, horizon: SimTime, seed: u64) -> SimResult<Self> {
        Self::with_rng(model, horizon, SeedBank::new(seed).stream(0))
    }

    /// Build an engine on an explicit stream. Used by replication sweeps.
    pub fn with_rng(model: M, horizon: SimTime, rng: StreamRng) -> SimResult<Self> {
        model.validate()?;
        let clock = SimClock::new(horizon)?;
        let state = model.initial_state();
        log::debug!(
            "engine created: model={} horizon={horizon} rng={}",
            model.label(),
            rng.name
        );
        Ok(Self {
            model,
            clock,
            state,
            acc: Accumulators::default(),
            rng,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn state(&self) -> &M::State {
        &self.state
    }

    pub fn current_time(&self) -> SimTime {
        self.clock.current_time
    }

    pub fn horizon(&self) -> SimTime {
        self.clock.horizon
    }

    /// True when the next step() would return Terminal.
    pub fn is_terminal(&self) -> bool {
        self.clock.is_terminal() || self.model.rates(&self.state).total() <= 0.0
    }

    /// Advance by exactly one CTMC event, or report why no event can fire.
    pub fn step(&mut self) -> StepOutcome<M::State, M::Transition> {
        if self.clock.is_terminal() {
            return StepOutcome::Terminal { reason: TerminalReason::HorizonReached };
        }

        let rates = self.model.rates(&self.state);
        let total_rate = rates.total();
        if total_rate <= 0.0 {
            log::debug!(
                "t={:.4} absorbing state {:?}",
                self.clock.current_time,
                self.state
            );
            return StepOutcome::Terminal { reason: TerminalReason::Absorbing };
        }

        let dt = self.rng.exponential(total_rate);
        let (next_time, truncated) = self.clock.clamp(self.clock.current_time + dt);
        self.accumulate(next_time - self.clock.current_time);

        if truncated {
            self.acc.history.push(Sample { time: next_time, state: self.state.clone() });
            self.clock.advance_to(next_time);
            log::debug!("horizon {next_time} reached in state {:?}", self.state);
            return StepOutcome::Terminal { reason: TerminalReason::HorizonReached };
        }

        let u = self.rng.next_f64();
        let transition = match rates.choose(u) {
            Some(t) => t,
            None => return StepOutcome::Terminal { reason: TerminalReason::Absorbing },
        };
        self.model.apply(&mut self.state, transition);
        self.acc.history.push(Sample { time: next_time, state: self.state.clone() });
        *self.acc.event_counts.entry(transition).or_insert(0) += 1;
        self.clock.advance_to(next_time);

        log::trace!("t={next_time:.4} {transition:?} -> {:?}", self.state);

        StepOutcome::Advanced {
            time: next_time,
            state: self.state.clone(),
            transition,
        }
    }

    /// Step until Terminal. Returns the number of transitions applied.
    pub fn run_to_horizon(&mut self) -> u64 {
        let mut transitions = 0;
        while !self.step().is_terminal() {
            transitions += 1;
        }
        transitions
    }

    /// Read-only view of time, state and running totals.
    pub fn snapshot(&self) -> Snapshot<'_, M::State, M::Transition> {
        Snapshot {
            time:         self.clock.current_time,
            horizon:      self.clock.horizon,
            state:        &self.state,
            accumulators: &self.acc,
        }
    }

    /// The recorded trajectory. Each call starts from the first sample.
    pub fn history(&self) -> std::slice::Iter<'_, Sample<M::State>> {
        self.acc.history.iter()
    }

    fn accumulate(&mut self, dt: SimTime) {
        let key = self.model.state_key(&self.state);
        *self.acc.time_in_state.entry(key).or_insert(0.0) += dt;
        self.acc.level_area += self.model.level(&self.state) as f64 * dt;
        self.acc.busy_area += self.model.busy(&self.state) as f64 * dt;
    }
}

impl<M: SteadyStateModel> CtmcEngine<M> {
    pub fn simulated_metrics(&self) -> MetricTable {
        self.model.simulated_metrics(&self.snapshot())
    }

    pub fn theoretical_metrics(&self) -> SimResult<MetricTable> {
        self.model.theoretical_metrics()
    }

    /// Simulated against theoretical, or the reason theory does not apply.
    pub fn comparison(&self) -> Comparison {
        match self.model.theoretical_metrics() {
            Ok(theoretical) => Comparison::Rows {
                rows: compare(
                    &self.simulated_metrics(),
                    &theoretical,
                    &self.model.comparison_keys(),
                ),
            },
            Err(e) => Comparison::NotApplicable { reason: e.to_string() },
        }
    }
}
