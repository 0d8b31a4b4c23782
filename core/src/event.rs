//! Step outcomes and history samples emitted by the engine.

use crate::types::SimTime;
use serde::{Deserialize, Serialize};

/// Why the engine stopped producing events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// `current_time` reached the horizon.
    HorizonReached,
    /// Every competing rate is zero; the chain can never leave this state.
    Absorbing,
}

/// Result of one `step()` call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepOutcome<S, T> {
    Advanced {
        time:       SimTime,
        state:      S,
        transition: T,
    },
    Terminal {
        reason: TerminalReason,
    },
}

impl<S, T> StepOutcome<S, T> {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepOutcome::Terminal { .. })
    }
}

/// One recorded `(time, state)` point of the trajectory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample<S> {
    pub time:  SimTime,
    pub state: S,
}
