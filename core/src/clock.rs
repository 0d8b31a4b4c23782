//! Simulation clock — owns continuous time and the run horizon.

use crate::{
    error::{require_positive, SimResult},
    types::SimTime,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SimClock {
    pub current_time: SimTime,
    pub horizon:      SimTime,
}

impl SimClock {
    pub fn new(horizon: SimTime) -> SimResult<Self> {
        require_positive("horizon", horizon)?;
        Ok(Self { current_time: 0.0, horizon })
    }

    /// Time left before the horizon.
    pub fn remaining(&self) -> SimTime {
        self.horizon - self.current_time
    }

    pub fn is_terminal(&self) -> bool {
        self.current_time >= self.horizon
    }

    /// Clamp a candidate event time to the horizon.
    /// Returns the clamped time and whether truncation happened.
    pub fn clamp(&self, candidate: SimTime) -> (SimTime, bool) {
        if candidate >= self.horizon {
            (self.horizon, true)
        } else {
            (candidate, false)
        }
    }

    /// Move time forward. Panics if asked to go backwards or past
    /// the horizon — callers must clamp first.
    pub fn advance_to(&mut self, t: SimTime) {
        assert!(t >= self.current_time, "advance_to() would move time backwards");
        assert!(t <= self.horizon, "advance_to() past the horizon");
        self.current_time = t;
    }
}
