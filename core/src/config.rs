//! Scenario configuration.
//!
//! Loaded from a JSON file (see `data/scenarios.json`). Any missing
//! section falls back to the classroom defaults. In tests, use
//! SimConfig::default_test().

use crate::{
    error::SimResult,
    queue_model::QueueModel,
    repair_model::RepairModel,
    traffic::TrafficParams,
    types::SimTime,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct QueueScenario {
    pub arrival_rate: f64,
    pub service_rate: f64,
    pub servers:      u32,
    pub horizon:      SimTime,
}

impl Default for QueueScenario {
    fn default() -> Self {
        Self {
            arrival_rate: 1.0,
            service_rate: 1.5,
            servers:      1,
            horizon:      100.0,
        }
    }
}

impl QueueScenario {
    pub fn model(&self) -> SimResult<QueueModel> {
        QueueModel::new(self.arrival_rate, self.service_rate, self.servers)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RepairScenario {
    pub machines:     u32,
    pub failure_rate: f64,
    pub repair_rate:  f64,
    pub teams:        u32,
    pub horizon:      SimTime,
}

impl Default for RepairScenario {
    fn default() -> Self {
        Self {
            machines:     3,
            failure_rate: 0.2,
            repair_rate:  0.5,
            teams:        1,
            horizon:      100.0,
        }
    }
}

impl RepairScenario {
    pub fn model(&self) -> SimResult<RepairModel> {
        RepairModel::new(self.machines, self.failure_rate, self.repair_rate, self.teams)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrafficScenario {
    pub green_min:  u64,
    pub green_max:  u64,
    pub spawn_rate: u64,
    pub ticks:      u64,
}

impl Default for TrafficScenario {
    fn default() -> Self {
        Self {
            green_min:  3,
            green_max:  6,
            spawn_rate: 5,
            ticks:      600,
        }
    }
}

impl TrafficScenario {
    pub fn params(&self) -> TrafficParams {
        TrafficParams {
            green_min:  self.green_min,
            green_max:  self.green_max,
            spawn_rate: self.spawn_rate,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub seed:    u64,
    pub queue:   QueueScenario,
    pub repair:  RepairScenario,
    pub traffic: TrafficScenario,
}

impl SimConfig {
    /// Load from a scenario file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        Self::from_json(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: SimConfig = serde_json::from_str(content)?;
        log::debug!("scenario config loaded: seed={}", config.seed);
        Ok(config)
    }

    /// Short horizons and a fixed seed for unit tests.
    pub fn default_test() -> Self {
        Self {
            seed:    42,
            queue:   QueueScenario { horizon: 50.0, ..QueueScenario::default() },
            repair:  RepairScenario { horizon: 50.0, ..RepairScenario::default() },
            traffic: TrafficScenario { ticks: 120, ..TrafficScenario::default() },
        }
    }
}
