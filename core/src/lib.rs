//! Continuous-time Markov chain teaching simulations.
//!
//! One event engine drives two model families, an M/M/c queue and a
//! finite machine-repair birth–death process, and reports simulated
//! estimators next to their closed-form steady state. A discrete-time
//! traffic-signal collector rounds out the demos.

pub mod analysis;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod metrics;
pub mod model;
pub mod queue_model;
pub mod repair_model;
pub mod rng;
pub mod snapshot;
pub mod stats;
pub mod sweep;
pub mod theory;
pub mod traffic;
pub mod types;

pub use engine::CtmcEngine;
pub use error::{SimError, SimResult};
pub use queue_model::{QueueEvent, QueueModel, QueueState};
pub use repair_model::{PopulationEvent, PopulationState, RepairModel};
