//! Shared primitive types used across the entire simulation.

/// Continuous simulation time. Units are whatever the rates are quoted in
/// (customers per minute, failures per hour, ...).
pub type SimTime = f64;

/// Stable integer key for a CTMC state, used to index time-in-state totals.
pub type StateKey = u64;
