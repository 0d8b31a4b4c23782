//! Scenario configuration loading.

use ctmc_core::config::{QueueScenario, SimConfig};

#[test]
fn bundled_scenarios_load() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/scenarios.json");
    let config = SimConfig::load(path).unwrap();
    assert_eq!(config.seed, 42);
    assert_eq!(config.queue, QueueScenario::default());
    assert!(config.queue.model().is_ok());
    assert!(config.repair.model().is_ok());
    assert!(config.traffic.params().validate().is_ok());
}

#[test]
fn missing_sections_fall_back_to_defaults() {
    let config = SimConfig::from_json(r#"{ "seed": 7, "queue": { "servers": 3 } }"#).unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.queue.servers, 3);
    assert_eq!(config.queue.arrival_rate, 1.0);
    assert_eq!(config.repair.machines, 3);
    assert_eq!(config.traffic.green_max, 6);
}

#[test]
fn invalid_values_surface_when_building_models() {
    let config = SimConfig::from_json(r#"{ "queue": { "service_rate": 0.0 } }"#).unwrap();
    assert!(config.queue.model().is_err());
}

#[test]
fn missing_file_is_an_error() {
    let err = SimConfig::load("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("Cannot read"));
}

#[test]
fn test_defaults_use_short_horizons() {
    let config = SimConfig::default_test();
    assert_eq!(config.seed, 42);
    assert!(config.queue.horizon < QueueScenario::default().horizon);
}
