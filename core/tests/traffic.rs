//! Traffic-signal arrival/departure bookkeeping.

use ctmc_core::{
    config::TrafficScenario,
    rng::SeedBank,
    traffic::{Approach, TrafficCollector},
};

fn collector(spawn_rate: u64, seed: u64) -> TrafficCollector {
    let params = TrafficScenario { spawn_rate, ..TrafficScenario::default() }.params();
    TrafficCollector::new(params, SeedBank::new(seed).stream(0)).unwrap()
}

#[test]
fn cars_are_conserved() {
    let mut t = collector(10, 4);
    t.run(1_000);
    let m = t.metrics();

    let arrivals = m.get("arrivals").unwrap();
    let departures = m.get("departures").unwrap();
    let queued = m.get("queued").unwrap();
    assert_eq!(arrivals, departures + queued);
    assert_eq!(arrivals, 1_000.0, "spawn_rate 10 means one car per tick");

    let per_approach: u64 = Approach::ALL
        .iter()
        .map(|a| t.approach_stats(*a).arrivals)
        .sum();
    assert_eq!(per_approach as f64, arrivals);
}

#[test]
fn light_traffic_rarely_waits() {
    let mut t = collector(1, 8);
    t.run(2_000);
    let m = t.metrics();
    // One car every 10 ticks; a red phase lasts at most 6 ticks.
    assert!(m.get("mean_wait").unwrap() <= 6.0);
    assert!(m.get("mean_queue_length").unwrap() < 1.0);
}

#[test]
fn same_seed_same_statistics() {
    let mut a = collector(7, 99);
    let mut b = collector(7, 99);
    a.run(500);
    b.run(500);
    assert_eq!(a.metrics(), b.metrics());
}

#[test]
fn no_departures_means_no_mean_wait() {
    let t = collector(5, 1);
    let m = t.metrics();
    assert_eq!(m.get("mean_wait"), None);
    assert_eq!(m.get("ticks"), Some(0.0));
}
