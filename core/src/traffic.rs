//! Signalised crossroad as a discrete-time arrival/departure collector.
//!
//! One tick is one second of signal time. Cars join a FIFO lane per
//! approach and the head of every green lane leaves each tick. Car
//! positions, motion and collisions are not modeled.

use crate::{
    error::{SimError, SimResult},
    metrics::MetricTable,
    rng::StreamRng,
};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub type TrafficTick = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Approach {
    /// North to south.
    Ns,
    /// South to north.
    Sn,
    /// East to west.
    Ew,
    /// West to east.
    We,
}

impl Approach {
    pub const ALL: [Approach; 4] = [Approach::Ns, Approach::Sn, Approach::Ew, Approach::We];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ns => "ns",
            Self::Sn => "sn",
            Self::Ew => "ew",
            Self::We => "we",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalPhase {
    NorthSouthGreen,
    EastWestGreen,
}

impl SignalPhase {
    pub fn is_green(&self, approach: Approach) -> bool {
        match self {
            Self::NorthSouthGreen => matches!(approach, Approach::Ns | Approach::Sn),
            Self::EastWestGreen   => matches!(approach, Approach::Ew | Approach::We),
        }
    }

    fn flipped(&self) -> Self {
        match self {
            Self::NorthSouthGreen => Self::EastWestGreen,
            Self::EastWestGreen   => Self::NorthSouthGreen,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrafficParams {
    /// Shortest green, in ticks.
    pub green_min:  u64,
    /// Longest green, in ticks.
    pub green_max:  u64,
    /// 1..=10; a car arrives every `11 - spawn_rate` ticks.
    pub spawn_rate: u64,
}

impl TrafficParams {
    pub fn validate(&self) -> SimResult<()> {
        if self.green_min == 0 {
            return Err(SimError::invalid("green_min", 0.0, "must be >= 1"));
        }
        if self.green_max < self.green_min {
            return Err(SimError::invalid(
                "green_max",
                self.green_max as f64,
                "must be >= green_min",
            ));
        }
        if !(1..=10).contains(&self.spawn_rate) {
            return Err(SimError::invalid(
                "spawn_rate",
                self.spawn_rate as f64,
                "must be in 1..=10",
            ));
        }
        Ok(())
    }

    pub fn spawn_interval(&self) -> u64 {
        11 - self.spawn_rate
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApproachStats {
    pub arrivals:   u64,
    pub departures: u64,
    /// Sum of ticks waited by departed cars.
    pub total_wait: u64,
    pub max_queue:  u64,
}

/// What happened during one tick.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TickReport {
    pub tick:         TrafficTick,
    pub phase:        SignalPhase,
    pub phase_switch: bool,
    pub arrival:      Option<Approach>,
    pub departures:   Vec<Approach>,
}

pub struct TrafficCollector {
    params:         TrafficParams,
    rng:            StreamRng,
    tick:           TrafficTick,
    phase:          SignalPhase,
    timer:          u64,
    duration:       u64,
    spawn_counter:  u64,
    lanes:          [VecDeque<TrafficTick>; 4],
    stats:          [ApproachStats; 4],
    queue_area:     u64,
    phase_switches: u64,
}

impl TrafficCollector {
    pub fn new(params: TrafficParams, mut rng: StreamRng) -> SimResult<Self> {
        params.validate()?;
        let duration = rng.next_u64_between(params.green_min, params.green_max);
        Ok(Self {
            params,
            rng,
            tick:           0,
            phase:          SignalPhase::NorthSouthGreen,
            timer:          0,
            duration,
            spawn_counter:  0,
            lanes:          Default::default(),
            stats:          [ApproachStats::default(); 4],
            queue_area:     0,
            phase_switches: 0,
        })
    }

    pub fn current_tick(&self) -> TrafficTick {
        self.tick
    }

    pub fn phase(&self) -> SignalPhase {
        self.phase
    }

    pub fn queue_length(&self, approach: Approach) -> u64 {
        self.lanes[approach.index()].len() as u64
    }

    pub fn queued_total(&self) -> u64 {
        self.lanes.iter().map(|l| l.len() as u64).sum()
    }

    pub fn approach_stats(&self, approach: Approach) -> ApproachStats {
        self.stats[approach.index()]
    }

    /// Advance one tick: signal timer, arrival, then discharge.
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;

        self.timer += 1;
        let phase_switch = self.timer >= self.duration;
        if phase_switch {
            self.phase = self.phase.flipped();
            self.timer = 0;
            self.duration = self
                .rng
                .next_u64_between(self.params.green_min, self.params.green_max);
            self.phase_switches += 1;
            log::trace!("tick={} phase -> {:?} for {}", self.tick, self.phase, self.duration);
        }

        self.spawn_counter += 1;
        let arrival = if self.spawn_counter >= self.params.spawn_interval() {
            self.spawn_counter = 0;
            let approach = Approach::ALL[self.rng.next_u64_below(4) as usize];
            let i = approach.index();
            self.lanes[i].push_back(self.tick);
            self.stats[i].arrivals += 1;
            self.stats[i].max_queue = self.stats[i].max_queue.max(self.lanes[i].len() as u64);
            Some(approach)
        } else {
            None
        };

        let mut departures = Vec::new();
        for approach in Approach::ALL {
            if !self.phase.is_green(approach) {
                continue;
            }
            let i = approach.index();
            if let Some(arrived) = self.lanes[i].pop_front() {
                self.stats[i].departures += 1;
                self.stats[i].total_wait += self.tick - arrived;
                departures.push(approach);
            }
        }

        self.queue_area += self.queued_total();

        TickReport {
            tick: self.tick,
            phase: self.phase,
            phase_switch,
            arrival,
            departures,
        }
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
        log::debug!(
            "traffic ran to tick {}: {} queued, {} phase switches",
            self.tick,
            self.queued_total(),
            self.phase_switches
        );
    }

    pub fn metrics(&self) -> MetricTable {
        let mut table = MetricTable::new("Traffic intersection");
        let arrivals: u64 = self.stats.iter().map(|s| s.arrivals).sum();
        let departures: u64 = self.stats.iter().map(|s| s.departures).sum();
        let total_wait: u64 = self.stats.iter().map(|s| s.total_wait).sum();
        let ticks = (self.tick > 0).then_some(self.tick as f64);

        table.push("ticks", self.tick as f64);
        table.push("arrivals", arrivals as f64);
        table.push("departures", departures as f64);
        table.push("queued", self.queued_total() as f64);
        table.push("phase_switches", self.phase_switches as f64);
        table.push_opt(
            "mean_wait",
            (departures > 0).then(|| total_wait as f64 / departures as f64),
        );
        table.push_opt("mean_queue_length", ticks.map(|t| self.queue_area as f64 / t));
        table.push_opt("throughput", ticks.map(|t| departures as f64 / t));
        for approach in Approach::ALL {
            let s = self.approach_stats(approach);
            table.push(format!("arrivals_{}", approach.name()), s.arrivals as f64);
            table.push(format!("max_queue_{}", approach.name()), s.max_queue as f64);
        }
        table
    }
}
