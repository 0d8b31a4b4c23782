//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through StreamRng instances derived
//! from a single master seed held by a SeedBank.
//!
//! Each engine instance gets its own stream, seeded deterministically
//! from (master_seed XOR stream_index * golden_ratio). This means:
//!   - Running more replications never changes earlier replications' draws.
//!   - Each stream is fully reproducible in isolation.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// A named, deterministic RNG owned by exactly one simulation instance.
#[derive(Debug, Clone)]
pub struct StreamRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl StreamRng {
    /// Create a stream from the master seed and a stable stream index.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ stream_index.wrapping_mul(MIXING_CONSTANT);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a u64 uniformly in [lo, hi] (inclusive).
    pub fn next_u64_between(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        lo + self.next_u64_below(hi - lo + 1)
    }

    /// Exponential holding time with the given rate, by inverse transform.
    /// `1 - u` lies in (0, 1], so the logarithm is always finite.
    pub fn exponential(&mut self, rate: f64) -> f64 {
        debug_assert!(rate > 0.0, "exponential rate must be > 0");
        let u = self.next_f64();
        -(1.0 - u).ln() / rate
    }
}

/// Hands out independent streams for one run or one replication sweep.
#[derive(Debug, Clone, Copy)]
pub struct SeedBank {
    master_seed: u64,
}

impl SeedBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Stream for a stable index. Index 0 is the single-run stream.
    pub fn stream(&self, index: u64) -> StreamRng {
        StreamRng::new(self.master_seed, index)
    }
}
