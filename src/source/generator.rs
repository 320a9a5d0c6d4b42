//! Synthetic heartbeat generator.
//!
//! Produces a plausible resting rhythm around 70-85 BPM. With irregular
//! injection enabled, every 30th beat is replaced by a tachycardic,
//! bradycardic, or jittered beat.

use crate::core::model::Reading;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Beats between injected irregular beats.
pub const IRREGULAR_PERIOD: u64 = 30;

/// Infinite source of synthetic readings.
pub struct ReadingGenerator {
    rng: StdRng,
    simulate_irregular: bool,
    /// Number of beats generated so far
    heartbeats: u64,
}

impl ReadingGenerator {
    /// Create a generator seeded from system entropy.
    pub fn new(simulate_irregular: bool) -> Self {
        Self::from_rng(StdRng::from_entropy(), simulate_irregular)
    }

    /// Create a reproducible generator.
    pub fn with_seed(seed: u64, simulate_irregular: bool) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed), simulate_irregular)
    }

    fn from_rng(rng: StdRng, simulate_irregular: bool) -> Self {
        Self {
            rng,
            simulate_irregular,
            heartbeats: 0,
        }
    }

    /// Number of readings produced so far.
    pub fn heartbeats(&self) -> u64 {
        self.heartbeats
    }

    /// Generate the next beat.
    pub fn next_reading(&mut self) -> Reading {
        let base_heart_rate: i32 = 70 + self.rng.gen_range(0..15);
        let base_rr_interval = 60.0 / base_heart_rate as f64;

        let inject = self.simulate_irregular && self.heartbeats % IRREGULAR_PERIOD == 0;
        let (heart_rate, rr_interval) = if inject {
            match self.rng.gen_range(0..3) {
                0 => {
                    let rate = 100 + self.rng.gen_range(0..40);
                    (rate, 60.0 / rate as f64)
                }
                1 => {
                    let rate = 40 + self.rng.gen_range(0..20);
                    (rate, 60.0 / rate as f64)
                }
                _ => {
                    let jitter = 1.0 + 0.2 * (self.rng.gen::<f64>() - 0.5);
                    (base_heart_rate, base_rr_interval * jitter)
                }
            }
        } else {
            let rate = base_heart_rate + self.rng.gen_range(0..5) - 2;
            let jitter = 1.0 + 0.05 * (self.rng.gen::<f64>() - 0.5);
            (rate, base_rr_interval * jitter)
        };

        let qt_interval = 0.35 + 0.02 * self.rng.gen::<f64>();
        let pr_interval = 0.15 + 0.05 * self.rng.gen::<f64>();
        let qrs_interval = 0.08 + 0.02 * self.rng.gen::<f64>();

        // Occasional noisy beat
        let signal_quality = if self.rng.gen_range(0..100) < 5 {
            0.5 + 0.4 * self.rng.gen::<f64>()
        } else {
            0.9 + 0.1 * self.rng.gen::<f64>()
        };

        self.heartbeats += 1;

        Reading {
            timestamp: Utc::now(),
            heart_rate,
            rr_interval,
            qt_interval,
            pr_interval,
            qrs_interval,
            signal_quality,
        }
    }
}

impl Iterator for ReadingGenerator {
    type Item = Reading;

    fn next(&mut self) -> Option<Reading> {
        Some(self.next_reading())
    }
}
