//! Procedural heart-rate stream generation.
//!
//! Streams mimic what real devices deliver: a slowly wandering effort
//! level, per-sample jitter, occasional duplicate timestamps from
//! whole-second quantization, and auto-pause gaps.

use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use zones::models::HeartRateProfile;

/// Configuration for procedural stream generation.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Target stream duration in seconds.
    pub duration_seconds: i64,
    /// Lowest effort as a fraction of heart-rate reserve.
    pub effort_floor: f64,
    /// Highest effort as a fraction of heart-rate reserve.
    pub effort_ceiling: f64,
    /// How fast the effort level wanders (noise input scale).
    pub drift_scale: f64,
    /// Per-sample heart-rate jitter standard deviation in bpm.
    pub jitter_bpm: f64,
    /// Probability that a sample shares its timestamp with the next one.
    pub duplicate_probability: f64,
    /// Probability of inserting a pause (0.0 - 1.0).
    pub pause_probability: f64,
    /// Duration range for pauses (min, max) in seconds.
    pub pause_duration_range: (i64, i64),
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 2400,
            effort_floor: 0.35,
            effort_ceiling: 0.95,
            drift_scale: 0.004,
            jitter_bpm: 2.5,
            duplicate_probability: 0.05,
            pause_probability: 0.005,
            pause_duration_range: (30, 180),
        }
    }
}

/// Generates synthetic heart-rate streams with realistic characteristics.
pub struct HrStreamGenerator {
    config: StreamConfig,
    noise: Perlin,
}

impl HrStreamGenerator {
    pub fn new(seed: u32) -> Self {
        Self {
            config: StreamConfig::default(),
            noise: Perlin::new(seed),
        }
    }

    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_duration(mut self, seconds: i64) -> Self {
        self.config.duration_seconds = seconds;
        self
    }

    /// Generates parallel heart-rate and timestamp streams for a profile.
    /// Timestamps are whole seconds since activity start, non-decreasing.
    pub fn generate(
        &self,
        profile: &HeartRateProfile,
        rng: &mut impl Rng,
    ) -> (Vec<f64>, Vec<i64>) {
        let resting = f64::from(profile.resting_hr);
        let reserve = f64::from(profile.max_hr - profile.resting_hr);
        let jitter = Normal::new(0.0, self.config.jitter_bpm).unwrap();
        let effort_span = self.config.effort_ceiling - self.config.effort_floor;

        let mut hr = Vec::new();
        let mut timestamps = Vec::new();
        let mut t: i64 = 0;

        while t < self.config.duration_seconds {
            // Perlin output is in [-1, 1]; map to the effort band.
            let wander = self.noise.get([t as f64 * self.config.drift_scale, 0.0]);
            let effort = self.config.effort_floor + effort_span * (wander + 1.0) / 2.0;
            let sample = (resting + effort * reserve + jitter.sample(rng))
                .clamp(resting * 0.8, f64::from(profile.max_hr));

            hr.push(sample);
            timestamps.push(t);

            if rng.gen_bool(self.config.duplicate_probability) {
                // Quantization burst: a second sample lands on this second.
                hr.push((sample + jitter.sample(rng)).clamp(resting * 0.8, f64::from(profile.max_hr)));
                timestamps.push(t);
            }

            t += if rng.gen_bool(self.config.pause_probability) {
                rng.gen_range(self.config.pause_duration_range.0..=self.config.pause_duration_range.1)
            } else {
                1
            };
        }

        (hr, timestamps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> HeartRateProfile {
        HeartRateProfile {
            resting_hr: 60,
            max_hr: 180,
        }
    }

    #[test]
    fn timestamps_are_non_decreasing_and_parallel() {
        let mut rng = rand::thread_rng();
        let (hr, timestamps) = HrStreamGenerator::new(7).generate(&profile(), &mut rng);

        assert_eq!(hr.len(), timestamps.len());
        assert!(!hr.is_empty());
        for pair in timestamps.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn samples_stay_within_physiological_bounds() {
        let mut rng = rand::thread_rng();
        let (hr, _) = HrStreamGenerator::new(7).generate(&profile(), &mut rng);
        for &sample in &hr {
            assert!(sample >= 48.0, "below plausible floor: {sample}");
            assert!(sample <= 180.0, "above max: {sample}");
        }
    }
}
