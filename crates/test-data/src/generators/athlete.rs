//! Athlete generation with plausible heart-rate profiles.

use fake::{Fake, faker::name::en::Name};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use zones::models::HeartRateProfile;

/// Generated athlete data ready for database insertion.
#[derive(Debug, Clone)]
pub struct GeneratedAthlete {
    pub id: i64,
    pub name: String,
    pub resting_hr: i32,
    pub max_hr: i32,
}

impl GeneratedAthlete {
    pub fn profile(&self) -> HeartRateProfile {
        HeartRateProfile {
            resting_hr: self.resting_hr,
            max_hr: self.max_hr,
        }
    }
}

/// Configuration for athlete generation.
#[derive(Debug, Clone)]
pub struct AthleteGenConfig {
    /// Mean resting heart rate.
    pub resting_mean: f64,
    /// Standard deviation of resting heart rate.
    pub resting_std: f64,
    /// Mean max heart rate.
    pub max_mean: f64,
    /// Standard deviation of max heart rate.
    pub max_std: f64,
}

impl Default for AthleteGenConfig {
    fn default() -> Self {
        // Approximate adult recreational-athlete physiology
        Self {
            resting_mean: 58.0,
            resting_std: 8.0,
            max_mean: 185.0,
            max_std: 10.0,
        }
    }
}

/// Generates realistic athlete data for testing.
pub struct AthleteGenerator {
    config: AthleteGenConfig,
}

impl AthleteGenerator {
    pub fn new() -> Self {
        Self {
            config: AthleteGenConfig::default(),
        }
    }

    pub fn with_config(config: AthleteGenConfig) -> Self {
        Self { config }
    }

    /// Generates one athlete. The profile is always valid: max strictly
    /// above resting with a workable reserve.
    pub fn generate(&self, rng: &mut impl Rng, id: i64) -> GeneratedAthlete {
        let resting_dist = Normal::new(self.config.resting_mean, self.config.resting_std).unwrap();
        let max_dist = Normal::new(self.config.max_mean, self.config.max_std).unwrap();

        let resting_hr = (resting_dist.sample(rng).round() as i32).clamp(40, 80);
        let max_hr = (max_dist.sample(rng).round() as i32).clamp(resting_hr + 60, 220);

        GeneratedAthlete {
            id,
            name: Name().fake_with_rng(rng),
            resting_hr,
            max_hr,
        }
    }

    pub fn generate_many(&self, rng: &mut impl Rng, count: usize) -> Vec<GeneratedAthlete> {
        (0..count)
            .map(|i| self.generate(rng, 1_000_000 + i as i64))
            .collect()
    }
}

impl Default for AthleteGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_profiles_are_always_valid() {
        let mut rng = rand::thread_rng();
        let generator = AthleteGenerator::new();
        for athlete in generator.generate_many(&mut rng, 100) {
            assert!(athlete.resting_hr > 0);
            assert!(
                athlete.max_hr > athlete.resting_hr,
                "degenerate profile: {} / {}",
                athlete.resting_hr,
                athlete.max_hr
            );
            assert!(!athlete.name.is_empty());
        }
    }
}
