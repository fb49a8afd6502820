//! Configuration types for test data generation.

use serde::{Deserialize, Serialize};

/// Configuration for seeding operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Number of athletes to generate.
    pub athlete_count: usize,
    /// How many weeks of history to generate, ending today.
    pub weeks: usize,
    /// Activities per athlete per week (inclusive range).
    pub activities_per_week: (usize, usize),
    /// RNG seed for reproducible data.
    pub seed: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            athlete_count: 8,
            weeks: 6,
            activities_per_week: (2, 6),
            seed: 12345,
        }
    }
}
