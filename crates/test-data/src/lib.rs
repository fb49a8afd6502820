//! Test data generation for zone-leader.
//!
//! This crate provides tools for generating realistic athletes, heart-rate
//! streams, and activity zone records to support manual verification and
//! integration testing.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_data::prelude::*;
//!
//! let mut rng = rand::thread_rng();
//! let athletes = AthleteGenerator::new().generate_many(&mut rng, 10);
//! let activities = ActivityGenerator::new(42)
//!     .season(&athletes[0], today, 6, &mut rng);
//! Seeder::new(pool).seed(&athletes, &activities).await?;
//! ```

pub mod config;
pub mod db;
pub mod generators;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::SeedConfig;
    pub use crate::db::Seeder;
    pub use crate::generators::{
        ActivityGenerator, AthleteGenerator, GeneratedActivity, GeneratedAthlete,
        HrStreamGenerator, StreamConfig,
    };
}
