//! Generators for athletes, heart-rate streams, and activity records.

mod activity;
mod athlete;
mod hr_stream;

pub use activity::{ActivityGenerator, GeneratedActivity};
pub use athlete::{AthleteGenConfig, AthleteGenerator, GeneratedAthlete};
pub use hr_stream::{HrStreamGenerator, StreamConfig};
