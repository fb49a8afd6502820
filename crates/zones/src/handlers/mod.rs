//! HTTP request handlers for the zones API.
//!
//! This module re-exports handlers from focused submodules organized by domain.

pub mod athletes;
pub mod scoreboard;
pub mod stats;
pub mod webhook;

// Re-export handlers from submodules (including utoipa __path types for OpenAPI)
pub use athletes::{
    __path_list_athletes, __path_onboard_athlete, __path_remove_athlete, AthleteSummary,
    OnboardAthleteRequest, list_athletes, onboard_athlete, remove_athlete,
};
pub use scoreboard::{
    __path_get_scoreboard, __path_rebuild_scoreboard, get_scoreboard, rebuild_scoreboard,
};
pub use stats::{__path_get_stats, __path_health_check, get_stats, health_check};
pub use webhook::{
    __path_receive_webhook, __path_verify_webhook, VerificationQuery, receive_webhook,
    verify_webhook,
};
