//! Environment-driven configuration for the service and the scoring engine.

use std::env;

use anyhow::Context as _;

use crate::zone_model::MinHrPolicy;

/// Service-level configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    /// Base path for the published scoreboard blob.
    pub scoreboard_path: String,
    /// Token echoed during the webhook subscription handshake.
    pub webhook_verify_token: String,
    pub strava_client_id: String,
    pub strava_client_secret: String,
    pub scoring: ScoringConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://docker:pg@0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse::<u16>()
                .unwrap_or(3001),
            scoreboard_path: env::var("SCOREBOARD_PATH")
                .unwrap_or_else(|_| "./scoreboard".to_string()),
            webhook_verify_token: env::var("STRAVA_VERIFY_TOKEN")
                .unwrap_or_else(|_| "dev-verify-token".to_string()),
            strava_client_id: env::var("STRAVA_CLIENT_ID").unwrap_or_default(),
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET").unwrap_or_default(),
            scoring: ScoringConfig::from_env()?,
        })
    }
}

/// Competition constants. All of these are fixed for a season; the min-HR
/// floor is a policy choice rather than a derived value.
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    /// Maximum score a single day can contribute.
    pub daily_cap: f64,
    /// Maximum score a single week can contribute.
    pub weekly_cap: f64,
    /// Seasonal top-up budget for under-performing completed weeks.
    pub pto_budget: f64,
    /// ISO week number the competition starts in.
    pub season_start_week: u8,
    pub min_hr_policy: MinHrPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            daily_cap: 50.0,
            weekly_cap: 150.0,
            pto_budget: 600.0,
            season_start_week: 44,
            min_hr_policy: MinHrPolicy::default(),
        }
    }
}

impl ScoringConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let min_hr_policy = match env::var("MIN_HR_POLICY") {
            Ok(raw) => raw
                .parse::<MinHrPolicy>()
                .map_err(anyhow::Error::msg)
                .context("MIN_HR_POLICY is not a valid policy")?,
            Err(_) => defaults.min_hr_policy,
        };
        Ok(Self {
            daily_cap: env_f64("DAILY_CAP", defaults.daily_cap),
            weekly_cap: env_f64("WEEKLY_CAP", defaults.weekly_cap),
            pto_budget: env_f64("PTO_BUDGET", defaults.pto_budget),
            season_start_week: env::var("SEASON_START_WEEK")
                .ok()
                .and_then(|v| v.parse::<u8>().ok())
                .unwrap_or(defaults.season_start_week),
            min_hr_policy,
        })
    }

    pub fn season_policy(&self) -> crate::normalizer::SeasonPolicy {
        crate::normalizer::SeasonPolicy {
            daily_cap: self.daily_cap,
            weekly_cap: self.weekly_cap,
            pto_budget: self.pto_budget,
            start_week: self.season_start_week,
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(default)
}
