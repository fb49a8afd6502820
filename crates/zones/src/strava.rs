//! Strava as the activity source collaborator.
//!
//! Everything OAuth-shaped lives here: the scoring core only ever sees
//! the `ActivitySource` trait. Token refresh happens transparently on
//! fetch, with rotated tokens written back to the credential store.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use time::Date;
use tracing::info;

use crate::database::Database;
use crate::models::{Credentials, DATE_FORMAT};

const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
const STRAVA_TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// Refresh tokens slightly before they expire to avoid racing the clock.
const TOKEN_REFRESH_BUFFER_SECONDS: i64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("No stored credentials for athlete {0}")]
    MissingCredentials(i64),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("Activity source returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Credential store error: {0}")]
    Store(String),
}

/// Activity metadata as reported by the source.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivitySummary {
    pub elapsed_time: f64,
    pub sport_type: String,
    /// ISO-8601 timestamp in the athlete's local time.
    pub start_date_local: String,
}

impl ActivitySummary {
    /// The activity's local calendar day, from the date portion of the
    /// local start timestamp.
    pub fn local_date(&self) -> Option<Date> {
        let head = self.start_date_local.get(..10)?;
        Date::parse(head, DATE_FORMAT).ok()
    }
}

/// Heart-rate samples with the optional parallel time channel.
#[derive(Debug, Clone, Default)]
pub struct HrStream {
    pub heartrate: Vec<f64>,
    /// Whole seconds since activity start, non-decreasing. Absent for
    /// devices that only report the sample sequence.
    pub time: Option<Vec<i64>>,
}

/// Narrow interface the ingestion step consumes. Retries and backoff are
/// the implementation's concern, not the core's.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    async fn fetch_activity(
        &self,
        athlete_id: i64,
        activity_id: i64,
    ) -> Result<(ActivitySummary, HrStream), SourceError>;
}

pub struct StravaClient {
    http: Client,
    db: Database,
    client_id: String,
    client_secret: String,
}

impl StravaClient {
    pub fn new(db: Database, client_id: String, client_secret: String) -> Self {
        Self {
            http: Client::new(),
            db,
            client_id,
            client_secret,
        }
    }

    /// Returns a usable access token, refreshing and persisting the
    /// rotated credentials when the stored ones are about to expire.
    async fn access_token(&self, athlete_id: i64) -> Result<String, SourceError> {
        let credentials = self
            .db
            .get_credentials(athlete_id)
            .await
            .map_err(|e| SourceError::Store(e.to_string()))?
            .ok_or(SourceError::MissingCredentials(athlete_id))?;

        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        if credentials.expires_at - TOKEN_REFRESH_BUFFER_SECONDS > now {
            return Ok(credentials.access_token);
        }

        info!("Access token for athlete {athlete_id} is expired, refreshing");
        let refreshed = self.refresh_token(&credentials).await?;
        self.db
            .save_credentials(athlete_id, &refreshed)
            .await
            .map_err(|e| SourceError::Store(e.to_string()))?;

        Ok(refreshed.access_token)
    }

    async fn refresh_token(&self, credentials: &Credentials) -> Result<Credentials, SourceError> {
        let response = self
            .http
            .post(STRAVA_TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", credentials.refresh_token.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::TokenRefresh(format!("{status}: {body}")));
        }

        let token: TokenResponse = response.json().await?;
        Ok(Credentials {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: token.expires_at,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api { status, body });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ActivitySource for StravaClient {
    async fn fetch_activity(
        &self,
        athlete_id: i64,
        activity_id: i64,
    ) -> Result<(ActivitySummary, HrStream), SourceError> {
        let token = self.access_token(athlete_id).await?;

        let summary: ActivitySummary = self
            .get_json(
                &format!("{STRAVA_API_BASE}/activities/{activity_id}"),
                &token,
                &[],
            )
            .await?;

        let streams: StreamsResponse = self
            .get_json(
                &format!("{STRAVA_API_BASE}/activities/{activity_id}/streams"),
                &token,
                &[("keys", "heartrate,time"), ("key_by_type", "true")],
            )
            .await?;

        let stream = HrStream {
            heartrate: streams.heartrate.map(|s| s.data).unwrap_or_default(),
            time: streams.time.map(|s| s.data),
        };

        Ok((summary, stream))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    heartrate: Option<Stream<f64>>,
    time: Option<Stream<i64>>,
}

#[derive(Debug, Deserialize)]
struct Stream<T> {
    data: Vec<T>,
}
