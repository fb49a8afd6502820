//! Strava webhook surface: subscription verification and event reception.

use axum::{Extension, extract::Query, response::Json};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    activity_queue::EventQueue, config::AppConfig, errors::AppError, models::WebhookEvent,
};

/// Query parameters of the subscription verification handshake.
#[derive(Debug, Deserialize)]
pub struct VerificationQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
}

/// Answer the subscription verification handshake.
#[utoipa::path(
    get,
    path = "/webhook",
    tag = "webhook",
    responses(
        (status = 200, description = "Subscription verified, challenge echoed"),
        (status = 403, description = "Verify token mismatch")
    )
)]
pub async fn verify_webhook(
    Extension(config): Extension<AppConfig>,
    Query(query): Query<VerificationQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    if query.mode.as_deref() == Some("subscribe")
        && query.verify_token.as_deref() == Some(config.webhook_verify_token.as_str())
    {
        info!("Webhook subscription verified");
        Ok(Json(json!({
            "hub.challenge": query.challenge.unwrap_or_default(),
        })))
    } else {
        warn!("Webhook verification failed");
        Err(AppError::Forbidden)
    }
}

/// Receive an event and acknowledge immediately; processing happens on
/// the queue. The source retries deliveries that are not acknowledged
/// quickly, so nothing slow may run here.
#[utoipa::path(
    post,
    path = "/webhook",
    tag = "webhook",
    responses(
        (status = 200, description = "Event queued for processing")
    )
)]
pub async fn receive_webhook(
    Extension(queue): Extension<EventQueue>,
    Json(event): Json<WebhookEvent>,
) -> Result<&'static str, AppError> {
    info!(
        "Received {} {} event for owner {}",
        event.object_type, event.aspect_type, event.owner_id
    );
    queue.submit(event)?;
    Ok("EVENT_RECEIVED")
}
