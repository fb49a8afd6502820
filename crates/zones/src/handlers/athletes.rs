//! Athlete onboarding and removal (admin surface).

use axum::{Extension, extract::Path, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::AdminUser,
    database::Database,
    errors::AppError,
    models::{Athlete, Credentials},
    zone_model::{MinHrPolicy, ZoneBoundaries},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct OnboardAthleteRequest {
    pub athlete_id: i64,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,
    #[validate(range(min = 20, max = 120, message = "Resting heart rate out of range"))]
    pub resting_hr: i32,
    #[validate(range(min = 80, max = 230, message = "Max heart rate out of range"))]
    pub max_hr: i32,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AthleteSummary {
    pub id: i64,
    pub name: String,
}

/// Register an athlete with their heart-rate profile and source tokens.
/// Re-onboarding replaces the whole profile.
#[utoipa::path(
    post,
    path = "/athletes",
    tag = "athletes",
    request_body = OnboardAthleteRequest,
    responses(
        (status = 201, description = "Athlete registered"),
        (status = 400, description = "Invalid profile or request"),
        (status = 401, description = "Missing or wrong admin token")
    )
)]
pub async fn onboard_athlete(
    Extension(db): Extension<Database>,
    _admin: AdminUser,
    Json(req): Json<OnboardAthleteRequest>,
) -> Result<StatusCode, AppError> {
    // Validate input using validator crate
    req.validate().map_err(|e| {
        let messages: Vec<String> = e
            .field_errors()
            .into_iter()
            .flat_map(|(_, errors)| {
                errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            })
            .collect();
        AppError::InvalidInput(messages.join(", "))
    })?;

    let athlete = Athlete {
        id: req.athlete_id,
        name: req.name,
        resting_hr: req.resting_hr,
        max_hr: req.max_hr,
        created_at: OffsetDateTime::now_utc(),
    };

    // Reject degenerate profiles at the door rather than at scoring time.
    ZoneBoundaries::from_profile(&athlete.profile(), MinHrPolicy::default())?;

    let credentials = Credentials {
        access_token: req.access_token,
        refresh_token: req.refresh_token,
        expires_at: req.expires_at,
    };

    db.upsert_athlete(&athlete, &credentials).await?;

    Ok(StatusCode::CREATED)
}

/// List registered athletes (names and IDs only, never tokens).
#[utoipa::path(
    get,
    path = "/athletes",
    tag = "athletes",
    responses(
        (status = 200, description = "Registered athletes", body = Vec<AthleteSummary>)
    )
)]
pub async fn list_athletes(
    Extension(db): Extension<Database>,
    _admin: AdminUser,
) -> Result<Json<Vec<AthleteSummary>>, AppError> {
    let athletes = db.list_athletes().await?;
    let summaries = athletes
        .into_iter()
        .map(|a| AthleteSummary {
            id: a.id,
            name: a.name,
        })
        .collect();
    Ok(Json(summaries))
}

/// Remove an athlete and all of their stored data.
#[utoipa::path(
    delete,
    path = "/athletes/{id}",
    tag = "athletes",
    params(
        ("id" = i64, Path, description = "Athlete ID")
    ),
    responses(
        (status = 204, description = "Athlete removed"),
        (status = 404, description = "No such athlete")
    )
)]
pub async fn remove_athlete(
    Extension(db): Extension<Database>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    db.delete_athlete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
