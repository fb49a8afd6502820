//! Scoreboard read and manual-rebuild handlers.

use axum::{Extension, response::Json};

use crate::{
    auth::AdminUser, config::AppConfig, database::Database, errors::AppError, leaderboard,
    models::ScoreboardDocument, publish::ScoreboardSink,
};

/// Get the most recently published scoreboard.
#[utoipa::path(
    get,
    path = "/scoreboard",
    tag = "scoreboard",
    responses(
        (status = 200, description = "Latest published scoreboard"),
        (status = 404, description = "No scoreboard published yet")
    )
)]
pub async fn get_scoreboard(
    Extension(sink): Extension<ScoreboardSink>,
) -> Result<Json<ScoreboardDocument>, AppError> {
    let document = sink.latest().await?.ok_or(AppError::NotFound)?;
    Ok(Json(document))
}

/// Rebuild every athlete's score from stored records and publish the
/// result. The webhook path does this automatically; this endpoint exists
/// for recovering from bugs or missed events.
#[utoipa::path(
    post,
    path = "/scoreboard/rebuild",
    tag = "scoreboard",
    responses(
        (status = 200, description = "Scoreboard rebuilt and published"),
        (status = 401, description = "Missing or wrong admin token")
    )
)]
pub async fn rebuild_scoreboard(
    Extension(db): Extension<Database>,
    Extension(sink): Extension<ScoreboardSink>,
    Extension(config): Extension<AppConfig>,
    _admin: AdminUser,
) -> Result<Json<ScoreboardDocument>, AppError> {
    let document =
        leaderboard::rebuild_and_publish(&db, &sink, config.scoring.season_policy()).await?;
    Ok(Json(document))
}
