pub mod activity_queue;
pub mod aggregation;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod leaderboard;
pub mod models;
pub mod normalizer;
pub mod publish;
pub mod sample_weights;
pub mod scoring;
pub mod strava;
pub mod zone_model;

use std::sync::Arc;

use axum::{
    Extension, Router,
    http::{HeaderValue, Method, header},
    response::Json,
    routing::{get, post},
};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};
use utoipa::OpenApi;

use crate::{
    activity_queue::EventQueue,
    config::AppConfig,
    database::Database,
    handlers::{
        get_scoreboard, get_stats, health_check, list_athletes, onboard_athlete, rebuild_scoreboard,
        receive_webhook, remove_athlete, verify_webhook,
    },
    publish::ScoreboardSink,
    strava::{ActivitySource, StravaClient},
};

#[derive(OpenApi)]
#[openapi(paths(
    handlers::stats::health_check,
    handlers::stats::get_stats,
    handlers::webhook::verify_webhook,
    handlers::webhook::receive_webhook,
    handlers::athletes::onboard_athlete,
    handlers::athletes::list_athletes,
    handlers::athletes::remove_athlete,
    handlers::scoreboard::get_scoreboard,
    handlers::scoreboard::rebuild_scoreboard,
))]
struct ApiDoc;

pub fn create_router(pool: PgPool, config: AppConfig) -> Router {
    let db = Database::new(pool);
    let source: Arc<dyn ActivitySource> = Arc::new(StravaClient::new(
        db.clone(),
        config.strava_client_id.clone(),
        config.strava_client_secret.clone(),
    ));
    let sink = ScoreboardSink::new_local(config.scoreboard_path.clone());
    let queue = EventQueue::new(db.clone(), source, sink.clone(), config.scoring);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats))
        // Webhook routes (verification handshake + event reception)
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        // Athlete admin routes
        .route("/athletes", get(list_athletes).post(onboard_athlete))
        .route("/athletes/{id}", axum::routing::delete(remove_athlete))
        // Scoreboard routes
        .route("/scoreboard", get(get_scoreboard))
        .route("/scoreboard/rebuild", post(rebuild_scoreboard))
        // OpenAPI document
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(Extension(db))
        .layer(Extension(sink))
        .layer(Extension(queue))
        .layer(Extension(config))
        .layer(cors)
        .layer(CompressionLayer::new())
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
}

pub async fn run_server(pool: PgPool, config: AppConfig) -> anyhow::Result<()> {
    let port = config.port;
    let app = create_router(pool, config);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    println!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
