//! Full leaderboard rebuild: every athlete, every record, from scratch.
//!
//! Per-athlete failures are isolated — one athlete's bad data becomes a
//! logged skip in the run report, never a run abort. Only the final
//! publish step is allowed to fail the run.

use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{info, warn};

use crate::aggregation;
use crate::database::Database;
use crate::errors::AppError;
use crate::models::{Athlete, LeaderboardEntry, ScoreboardDocument};
use crate::normalizer::{SeasonPolicy, round1};
use crate::publish::ScoreboardSink;

/// What a rebuild actually covered. Lets callers (and tests) see exactly
/// which athletes and records were skipped and why.
#[derive(Debug, Default)]
pub struct RunReport {
    pub athletes_processed: usize,
    pub athletes_skipped: Vec<(i64, String)>,
    pub records_skipped: usize,
}

/// Rebuilds every athlete's entry for the given "today".
pub async fn rebuild(
    db: &Database,
    policy: SeasonPolicy,
    today: Date,
    now: OffsetDateTime,
) -> Result<(ScoreboardDocument, RunReport), AppError> {
    let athletes = db.list_athletes().await?;
    info!("Rebuilding scoreboard for {} athletes", athletes.len());

    let mut entries = Vec::with_capacity(athletes.len());
    let mut report = RunReport::default();

    for athlete in athletes {
        match build_entry(db, &athlete, policy, today).await {
            Ok((entry, records_skipped)) => {
                report.athletes_processed += 1;
                report.records_skipped += records_skipped;
                entries.push(entry);
            }
            Err(e) => {
                warn!("Skipping athlete {} ({}): {e}", athlete.name, athlete.id);
                report.athletes_skipped.push((athlete.id, e.to_string()));
            }
        }
    }

    entries.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let document = ScoreboardDocument {
        last_updated: now.format(&Rfc3339).map_err(|_| AppError::Internal)?,
        leaderboard: entries,
    };

    Ok((document, report))
}

/// Rebuilds as of now and hands the document to the sink. Publish
/// failures propagate: a partially written scoreboard is not success.
pub async fn rebuild_and_publish(
    db: &Database,
    sink: &ScoreboardSink,
    policy: SeasonPolicy,
) -> Result<ScoreboardDocument, AppError> {
    let now = OffsetDateTime::now_utc();
    let (document, report) = rebuild(db, policy, now.date(), now).await?;

    sink.publish(&document).await?;

    info!(
        "Published scoreboard: {} athletes, {} skipped, {} malformed records",
        report.athletes_processed,
        report.athletes_skipped.len(),
        report.records_skipped
    );

    Ok(document)
}

async fn build_entry(
    db: &Database,
    athlete: &Athlete,
    policy: SeasonPolicy,
    today: Date,
) -> Result<(LeaderboardEntry, usize), AppError> {
    let rows = db.list_records(athlete.id).await?;
    let aggregate =
        aggregation::aggregate_records(rows.iter().map(|(id, raw)| (*id, raw.as_str())));
    let normalized = policy.normalize(&aggregate.daily_scores, today);

    let entry = LeaderboardEntry {
        name: athlete.name.clone(),
        score: round1(normalized.total),
        zones: aggregate.zone_percentages(),
        last_7: normalized.week_detail,
        sports: aggregate.sport_counts,
    };

    Ok((entry, aggregate.skipped.len()))
}
