//! Background processing of webhook events.
//!
//! Reception must acknowledge immediately, so events are handed to a
//! worker pool and processed off the request path: fetch the activity,
//! recompute its zone record, upsert, then rebuild and publish the
//! scoreboard. Replays are safe because record writes are last-write-wins.

use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::{
    config::ScoringConfig,
    database::Database,
    errors::AppError,
    leaderboard,
    models::WebhookEvent,
    publish::ScoreboardSink,
    sample_weights::{self, SampleWeights},
    scoring::{self, ActivityMetadata},
    strava::{ActivitySource, ActivitySummary, HrStream},
    zone_model::ZoneBoundaries,
};

#[derive(Clone)]
pub struct EventQueue {
    db: Database,
    source: Arc<dyn ActivitySource>,
    sink: ScoreboardSink,
    scoring: ScoringConfig,
    handle: Handle,
    pool: Arc<rayon::ThreadPool>,
    in_flight: Arc<Mutex<HashSet<(i64, i64)>>>,
    done_tx: std::sync::mpsc::Sender<(i64, i64)>,
}

impl EventQueue {
    pub fn new(
        db: Database,
        source: Arc<dyn ActivitySource>,
        sink: ScoreboardSink,
        scoring: ScoringConfig,
    ) -> Self {
        let rpool = rayon::ThreadPoolBuilder::new().build().unwrap();
        let handle = Handle::current();
        let in_flight = Arc::new(Mutex::new(HashSet::new()));

        let (tx, rx) = std::sync::mpsc::channel::<(i64, i64)>();
        let worker_in_flight = in_flight.clone();
        rpool.spawn(move || {
            while let Ok(key) = rx.recv() {
                let mut in_flight = worker_in_flight.lock().unwrap();
                in_flight.remove(&key);
            }
        });

        Self {
            db,
            source,
            sink,
            scoring,
            handle,
            pool: Arc::new(rpool),
            in_flight,
            done_tx: tx,
        }
    }

    pub fn submit(&self, event: WebhookEvent) -> anyhow::Result<()> {
        let key = (event.owner_id, event.object_id);
        self.in_flight.lock().unwrap().insert(key);

        let tx = self.done_tx.clone();
        let db = self.db.clone();
        let source = self.source.clone();
        let sink = self.sink.clone();
        let scoring = self.scoring;
        let handle = self.handle.clone();
        self.pool.spawn(move || {
            handle.block_on(async move {
                if let Err(e) = process_event(&db, source.as_ref(), &sink, scoring, &event).await {
                    tracing::error!(
                        "Failed to process {} {} event for athlete {}: {e}",
                        event.object_type,
                        event.aspect_type,
                        event.owner_id
                    );
                }
            });
            tx.send(key).unwrap();
        });
        Ok(())
    }
}

async fn process_event(
    db: &Database,
    source: &dyn ActivitySource,
    sink: &ScoreboardSink,
    scoring: ScoringConfig,
    event: &WebhookEvent,
) -> Result<(), AppError> {
    match event.object_type.as_str() {
        "activity" => match event.aspect_type.as_str() {
            "create" | "update" => {
                ingest_activity(db, source, scoring, event.owner_id, event.object_id).await?;
            }
            "delete" => {
                db.delete_record(event.owner_id, event.object_id).await?;
                info!(
                    "Deleted record for activity {} of athlete {}",
                    event.object_id, event.owner_id
                );
            }
            other => {
                debug!("Ignoring activity event with aspect {other}");
                return Ok(());
            }
        },
        "athlete" => {
            if !event.is_deauthorization() {
                debug!("Ignoring athlete event without a deauthorization");
                return Ok(());
            }
            // Revoked access removes the athlete and, by cascade, every
            // stored record and credential.
            match db.delete_athlete(event.object_id).await {
                Ok(()) => info!("Athlete {} deauthorized, data removed", event.object_id),
                Err(AppError::NotFound) => {
                    warn!("Deauthorization for unknown athlete {}", event.object_id);
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
        other => {
            debug!("Ignoring event for object type {other}");
            return Ok(());
        }
    }

    leaderboard::rebuild_and_publish(db, sink, scoring.season_policy()).await?;

    Ok(())
}

/// Fetches one activity and upserts its zone record.
///
/// An unknown athlete or an invalid profile skips the activity with a
/// warning; an upstream failure propagates so the caller can see that
/// the athlete would otherwise be under-counted.
pub async fn ingest_activity(
    db: &Database,
    source: &dyn ActivitySource,
    scoring: ScoringConfig,
    athlete_id: i64,
    activity_id: i64,
) -> Result<(), AppError> {
    let Some(athlete) = db.get_athlete(athlete_id).await? else {
        warn!("Ignoring activity {activity_id} for unknown athlete {athlete_id}");
        return Ok(());
    };

    let boundaries = match ZoneBoundaries::from_profile(&athlete.profile(), scoring.min_hr_policy)
    {
        Ok(boundaries) => boundaries,
        Err(e) => {
            warn!("Skipping athlete {} ({}): {e}", athlete.name, athlete.id);
            return Ok(());
        }
    };

    let (summary, stream) = source.fetch_activity(athlete_id, activity_id).await?;

    let Some(date) = summary.local_date() else {
        return Err(AppError::InvalidInput(format!(
            "Unparseable activity start date: {}",
            summary.start_date_local
        )));
    };

    let record = build_record(&summary, &stream, &boundaries, date);
    db.upsert_record(athlete_id, activity_id, &record).await?;

    info!(
        "Stored zone record for activity {activity_id} of athlete {athlete_id} ({:.1}s total)",
        record.total_time
    );

    Ok(())
}

fn build_record(
    summary: &ActivitySummary,
    stream: &HrStream,
    boundaries: &ZoneBoundaries,
    date: time::Date,
) -> crate::models::ActivityZoneRecord {
    let meta = ActivityMetadata {
        sport: summary.sport_type.clone(),
        elapsed_time: summary.elapsed_time,
        date,
    };

    match &stream.time {
        Some(timestamps) => {
            let (hr, timestamps) = sample_weights::align_streams(&stream.heartrate, timestamps);
            let weights = SampleWeights::from_timestamps(timestamps);
            scoring::summarize_activity(hr, &weights, boundaries, meta)
        }
        None => {
            let weights = SampleWeights::uniform(stream.heartrate.len(), summary.elapsed_time);
            scoring::summarize_activity(&stream.heartrate, &weights, boundaries, meta)
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::models::HeartRateProfile;
    use crate::zone_model::MinHrPolicy;

    use super::*;

    fn summary(elapsed: f64) -> ActivitySummary {
        ActivitySummary {
            elapsed_time: elapsed,
            sport_type: "Run".to_string(),
            start_date_local: "2025-11-03T06:12:54Z".to_string(),
        }
    }

    fn boundaries() -> ZoneBoundaries {
        ZoneBoundaries::from_profile(
            &HeartRateProfile {
                resting_hr: 60,
                max_hr: 180,
            },
            MinHrPolicy::MaxFraction(0.5),
        )
        .unwrap()
    }

    #[test]
    fn time_weighted_record_uses_the_time_channel() {
        let stream = HrStream {
            heartrate: vec![100.0, 100.0, 100.0, 100.0],
            time: Some(vec![0, 1, 1, 2]),
        };
        let record = build_record(&summary(3600.0), &stream, &boundaries(), date!(2025 - 11 - 03));
        // Weighted duration (3s), not the activity's elapsed time.
        assert_eq!(record.total_time, 3.0);
        assert_eq!(record.z1, 3.0);
    }

    #[test]
    fn missing_time_channel_falls_back_to_uniform_weights() {
        let stream = HrStream {
            heartrate: vec![100.0, 100.0],
            time: None,
        };
        let record = build_record(&summary(600.0), &stream, &boundaries(), date!(2025 - 11 - 03));
        assert_eq!(record.total_time, 600.0);
        assert_eq!(record.z1, 600.0);
    }

    #[test]
    fn empty_stream_keeps_activity_elapsed_time() {
        let stream = HrStream::default();
        let record = build_record(&summary(1200.0), &stream, &boundaries(), date!(2025 - 11 - 03));
        assert_eq!(record.zone_seconds(), [0.0; 5]);
        assert_eq!(record.total_time, 1200.0);
    }
}
