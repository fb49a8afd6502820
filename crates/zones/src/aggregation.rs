//! Per-athlete aggregation of stored activity records.
//!
//! Malformed records are skipped with a tagged reason rather than an
//! error, so one bad row can never sink an athlete's aggregation and a
//! rebuild report can say exactly what was left out.

use std::collections::BTreeMap;

use time::Date;
use tracing::warn;

use crate::models::{ActivityZoneRecord, ZonePercentages};
use crate::scoring::activity_score;

/// Why a stored record was excluded from aggregation.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordSkip {
    Malformed { activity_id: i64, reason: String },
}

/// Everything one athlete's record collection boils down to.
#[derive(Debug, Default)]
pub struct AthleteAggregate {
    /// Raw (uncapped) score per calendar day. Days without activity are
    /// absent, never zero-filled.
    pub daily_scores: BTreeMap<Date, f64>,
    pub zone_seconds: [f64; 5],
    pub total_time: f64,
    pub sport_counts: BTreeMap<String, u32>,
    pub skipped: Vec<RecordSkip>,
}

impl AthleteAggregate {
    pub fn zone_percentages(&self) -> ZonePercentages {
        if self.total_time <= 0.0 {
            return ZonePercentages::default();
        }
        let [z1, z2, z3, z4, z5] = self.zone_seconds.map(|s| s / self.total_time * 100.0);
        ZonePercentages { z1, z2, z3, z4, z5 }
    }
}

/// Folds an athlete's stored records (activity id, canonical JSON) into
/// daily scores and reporting totals.
pub fn aggregate_records<'a, I>(records: I) -> AthleteAggregate
where
    I: IntoIterator<Item = (i64, &'a str)>,
{
    let mut aggregate = AthleteAggregate::default();

    for (activity_id, raw) in records {
        let record = match ActivityZoneRecord::from_canonical_json(raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping activity {activity_id}: malformed record: {e}");
                aggregate.skipped.push(RecordSkip::Malformed {
                    activity_id,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let score = activity_score(&record);
        *aggregate.daily_scores.entry(record.date).or_insert(0.0) += score;

        for (bucket, seconds) in aggregate
            .zone_seconds
            .iter_mut()
            .zip(record.zone_seconds())
        {
            *bucket += seconds;
        }
        aggregate.total_time += record.total_time;
        *aggregate.sport_counts.entry(record.sport).or_insert(0) += 1;
    }

    aggregate
}
