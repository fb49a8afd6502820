//! Zone accumulation and per-activity scoring.

use time::Date;

use crate::models::ActivityZoneRecord;
use crate::sample_weights::SampleWeights;
use crate::zone_model::ZoneBoundaries;

/// Per-sample accumulator over a weighted heart-rate stream.
pub trait SampleMetric {
    type Output;
    fn next_sample(&mut self, hr: f64, weight: f64);
    fn finish(&mut self) -> Self::Output;
}

/// Seconds per zone plus the stream's total weighted duration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoneSummary {
    pub zone_seconds: [f64; 5],
    pub total_time: f64,
}

/// Activity metadata carried through to the stored record.
#[derive(Debug, Clone)]
pub struct ActivityMetadata {
    pub sport: String,
    pub elapsed_time: f64,
    pub date: Date,
}

/// Buckets a weighted stream into the five zones.
pub fn accumulate_zones(
    hr: &[f64],
    weights: &SampleWeights,
    boundaries: &ZoneBoundaries,
) -> ZoneSummary {
    let mut acc = Metrics::new(*boundaries);
    for (&sample, &weight) in hr.iter().zip(weights.weights()) {
        acc.next_sample(sample, weight);
    }
    acc.finish()
}

/// Builds the durable record for one activity. An empty stream is not an
/// error: it produces an all-zero record with the activity's own elapsed
/// time as the total.
pub fn summarize_activity(
    hr: &[f64],
    weights: &SampleWeights,
    boundaries: &ZoneBoundaries,
    meta: ActivityMetadata,
) -> ActivityZoneRecord {
    if hr.is_empty() {
        return ActivityZoneRecord {
            z1: 0.0,
            z2: 0.0,
            z3: 0.0,
            z4: 0.0,
            z5: 0.0,
            sport: meta.sport,
            total_time: meta.elapsed_time,
            date: meta.date,
        };
    }

    let summary = accumulate_zones(hr, weights, boundaries);
    let [z1, z2, z3, z4, z5] = summary.zone_seconds;
    ActivityZoneRecord {
        z1,
        z2,
        z3,
        z4,
        z5,
        sport: meta.sport,
        total_time: summary.total_time,
        date: meta.date,
    }
}

/// Score for one activity in score-minutes: time in the top two zones
/// counts double.
pub fn activity_score(record: &ActivityZoneRecord) -> f64 {
    (record.z1 + record.z2 + record.z3 + 2.0 * (record.z4 + record.z5)) / 60.0
}

#[derive(Debug, Clone)]
struct Metrics {
    zone_time: Option<ZoneTimeMetric>,
    duration: Option<DurationMetric>,
}

impl Metrics {
    fn new(boundaries: ZoneBoundaries) -> Self {
        Self {
            zone_time: Some(ZoneTimeMetric::new(boundaries)),
            duration: Some(DurationMetric::default()),
        }
    }
}

impl SampleMetric for Metrics {
    type Output = ZoneSummary;

    fn next_sample(&mut self, hr: f64, weight: f64) {
        if let Some(zone_time) = &mut self.zone_time {
            zone_time.next_sample(hr, weight);
        }
        if let Some(duration) = &mut self.duration {
            duration.next_sample(hr, weight);
        }
    }

    fn finish(&mut self) -> ZoneSummary {
        let mut summary = ZoneSummary::default();
        if let Some(zone_time) = &mut self.zone_time {
            summary.zone_seconds = zone_time.finish();
        }
        if let Some(duration) = &mut self.duration {
            summary.total_time = duration.finish();
        }
        summary
    }
}

#[derive(Debug, Clone)]
struct ZoneTimeMetric {
    boundaries: ZoneBoundaries,
    seconds: [f64; 5],
}

impl ZoneTimeMetric {
    fn new(boundaries: ZoneBoundaries) -> Self {
        Self {
            boundaries,
            seconds: [0.0; 5],
        }
    }
}

impl SampleMetric for ZoneTimeMetric {
    type Output = [f64; 5];

    fn next_sample(&mut self, hr: f64, weight: f64) {
        // Samples below the floor count toward no zone at all.
        if let Some(zone) = self.boundaries.zone_for(hr) {
            self.seconds[zone.index()] += weight;
        }
    }

    fn finish(&mut self) -> [f64; 5] {
        self.seconds
    }
}

/// Total weighted duration, floor-excluded samples included.
#[derive(Debug, Clone, Default)]
struct DurationMetric {
    total: f64,
}

impl SampleMetric for DurationMetric {
    type Output = f64;

    fn next_sample(&mut self, _hr: f64, weight: f64) {
        self.total += weight;
    }

    fn finish(&mut self) -> f64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::models::HeartRateProfile;
    use crate::zone_model::MinHrPolicy;

    use super::*;

    fn boundaries() -> ZoneBoundaries {
        // resting 60, max 180: ceilings [132, 144, 156, 168], floor 90
        ZoneBoundaries::from_profile(
            &HeartRateProfile {
                resting_hr: 60,
                max_hr: 180,
            },
            MinHrPolicy::MaxFraction(0.5),
        )
        .unwrap()
    }

    fn meta() -> ActivityMetadata {
        ActivityMetadata {
            sport: "Run".to_string(),
            elapsed_time: 600.0,
            date: date!(2025 - 11 - 03),
        }
    }

    #[test]
    fn zone_seconds_sum_to_above_floor_weight() {
        let hr = [50.0, 130.0, 150.0, 170.0, 190.0];
        let weights = SampleWeights::uniform(hr.len(), 5.0);
        let summary = accumulate_zones(&hr, &weights, &boundaries());

        // First sample is below the 90 bpm floor and excluded entirely.
        let bucketed: f64 = summary.zone_seconds.iter().sum();
        assert!((bucketed - 4.0).abs() < 1e-9);
        // Total time still counts every sample.
        assert!((summary.total_time - 5.0).abs() < 1e-9);

        assert_eq!(summary.zone_seconds, [1.0, 0.0, 1.0, 0.0, 2.0]);
    }

    #[test]
    fn empty_stream_falls_back_to_activity_metadata() {
        let weights = SampleWeights::from_timestamps(&[]);
        let record = summarize_activity(&[], &weights, &boundaries(), meta());
        assert_eq!(record.zone_seconds(), [0.0; 5]);
        assert_eq!(record.total_time, 600.0);
        assert_eq!(record.sport, "Run");
    }

    #[test]
    fn record_total_matches_weight_total() {
        let timestamps = [0, 1, 1, 2, 40];
        let hr = [100.0, 120.0, 140.0, 150.0, 160.0];
        let weights = SampleWeights::from_timestamps(&timestamps);
        let record = summarize_activity(&hr, &weights, &boundaries(), meta());
        assert!((record.total_time - weights.total()).abs() < 1e-9);
    }

    #[test]
    fn score_counts_top_zones_double() {
        let mut record = summarize_activity(&[], &SampleWeights::default(), &boundaries(), meta());
        record.z1 = 60.0;
        assert_eq!(activity_score(&record), 1.0);

        record.z1 = 0.0;
        record.z4 = 60.0;
        assert_eq!(activity_score(&record), 2.0);

        record.z4 = 0.0;
        record.z5 = 30.0;
        record.z2 = 30.0;
        assert_eq!(activity_score(&record), 1.5);
    }
}
