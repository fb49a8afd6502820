//! Per-sample duration weights for heart-rate streams.
//!
//! Device streams report at irregular true intervals while the upstream
//! API quantizes timestamps to whole seconds, so several samples can
//! share one timestamp and long gaps usually mean the device auto-paused.
//! The weights assign each sample the share of real elapsed time it
//! represents, with pauses clamped so they cannot inflate zone time.

use tracing::warn;

/// Gaps longer than this between consecutive unique timestamps are
/// treated as pauses rather than elapsed zone time.
const PAUSE_GAP_SECONDS: f64 = 10.0;

/// The last timestamp has no successor; it gets a 1 s block. Clamped
/// pauses collapse to the same value.
const DEFAULT_BLOCK_SECONDS: f64 = 1.0;

/// Duration weights aligned index-for-index with the sample stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleWeights {
    weights: Vec<f64>,
    total: f64,
}

impl SampleWeights {
    /// Derives weights from a non-decreasing stream of whole-second
    /// timestamps. Samples sharing a timestamp split its block evenly.
    pub fn from_timestamps(timestamps: &[i64]) -> Self {
        if timestamps.is_empty() {
            return Self::default();
        }

        // Consecutive runs of equal timestamps; the stream is non-decreasing.
        let mut blocks: Vec<(i64, usize)> = Vec::new();
        for &t in timestamps {
            match blocks.last_mut() {
                Some((last, count)) if *last == t => *count += 1,
                _ => blocks.push((t, 1)),
            }
        }

        let mut weights = Vec::with_capacity(timestamps.len());
        let mut total = 0.0;
        for (i, &(timestamp, count)) in blocks.iter().enumerate() {
            let duration = match blocks.get(i + 1) {
                Some(&(next, _)) => (next - timestamp) as f64,
                None => DEFAULT_BLOCK_SECONDS,
            };
            let duration = if duration > PAUSE_GAP_SECONDS {
                DEFAULT_BLOCK_SECONDS
            } else {
                duration
            };
            let per_sample = duration / count as f64;
            weights.extend(std::iter::repeat(per_sample).take(count));
            total += duration;
        }

        Self { weights, total }
    }

    /// Uniform weights for streams without a time channel: the activity's
    /// elapsed time split evenly across the samples.
    pub fn uniform(n_samples: usize, elapsed_seconds: f64) -> Self {
        if n_samples == 0 {
            return Self::default();
        }
        let per_sample = elapsed_seconds / n_samples as f64;
        Self {
            weights: vec![per_sample; n_samples],
            total: elapsed_seconds,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of all weights, i.e. the clamped duration of the stream.
    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Truncates parallel heart-rate/time streams to a common length.
/// Upstream promises equal lengths; when that breaks, score what lines up
/// rather than failing the activity.
pub fn align_streams<'a>(hr: &'a [f64], timestamps: &'a [i64]) -> (&'a [f64], &'a [i64]) {
    if hr.len() != timestamps.len() {
        warn!(
            "Heart-rate and time streams disagree in length ({} vs {}); truncating",
            hr.len(),
            timestamps.len()
        );
    }
    let n = hr.len().min(timestamps.len());
    (&hr[..n], &timestamps[..n])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_yields_no_weights() {
        let weights = SampleWeights::from_timestamps(&[]);
        assert!(weights.is_empty());
        assert_eq!(weights.total(), 0.0);
    }

    #[test]
    fn clean_stream_weights_are_all_one() {
        let timestamps: Vec<i64> = (0..10).collect();
        let weights = SampleWeights::from_timestamps(&timestamps);
        assert_eq!(weights.len(), 10);
        assert!(weights.weights().iter().all(|&w| w == 1.0));
        assert_eq!(weights.total(), 10.0);
    }

    #[test]
    fn duplicate_timestamps_split_their_block() {
        // Two samples at t=1 share the 1 s block before t=2.
        let weights = SampleWeights::from_timestamps(&[0, 1, 1, 2]);
        assert_eq!(weights.weights(), &[1.0, 0.5, 0.5, 1.0]);
        assert_eq!(weights.total(), 3.0);
    }

    #[test]
    fn pause_gaps_are_clamped_to_one_second() {
        // 60 s gap between t=5 and t=65 reads as an auto-pause.
        let weights = SampleWeights::from_timestamps(&[0, 5, 65]);
        assert_eq!(weights.weights(), &[5.0, 1.0, 1.0]);
        assert_eq!(weights.total(), 7.0);
    }

    #[test]
    fn ten_second_gap_is_kept() {
        let weights = SampleWeights::from_timestamps(&[0, 10]);
        assert_eq!(weights.weights(), &[10.0, 1.0]);
    }

    #[test]
    fn weights_conserve_clamped_duration() {
        let timestamps = [0, 0, 1, 3, 3, 3, 4, 30, 31];
        let weights = SampleWeights::from_timestamps(&timestamps);
        let sum: f64 = weights.weights().iter().sum();
        assert!((sum - weights.total()).abs() < 1e-9);
        // blocks: 0(x2)->1s, 1->2s, 3(x3)->1s, 4->26s clamped to 1s, 30->1s, 31->1s
        assert_eq!(weights.total(), 7.0);
    }

    #[test]
    fn uniform_weights_split_elapsed_time() {
        let weights = SampleWeights::uniform(4, 120.0);
        assert_eq!(weights.weights(), &[30.0, 30.0, 30.0, 30.0]);
        assert_eq!(weights.total(), 120.0);

        assert!(SampleWeights::uniform(0, 120.0).is_empty());
    }

    #[test]
    fn mismatched_streams_are_truncated() {
        let hr = [100.0, 110.0, 120.0];
        let t = [0_i64, 1];
        let (hr, t) = align_streams(&hr, &t);
        assert_eq!(hr.len(), 2);
        assert_eq!(t.len(), 2);
    }
}
