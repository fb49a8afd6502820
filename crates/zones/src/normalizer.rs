//! The fairness pass: daily cap, weekly cap, and PTO rollover.
//!
//! PTO is a seasonal budget that retroactively tops up under-performing
//! completed weeks, consumed in strict chronological order. The budget is
//! threaded through the week loop as an explicit value, never shared
//! state, so every step is a pure function.

use std::collections::BTreeMap;

use time::{Date, Duration, Weekday};

use crate::models::OrderedScores;

/// Season-wide normalization constants.
#[derive(Debug, Clone, Copy)]
pub struct SeasonPolicy {
    pub daily_cap: f64,
    pub weekly_cap: f64,
    pub pto_budget: f64,
    /// ISO week the competition starts in.
    pub start_week: u8,
}

impl Default for SeasonPolicy {
    fn default() -> Self {
        Self {
            daily_cap: 50.0,
            weekly_cap: 150.0,
            pto_budget: 600.0,
            start_week: 44,
        }
    }
}

/// Result of normalizing one athlete's daily scores.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedScore {
    /// Sum of settled weekly scores from the start week through today's
    /// week, inclusive.
    pub total: f64,
    /// Labelled scores for the 7 days ending today, with a trailing
    /// "PTO remaining" entry.
    pub week_detail: OrderedScores,
    pub pto_remaining: f64,
}

impl SeasonPolicy {
    pub fn normalize(&self, daily_scores: &BTreeMap<Date, f64>, today: Date) -> NormalizedScore {
        let capped: BTreeMap<Date, f64> = daily_scores
            .iter()
            .map(|(day, score)| (*day, score.min(self.daily_cap)))
            .collect();

        // The 7-day breakdown is fixed to the calendar, independent of
        // whatever the weekly pass below does.
        let mut week_detail = OrderedScores::default();
        let window_start = today - Duration::days(6);
        for offset in 0..7 {
            let day = window_start + Duration::days(offset);
            let score = capped.get(&day).copied().unwrap_or(0.0);
            week_detail.push(day_label(day), round1(score));
        }

        let mut raw_weekly: BTreeMap<u8, f64> = BTreeMap::new();
        for (day, score) in &capped {
            *raw_weekly.entry(day.iso_week()).or_insert(0.0) += *score;
        }

        // Ascending week order matters: PTO must go to the earliest
        // shortfalls first and must never touch the in-progress week.
        let current_week = today.iso_week();
        let mut total = 0.0;
        let mut pto = self.pto_budget;
        for week in self.start_week..=current_week {
            let raw = raw_weekly.get(&week).copied().unwrap_or(0.0);
            let (settled, remaining) = self.settle_week(raw, pto, week == current_week);
            total += settled;
            pto = remaining;
        }

        week_detail.push("PTO remaining", round1(pto));

        NormalizedScore {
            total,
            week_detail,
            pto_remaining: pto,
        }
    }

    /// Settles one week: (raw capped score, budget in) → (final score,
    /// budget out). Ghost weeks arrive here as 0 like any other week.
    fn settle_week(&self, score: f64, pto: f64, is_current: bool) -> (f64, f64) {
        if score < self.weekly_cap && pto > 0.0 && !is_current {
            let points_short = self.weekly_cap - score;
            if points_short < pto {
                (self.weekly_cap, pto - points_short)
            } else {
                // The budget runs dry mid-week; the week keeps whatever
                // was left, even if that lands below the cap.
                (score + pto, 0.0)
            }
        } else {
            (score.min(self.weekly_cap), pto)
        }
    }
}

fn day_label(day: Date) -> String {
    let abbrev = match day.weekday() {
        Weekday::Monday => "Mon",
        Weekday::Tuesday => "Tue",
        Weekday::Wednesday => "Wed",
        Weekday::Thursday => "Thu",
        Weekday::Friday => "Fri",
        Weekday::Saturday => "Sat",
        Weekday::Sunday => "Sun",
    };
    format!("{abbrev} ({:02}/{:02})", u8::from(day.month()), day.day())
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
