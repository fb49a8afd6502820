//! Heart-rate zone boundaries derived from an athlete's profile.
//!
//! Boundaries are recomputed on demand and never persisted, so a profile
//! edit takes effect on the next scoring run without a migration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::HeartRateProfile;

/// Degenerate resting/max pair. Fatal for the athlete's scoring but never
/// for a whole leaderboard rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid heart-rate profile: resting {resting_hr}, max {max_hr}")]
pub struct InvalidProfile {
    pub resting_hr: i32,
    pub max_hr: i32,
}

/// How the scoring floor (the heart rate below which samples count toward
/// no zone) is computed. The divergent formulas in the field made this a
/// policy rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MinHrPolicy {
    /// Floor at `fraction * max_hr`.
    MaxFraction(f64),
    /// Floor at `resting_hr + fraction * reserve`.
    ReserveFraction(f64),
    /// No floor; every sample lands in a zone.
    NoFloor,
}

impl Default for MinHrPolicy {
    fn default() -> Self {
        MinHrPolicy::MaxFraction(0.5)
    }
}

impl FromStr for MinHrPolicy {
    type Err = String;

    /// Accepts `max:<fraction>`, `reserve:<fraction>`, or `off`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if s == "off" || s == "none" {
            return Ok(MinHrPolicy::NoFloor);
        }
        if let Some(fraction) = s.strip_prefix("max:") {
            return fraction
                .parse::<f64>()
                .map(MinHrPolicy::MaxFraction)
                .map_err(|_| format!("invalid max fraction: {fraction}"));
        }
        if let Some(fraction) = s.strip_prefix("reserve:") {
            return fraction
                .parse::<f64>()
                .map(MinHrPolicy::ReserveFraction)
                .map_err(|_| format!("invalid reserve fraction: {fraction}"));
        }
        Err(format!("unrecognized min-HR policy: {s}"))
    }
}

/// One of the five intensity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Z1,
    Z2,
    Z3,
    Z4,
    Z5,
}

impl Zone {
    pub fn index(self) -> usize {
        match self {
            Zone::Z1 => 0,
            Zone::Z2 => 1,
            Zone::Z3 => 2,
            Zone::Z4 => 3,
            Zone::Z5 => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Z1 => "Z1",
            Zone::Z2 => "Z2",
            Zone::Z3 => "Z3",
            Zone::Z4 => "Z4",
            Zone::Z5 => "Z5",
        }
    }
}

/// Four ascending zone ceilings plus the optional scoring floor.
///
/// A sample belongs to the first zone whose ceiling it is strictly below;
/// everything at or above the fourth ceiling is Z5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBoundaries {
    ceilings: [f64; 4],
    min_hr: Option<f64>,
}

impl ZoneBoundaries {
    pub fn from_profile(
        profile: &HeartRateProfile,
        policy: MinHrPolicy,
    ) -> Result<Self, InvalidProfile> {
        if profile.resting_hr <= 0 || profile.max_hr <= profile.resting_hr {
            return Err(InvalidProfile {
                resting_hr: profile.resting_hr,
                max_hr: profile.max_hr,
            });
        }

        let resting = f64::from(profile.resting_hr);
        let reserve = f64::from(profile.max_hr - profile.resting_hr);
        let ceilings = [0.6, 0.7, 0.8, 0.9].map(|fraction| (resting + fraction * reserve).floor());

        let min_hr = match policy {
            MinHrPolicy::MaxFraction(fraction) => Some(fraction * f64::from(profile.max_hr)),
            MinHrPolicy::ReserveFraction(fraction) => Some(resting + fraction * reserve),
            MinHrPolicy::NoFloor => None,
        };

        Ok(Self { ceilings, min_hr })
    }

    pub fn ceilings(&self) -> [f64; 4] {
        self.ceilings
    }

    pub fn min_hr(&self) -> Option<f64> {
        self.min_hr
    }

    /// Zone for a single sample, or `None` when the sample sits below the
    /// scoring floor and counts toward nothing.
    pub fn zone_for(&self, hr: f64) -> Option<Zone> {
        if let Some(floor) = self.min_hr
            && hr < floor
        {
            return None;
        }
        let zone = if hr < self.ceilings[0] {
            Zone::Z1
        } else if hr < self.ceilings[1] {
            Zone::Z2
        } else if hr < self.ceilings[2] {
            Zone::Z3
        } else if hr < self.ceilings[3] {
            Zone::Z4
        } else {
            Zone::Z5
        };
        Some(zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(resting_hr: i32, max_hr: i32) -> HeartRateProfile {
        HeartRateProfile { resting_hr, max_hr }
    }

    #[test]
    fn ceilings_are_ascending_and_inside_the_profile_range() {
        for (resting, max) in [(40, 180), (55, 195), (60, 170), (48, 202)] {
            let bounds =
                ZoneBoundaries::from_profile(&profile(resting, max), MinHrPolicy::NoFloor).unwrap();
            let ceilings = bounds.ceilings();
            for pair in ceilings.windows(2) {
                assert!(pair[0] <= pair[1], "ceilings out of order: {ceilings:?}");
            }
            assert!(ceilings[0] > f64::from(resting));
            assert!(ceilings[3] < f64::from(max));
        }
    }

    #[test]
    fn known_profile_ceilings() {
        // reserve = 120: ceilings at 60% .. 90% of reserve above resting
        let bounds =
            ZoneBoundaries::from_profile(&profile(60, 180), MinHrPolicy::NoFloor).unwrap();
        assert_eq!(bounds.ceilings(), [132.0, 144.0, 156.0, 168.0]);
    }

    #[test]
    fn degenerate_profiles_are_rejected() {
        assert!(ZoneBoundaries::from_profile(&profile(180, 60), MinHrPolicy::default()).is_err());
        assert!(ZoneBoundaries::from_profile(&profile(60, 60), MinHrPolicy::default()).is_err());
        assert!(ZoneBoundaries::from_profile(&profile(0, 180), MinHrPolicy::default()).is_err());
        assert!(ZoneBoundaries::from_profile(&profile(-10, 180), MinHrPolicy::default()).is_err());
    }

    #[test]
    fn min_hr_policies() {
        let p = profile(60, 180);
        let max_half = ZoneBoundaries::from_profile(&p, MinHrPolicy::MaxFraction(0.5)).unwrap();
        assert_eq!(max_half.min_hr(), Some(90.0));

        let reserve = ZoneBoundaries::from_profile(&p, MinHrPolicy::ReserveFraction(0.4)).unwrap();
        assert_eq!(reserve.min_hr(), Some(108.0));

        let open = ZoneBoundaries::from_profile(&p, MinHrPolicy::NoFloor).unwrap();
        assert_eq!(open.min_hr(), None);
    }

    #[test]
    fn zone_assignment_is_strictly_below_the_ceiling() {
        let bounds =
            ZoneBoundaries::from_profile(&profile(60, 180), MinHrPolicy::MaxFraction(0.5)).unwrap();
        // ceilings [132, 144, 156, 168], floor 90
        assert_eq!(bounds.zone_for(50.0), None);
        assert_eq!(bounds.zone_for(90.0), Some(Zone::Z1));
        assert_eq!(bounds.zone_for(131.0), Some(Zone::Z1));
        assert_eq!(bounds.zone_for(132.0), Some(Zone::Z2));
        assert_eq!(bounds.zone_for(144.0), Some(Zone::Z3));
        assert_eq!(bounds.zone_for(156.0), Some(Zone::Z4));
        assert_eq!(bounds.zone_for(168.0), Some(Zone::Z5));
        assert_eq!(bounds.zone_for(250.0), Some(Zone::Z5));
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(
            "max:0.5".parse::<MinHrPolicy>(),
            Ok(MinHrPolicy::MaxFraction(0.5))
        );
        assert_eq!(
            "reserve:0.4".parse::<MinHrPolicy>(),
            Ok(MinHrPolicy::ReserveFraction(0.4))
        );
        assert_eq!("off".parse::<MinHrPolicy>(), Ok(MinHrPolicy::NoFloor));
        assert!("median:0.5".parse::<MinHrPolicy>().is_err());
        assert!("max:abc".parse::<MinHrPolicy>().is_err());
    }
}
