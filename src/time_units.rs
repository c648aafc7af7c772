use serde::{Deserialize, Serialize};

const MILLIS_PER_SECOND: u64 = 1000;
const MILLIS_PER_MINUTE: u64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;
const MILLIS_PER_DAY: u64 = 24 * MILLIS_PER_HOUR;

/// A wait duration kept as independent unit fields.
///
/// Fields are never rolled over into larger units, so `{hours: 1423}` stays
/// as given and only contributes its share when converted to milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeUnits {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

/// A duration as submitted by a caller, with any unit allowed to be missing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PartialTimeUnits {
    #[serde(default)]
    pub days: Option<u64>,
    #[serde(default)]
    pub hours: Option<u64>,
    #[serde(default)]
    pub minutes: Option<u64>,
    #[serde(default)]
    pub seconds: Option<u64>,
}

impl TimeUnits {
    pub fn to_millis(&self) -> u64 {
        self.days
            .saturating_mul(MILLIS_PER_DAY)
            .saturating_add(self.hours.saturating_mul(MILLIS_PER_HOUR))
            .saturating_add(self.minutes.saturating_mul(MILLIS_PER_MINUTE))
            .saturating_add(self.seconds.saturating_mul(MILLIS_PER_SECOND))
    }

    /// Splits a millisecond count into whole days, hours, minutes and
    /// seconds. Sub-second remainders are dropped.
    pub fn from_millis(ms: u64) -> Self {
        let seconds = ms / MILLIS_PER_SECOND;
        let minutes = seconds / 60;
        let hours = minutes / 60;
        TimeUnits {
            days: hours / 24,
            hours: hours % 24,
            minutes: minutes % 60,
            seconds: seconds % 60,
        }
    }
}

impl PartialTimeUnits {
    pub fn is_empty(&self) -> bool {
        self.days.is_none() && self.hours.is_none() && self.minutes.is_none() && self.seconds.is_none()
    }

    pub fn normalize(&self) -> TimeUnits {
        TimeUnits {
            days: self.days.unwrap_or(0),
            hours: self.hours.unwrap_or(0),
            minutes: self.minutes.unwrap_or(0),
            seconds: self.seconds.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PartialTimeUnits, TimeUnits};

    #[test]
    fn to_millis_sums_each_unit() {
        let units = TimeUnits {
            days: 1,
            hours: 2,
            minutes: 3,
            seconds: 4,
        };
        assert_eq!(units.to_millis(), 86_400_000 + 7_200_000 + 180_000 + 4_000);
        assert_eq!(TimeUnits::default().to_millis(), 0);
    }

    #[test]
    fn large_fields_are_not_rolled_over() {
        let units = TimeUnits {
            hours: 1423,
            ..Default::default()
        };
        assert_eq!(units.to_millis(), 1423 * 3_600_000);
        assert_eq!(units.hours, 1423);
    }

    #[test]
    fn to_millis_saturates() {
        let units = TimeUnits {
            days: u64::MAX,
            ..Default::default()
        };
        assert_eq!(units.to_millis(), u64::MAX);
    }

    #[test]
    fn from_millis_floors_through_units() {
        assert_eq!(
            TimeUnits::from_millis(90_061_999),
            TimeUnits {
                days: 1,
                hours: 1,
                minutes: 1,
                seconds: 1,
            }
        );
        assert_eq!(TimeUnits::from_millis(999), TimeUnits::default());
        assert_eq!(
            TimeUnits::from_millis(1423 * 3_600_000),
            TimeUnits {
                days: 59,
                hours: 7,
                minutes: 0,
                seconds: 0,
            }
        );
    }

    #[test]
    fn normalize_fills_missing_fields() {
        let partial = PartialTimeUnits {
            minutes: Some(10),
            ..Default::default()
        };
        assert!(!partial.is_empty());
        assert_eq!(
            partial.normalize(),
            TimeUnits {
                days: 0,
                hours: 0,
                minutes: 10,
                seconds: 0,
            }
        );
        assert!(PartialTimeUnits::default().is_empty());
    }
}
