use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Half-open time interval `[start, end)`.
///
/// Overlap uses strict inequalities, so back-to-back slots sharing a
/// boundary do not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if end <= start {
            return Err(DomainError::Validation(
                "interval end must be after its start".to_string(),
            ));
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Strict half-open overlap test.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Widen both boundaries by `minutes`, guaranteeing a minimum gap
    /// between this slot and its neighbors when used in an overlap test.
    pub fn padded(&self, minutes: u32) -> TimeSlot {
        let pad = Duration::minutes(i64::from(minutes));
        TimeSlot {
            start: self.start - pad,
            end: self.end + pad,
        }
    }

    /// True when the interval starts and ends on the same calendar date.
    pub fn single_day(&self) -> bool {
        self.start.date_naive() == self.end.date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn test_rejects_inverted_interval() {
        assert!(TimeSlot::new(at(10, 0), at(9, 0)).is_err());
        assert!(TimeSlot::new(at(10, 0), at(10, 0)).is_err());
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = TimeSlot::new(at(9, 0), at(10, 0)).unwrap();
        let b = TimeSlot::new(at(10, 0), at(11, 0)).unwrap();
        let c = TimeSlot::new(at(9, 30), at(10, 30)).unwrap();

        // back-to-back is allowed
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_padding_widens_both_sides() {
        let slot = TimeSlot::new(at(10, 0), at(11, 0)).unwrap();
        let padded = slot.padded(15);

        assert_eq!(padded.start(), at(9, 45));
        assert_eq!(padded.end(), at(11, 15));
        assert_eq!(padded.duration_minutes(), 90);
    }

    #[test]
    fn test_duration_minutes() {
        let slot = TimeSlot::new(at(9, 0), at(10, 30)).unwrap();
        assert_eq!(slot.duration_minutes(), 90);
    }
}
