use chrono::{Datelike, NaiveDate, NaiveTime};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::domain::slot::TimeSlot;
use crate::error::DomainError;
use crate::validation;

pub const DEFAULT_SESSION_DURATION_MINUTES: u32 = 60;
pub const DEFAULT_BUFFER_INTERVAL_MINUTES: u32 = 10;

/// Daily working window, parsed from 24-hour "HH:mm" strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl WorkingHours {
    pub fn parse(start: &str, end: &str) -> Result<Self, DomainError> {
        let start = validation::parse_hhmm("working_hours.start", start)?;
        let end = validation::parse_hhmm("working_hours.end", end)?;

        if start >= end {
            return Err(DomainError::Validation(
                "working hours start must be before end".to_string(),
            ));
        }

        Ok(Self { start, end })
    }
}

/// Per-professional availability configuration used to validate slot
/// legality. Weekdays are 0-6 with 0 = Sunday; times are interpreted on
/// the appointment's UTC timeline.
#[derive(Debug, Clone)]
pub struct ScheduleConfiguration {
    professional_id: Uuid,
    working_days: BTreeSet<u8>,
    working_hours: WorkingHours,
    session_duration_minutes: u32,
    buffer_interval_minutes: u32,
    holidays: BTreeSet<NaiveDate>,
    enable_google_meet: bool,
}

impl ScheduleConfiguration {
    pub fn new(
        professional_id: Uuid,
        working_days: &[u8],
        working_hours: WorkingHours,
        session_duration_minutes: u32,
        buffer_interval_minutes: u32,
        holidays: Vec<NaiveDate>,
        enable_google_meet: bool,
    ) -> Result<Self, DomainError> {
        validation::validate_weekdays("working_days", working_days)?;
        validation::validate_session_duration(session_duration_minutes)?;
        validation::validate_buffer_interval(buffer_interval_minutes)?;

        Ok(Self {
            professional_id,
            working_days: working_days.iter().copied().collect(),
            working_hours,
            session_duration_minutes,
            buffer_interval_minutes,
            holidays: holidays.into_iter().collect(),
            enable_google_meet,
        })
    }

    /// Configuration with the default session length and buffer, no
    /// holidays and no conference links.
    pub fn with_defaults(
        professional_id: Uuid,
        working_days: &[u8],
        working_hours: WorkingHours,
    ) -> Result<Self, DomainError> {
        Self::new(
            professional_id,
            working_days,
            working_hours,
            DEFAULT_SESSION_DURATION_MINUTES,
            DEFAULT_BUFFER_INTERVAL_MINUTES,
            Vec::new(),
            false,
        )
    }

    pub fn professional_id(&self) -> Uuid {
        self.professional_id
    }

    pub fn session_duration_minutes(&self) -> u32 {
        self.session_duration_minutes
    }

    pub fn buffer_interval_minutes(&self) -> u32 {
        self.buffer_interval_minutes
    }

    pub fn enable_google_meet(&self) -> bool {
        self.enable_google_meet
    }

    /// Validate a candidate interval against the working window.
    ///
    /// Slots are generated from this configuration, so the duration must
    /// match the session length exactly.
    pub fn check(&self, slot: &TimeSlot) -> Result<(), DomainError> {
        if !slot.single_day() {
            return Err(DomainError::Validation(
                "appointment must start and end on the same day".to_string(),
            ));
        }

        let date = slot.start().date_naive();
        let weekday = date.weekday().num_days_from_sunday() as u8;

        if !self.working_days.contains(&weekday) {
            return Err(DomainError::Validation(format!(
                "{} is not a working day",
                date
            )));
        }

        if self.holidays.contains(&date) {
            return Err(DomainError::Validation(format!("{} is a holiday", date)));
        }

        let start_time = slot.start().time();
        let end_time = slot.end().time();
        if start_time < self.working_hours.start || end_time > self.working_hours.end {
            return Err(DomainError::Validation(
                "appointment is outside working hours".to_string(),
            ));
        }

        if slot.duration_minutes() != i64::from(self.session_duration_minutes) {
            return Err(DomainError::Validation(format!(
                "appointment must last exactly {} minutes",
                self.session_duration_minutes
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Datelike, TimeZone, Utc};

    fn config() -> ScheduleConfiguration {
        // 2025-03-10 is a Monday
        ScheduleConfiguration::new(
            Uuid::new_v4(),
            &[1, 2, 3, 4, 5],
            WorkingHours::parse("08:00", "18:00").unwrap(),
            60,
            15,
            vec![NaiveDate::from_ymd_opt(2025, 3, 12).unwrap()],
            false,
        )
        .unwrap()
    }

    fn slot(day: u32, start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> TimeSlot {
        let start: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 3, day, start_h, start_m, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, day, end_h, end_m, 0).unwrap();
        TimeSlot::new(start, end).unwrap()
    }

    #[test]
    fn test_accepts_slot_inside_window() {
        assert!(config().check(&slot(10, 9, 0, 10, 0)).is_ok());
    }

    #[test]
    fn test_rejects_non_working_day() {
        // 2025-03-09 is a Sunday
        assert!(config().check(&slot(9, 9, 0, 10, 0)).is_err());
    }

    #[test]
    fn test_rejects_holiday() {
        assert!(config().check(&slot(12, 9, 0, 10, 0)).is_err());
    }

    #[test]
    fn test_rejects_outside_working_hours() {
        assert!(config().check(&slot(10, 7, 0, 8, 0)).is_err());
        assert!(config().check(&slot(10, 17, 30, 18, 30)).is_err());
    }

    #[test]
    fn test_rejects_wrong_duration() {
        assert!(config().check(&slot(10, 9, 0, 9, 30)).is_err());
        assert!(config().check(&slot(10, 9, 0, 11, 0)).is_err());
    }

    #[test]
    fn test_defaults_are_hour_sessions_with_ten_minute_buffer() {
        let config = ScheduleConfiguration::with_defaults(
            Uuid::new_v4(),
            &[1, 2, 3, 4, 5],
            WorkingHours::parse("08:00", "18:00").unwrap(),
        )
        .unwrap();

        assert_eq!(config.session_duration_minutes(), 60);
        assert_eq!(config.buffer_interval_minutes(), 10);
        assert!(!config.enable_google_meet());
    }

    #[test]
    fn test_weekday_convention_is_sunday_zero() {
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(sunday.weekday().num_days_from_sunday(), 0);
    }

    #[test]
    fn test_rejects_duplicate_free_but_invalid_days() {
        let result = ScheduleConfiguration::new(
            Uuid::new_v4(),
            &[1, 1, 9],
            WorkingHours::parse("08:00", "18:00").unwrap(),
            60,
            10,
            vec![],
            false,
        );
        assert!(result.is_err());
    }
}
