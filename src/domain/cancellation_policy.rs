use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::validation;

/// Per-professional cancellation rule set, replaced wholesale on update.
#[derive(Debug, Clone)]
pub struct CancellationPolicy {
    pub professional_id: Uuid,
    pub min_hours_before_cancellation: u32,
    pub min_days_before_next_appointment: u32,
    pub cancellation_fee_percentage: BigDecimal,
    pub allow_reschedule: bool,
}

impl CancellationPolicy {
    pub fn new(
        professional_id: Uuid,
        min_hours_before_cancellation: u32,
        min_days_before_next_appointment: u32,
        cancellation_fee_percentage: BigDecimal,
        allow_reschedule: bool,
    ) -> Result<Self, DomainError> {
        validation::validate_fee_percentage(&cancellation_fee_percentage)?;

        Ok(Self {
            professional_id,
            min_hours_before_cancellation,
            min_days_before_next_appointment,
            cancellation_fee_percentage,
            allow_reschedule,
        })
    }

    /// Fallback applied when a professional has no policy on record:
    /// no notice requirement, no cooldown, no fee, rescheduling allowed.
    pub fn permissive(professional_id: Uuid) -> Self {
        Self {
            professional_id,
            min_hours_before_cancellation: 0,
            min_days_before_next_appointment: 0,
            cancellation_fee_percentage: BigDecimal::from(0),
            allow_reschedule: true,
        }
    }

    /// Fee owed for a cancellation given the notice in hours.
    /// Zero when the notice meets the policy minimum.
    pub fn fee_for(&self, notice_hours: i64, price: &BigDecimal) -> BigDecimal {
        if notice_hours >= i64::from(self.min_hours_before_cancellation) {
            return BigDecimal::from(0);
        }

        price * &self.cancellation_fee_percentage
    }

    /// Whether enough days have passed since the last appointment ended
    /// for the client to book again.
    pub fn cooldown_ok(
        &self,
        last_appointment_end: DateTime<Utc>,
        candidate_start: DateTime<Utc>,
    ) -> bool {
        let required = Duration::days(i64::from(self.min_days_before_next_appointment));
        candidate_start - last_appointment_end >= required
    }
}
