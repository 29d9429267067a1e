//! Availability resolution for candidate bookings.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::schedule_configuration::ScheduleConfiguration;
use crate::domain::slot::TimeSlot;
use crate::error::DomainError;
use crate::ports::AppointmentRepository;

/// Decides whether a candidate interval is bookable for a professional.
///
/// The candidate is padded with the configuration's buffer interval on
/// both sides before the overlap test, so stored intervals never need
/// padding. Must be invoked inside the per-professional critical
/// section; the first writer to commit wins and the second observes the
/// committed appointment here.
pub struct AvailabilityResolver {
    appointments: Arc<dyn AppointmentRepository>,
}

impl AvailabilityResolver {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn ensure_bookable(
        &self,
        professional_id: Uuid,
        candidate: &TimeSlot,
        configuration: &ScheduleConfiguration,
        excluding: Option<Uuid>,
    ) -> Result<(), DomainError> {
        let padded = candidate.padded(configuration.buffer_interval_minutes());

        let existing = self
            .appointments
            .find_overlapping(professional_id, padded.start(), padded.end(), excluding)
            .await?;

        for appointment in existing {
            if appointment.blocks() && appointment.effective_slot().overlaps(&padded) {
                tracing::debug!(
                    professional_id = %professional_id,
                    blocking_id = %appointment.id(),
                    "candidate interval rejected by existing appointment"
                );
                return Err(DomainError::Conflict(format!(
                    "interval conflicts with appointment {}",
                    appointment.id()
                )));
            }
        }

        Ok(())
    }
}
