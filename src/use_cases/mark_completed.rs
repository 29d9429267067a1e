//! Mark an appointment as completed.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::appointment::Appointment;
use crate::error::DomainError;
use crate::ports::AppointmentRepository;

#[derive(Debug)]
pub struct MarkCompletedInput {
    pub appointment_id: Uuid,
    /// Must be the assigned professional.
    pub professional_id: Uuid,
}

pub struct MarkAppointmentAsCompleted {
    appointments: Arc<dyn AppointmentRepository>,
}

impl MarkAppointmentAsCompleted {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn execute(&self, input: MarkCompletedInput) -> Result<Appointment, DomainError> {
        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        if input.professional_id != appointment.professional_id() {
            return Err(DomainError::NotAllowed(
                "only the assigned professional may complete the appointment".to_string(),
            ));
        }

        appointment.mark_completed(Utc::now())?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(
            appointment_id = %appointment.id(),
            elapsed_ms = appointment.total_elapsed_ms(),
            "appointment completed"
        );

        Ok(appointment)
    }
}
