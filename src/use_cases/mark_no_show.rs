//! Record a client absence after the appointment window has passed.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::appointment::Appointment;
use crate::error::DomainError;
use crate::ports::AppointmentRepository;

#[derive(Debug)]
pub struct MarkNoShowInput {
    pub appointment_id: Uuid,
    pub professional_id: Uuid,
}

pub struct MarkAppointmentAsNoShow {
    appointments: Arc<dyn AppointmentRepository>,
}

impl MarkAppointmentAsNoShow {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn execute(&self, input: MarkNoShowInput) -> Result<Appointment, DomainError> {
        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        if input.professional_id != appointment.professional_id() {
            return Err(DomainError::NotAllowed(
                "only the assigned professional may mark a no-show".to_string(),
            ));
        }

        appointment.mark_no_show(Utc::now())?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(appointment_id = %appointment.id(), "appointment marked as no-show");
        Ok(appointment)
    }
}
