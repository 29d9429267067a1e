//! Confirm a scheduled or rescheduled appointment.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::appointment::Appointment;
use crate::error::DomainError;
use crate::ports::AppointmentRepository;

#[derive(Debug)]
pub struct ConfirmAppointmentInput {
    pub appointment_id: Uuid,
}

pub struct ConfirmAppointment {
    appointments: Arc<dyn AppointmentRepository>,
}

impl ConfirmAppointment {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn execute(
        &self,
        input: ConfirmAppointmentInput,
    ) -> Result<Appointment, DomainError> {
        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        appointment.confirm()?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(appointment_id = %appointment.id(), "appointment confirmed");
        Ok(appointment)
    }
}
