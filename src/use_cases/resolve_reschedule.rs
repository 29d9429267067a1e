//! Approve or decline a pending reschedule request.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::appointment::Appointment;
use crate::error::DomainError;
use crate::ports::AppointmentRepository;

#[derive(Debug)]
pub struct ResolveRescheduleInput {
    pub appointment_id: Uuid,
    pub professional_id: Uuid,
}

/// The professional commits a pending request; the appointment moves to
/// `Rescheduled` and awaits client confirmation.
pub struct ApproveReschedule {
    appointments: Arc<dyn AppointmentRepository>,
}

impl ApproveReschedule {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn execute(
        &self,
        input: ResolveRescheduleInput,
    ) -> Result<Appointment, DomainError> {
        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        if input.professional_id != appointment.professional_id() {
            return Err(DomainError::NotAllowed(
                "only the assigned professional may approve a reschedule".to_string(),
            ));
        }

        appointment.approve_reschedule()?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(appointment_id = %appointment.id(), "reschedule approved");
        Ok(appointment)
    }
}

/// The professional declines the request; the original interval stays
/// binding.
pub struct DeclineReschedule {
    appointments: Arc<dyn AppointmentRepository>,
}

impl DeclineReschedule {
    pub fn new(appointments: Arc<dyn AppointmentRepository>) -> Self {
        Self { appointments }
    }

    pub async fn execute(
        &self,
        input: ResolveRescheduleInput,
    ) -> Result<Appointment, DomainError> {
        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        if input.professional_id != appointment.professional_id() {
            return Err(DomainError::NotAllowed(
                "only the assigned professional may decline a reschedule".to_string(),
            ));
        }

        appointment.decline_reschedule()?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(appointment_id = %appointment.id(), "reschedule declined");
        Ok(appointment)
    }
}
