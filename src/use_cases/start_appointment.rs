//! Begin a session at (or near) its effective start time.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::appointment::Appointment;
use crate::error::DomainError;
use crate::ports::AppointmentRepository;

#[derive(Debug)]
pub struct StartAppointmentInput {
    pub appointment_id: Uuid,
    pub actor_id: Uuid,
}

pub struct StartAppointment {
    appointments: Arc<dyn AppointmentRepository>,
    config: EngineConfig,
}

impl StartAppointment {
    pub fn new(appointments: Arc<dyn AppointmentRepository>, config: EngineConfig) -> Self {
        Self {
            appointments,
            config,
        }
    }

    pub async fn execute(&self, input: StartAppointmentInput) -> Result<Appointment, DomainError> {
        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        if input.actor_id != appointment.client_id()
            && input.actor_id != appointment.professional_id()
        {
            return Err(DomainError::NotAllowed(
                "only a party to the appointment may start it".to_string(),
            ));
        }

        appointment.start(
            Utc::now(),
            self.config.start_grace_minutes,
            self.config.require_payment_before_start,
        )?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(appointment_id = %appointment.id(), "session started");
        Ok(appointment)
    }
}
