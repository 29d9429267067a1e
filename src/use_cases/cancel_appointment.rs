//! Cancel an appointment, computing the policy fee.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::appointment::Appointment;
use crate::domain::cancellation_policy::CancellationPolicy;
use crate::error::DomainError;
use crate::ports::{AppointmentRepository, CancellationPolicyRepository};

#[derive(Debug)]
pub struct CancelAppointmentInput {
    pub appointment_id: Uuid,
    /// Client or professional requesting the cancellation.
    pub actor_id: Uuid,
}

#[derive(Debug)]
pub struct CancelAppointmentOutput {
    pub appointment: Appointment,
    /// Zero when the notice met the policy minimum; the caller decides
    /// how to collect a non-zero fee.
    pub fee: BigDecimal,
}

pub struct CancelAppointment {
    appointments: Arc<dyn AppointmentRepository>,
    policies: Arc<dyn CancellationPolicyRepository>,
}

impl CancelAppointment {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        policies: Arc<dyn CancellationPolicyRepository>,
    ) -> Self {
        Self {
            appointments,
            policies,
        }
    }

    pub async fn execute(
        &self,
        input: CancelAppointmentInput,
    ) -> Result<CancelAppointmentOutput, DomainError> {
        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        if input.actor_id != appointment.client_id()
            && input.actor_id != appointment.professional_id()
        {
            return Err(DomainError::NotAllowed(
                "only a party to the appointment may cancel it".to_string(),
            ));
        }

        let policy = self
            .policies
            .find_by_professional_id(appointment.professional_id())
            .await?
            .unwrap_or_else(|| CancellationPolicy::permissive(appointment.professional_id()));

        let fee = appointment.cancel(Utc::now(), &policy)?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(
            appointment_id = %appointment.id(),
            fee = %fee,
            "appointment cancelled"
        );

        Ok(CancelAppointmentOutput { appointment, fee })
    }
}
