//! Request a reschedule to a new interval.
//!
//! The request stays pending on the appointment until it is approved and
//! re-confirmed, preserving the audit trail of requested vs. committed
//! time. A pending request already blocks the new interval for other
//! bookings.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::appointment::Appointment;
use crate::domain::slot::TimeSlot;
use crate::error::DomainError;
use crate::ports::{
    AppointmentRepository, CancellationPolicyRepository, ScheduleConfigurationRepository,
};
use crate::services::{AvailabilityResolver, ProfessionalLocks};

#[derive(Debug)]
pub struct RescheduleAppointmentInput {
    pub appointment_id: Uuid,
    pub actor_id: Uuid,
    pub new_start: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
}

pub struct RescheduleAppointment {
    appointments: Arc<dyn AppointmentRepository>,
    configurations: Arc<dyn ScheduleConfigurationRepository>,
    policies: Arc<dyn CancellationPolicyRepository>,
    resolver: AvailabilityResolver,
    locks: Arc<ProfessionalLocks>,
}

impl RescheduleAppointment {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        configurations: Arc<dyn ScheduleConfigurationRepository>,
        policies: Arc<dyn CancellationPolicyRepository>,
        locks: Arc<ProfessionalLocks>,
    ) -> Self {
        let resolver = AvailabilityResolver::new(appointments.clone());
        Self {
            appointments,
            configurations,
            policies,
            resolver,
            locks,
        }
    }

    pub async fn execute(
        &self,
        input: RescheduleAppointmentInput,
    ) -> Result<Appointment, DomainError> {
        let requested = TimeSlot::new(input.new_start, input.new_end)?;

        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        if input.actor_id != appointment.client_id()
            && input.actor_id != appointment.professional_id()
        {
            return Err(DomainError::NotAllowed(
                "only a party to the appointment may reschedule it".to_string(),
            ));
        }

        let professional_id = appointment.professional_id();

        let allow_reschedule = self
            .policies
            .find_by_professional_id(professional_id)
            .await?
            .map(|policy| policy.allow_reschedule)
            .unwrap_or(true);
        if !allow_reschedule {
            return Err(DomainError::BadRequest(
                "the professional's policy does not allow rescheduling".to_string(),
            ));
        }

        let configuration = self
            .configurations
            .find_by_professional_id(professional_id)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "schedule configuration for professional {}",
                    professional_id
                ))
            })?;

        let _guard = self.locks.acquire(professional_id).await;

        configuration.check(&requested)?;
        self.resolver
            .ensure_bookable(
                professional_id,
                &requested,
                &configuration,
                Some(appointment.id()),
            )
            .await?;

        appointment.request_reschedule(requested)?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(
            appointment_id = %appointment.id(),
            new_start = %requested.start(),
            "reschedule requested"
        );

        Ok(appointment)
    }
}
