//! Book a new appointment for a professional.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::appointment::{Appointment, AppointmentStatus, Modality, NewAppointment};
use crate::domain::slot::TimeSlot;
use crate::error::DomainError;
use crate::ports::{
    AppointmentRepository, CancellationPolicyRepository, ScheduleConfigurationRepository,
};
use crate::services::{AvailabilityResolver, ProfessionalLocks};

#[derive(Debug)]
pub struct CreateAppointmentInput {
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub modality: Modality,
    pub agreed_price: BigDecimal,
}

pub struct CreateAppointment {
    appointments: Arc<dyn AppointmentRepository>,
    configurations: Arc<dyn ScheduleConfigurationRepository>,
    policies: Arc<dyn CancellationPolicyRepository>,
    resolver: AvailabilityResolver,
    locks: Arc<ProfessionalLocks>,
}

impl CreateAppointment {
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

    pub async fn execute(&self, input: CreateAppointmentInput) -> Result<Appointment, DomainError> {
        let slot = TimeSlot::new(input.start, input.end)?;

        let configuration = self
            .configurations
            .find_by_professional_id(input.professional_id)
            .await?
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "schedule configuration for professional {}",
                    input.professional_id
                ))
            })?;

        self.check_rebooking_cooldown(&input, &slot).await?;

        // Single-writer section per professional: the availability check
        // and the write must see a consistent set of appointments.
        let _guard = self.locks.acquire(input.professional_id).await;

        configuration.check(&slot)?;
        self.resolver
            .ensure_bookable(input.professional_id, &slot, &configuration, None)
            .await?;

        let mut appointment = Appointment::book(NewAppointment {
            client_id: input.client_id,
            professional_id: input.professional_id,
            slot,
            modality: input.modality,
            agreed_price: input.agreed_price,
        })?;

        self.appointments.create(&mut appointment).await?;

        tracing::info!(
            appointment_id = %appointment.id(),
            professional_id = %appointment.professional_id(),
            "appointment booked"
        );

        Ok(appointment)
    }

    /// A recent cancellation can impose a rebooking cooldown on the
    /// client under the professional's policy.
    async fn check_rebooking_cooldown(
        &self,
        input: &CreateAppointmentInput,
        slot: &TimeSlot,
    ) -> Result<(), DomainError> {
        let policy = match self
            .policies
            .find_by_professional_id(input.professional_id)
            .await?
        {
            Some(policy) if policy.min_days_before_next_appointment > 0 => policy,
            _ => return Ok(()),
        };

        let last_cancelled_end = self
            .appointments
            .find_many_by_professional_id(input.professional_id)
            .await?
            .into_iter()
            .filter(|a| {
                a.client_id() == input.client_id && a.status() == AppointmentStatus::Cancelled
            })
            .map(|a| a.effective_slot().end())
            .max();

        if let Some(last_end) = last_cancelled_end {
            if !policy.cooldown_ok(last_end, slot.start()) {
                return Err(DomainError::BadRequest(format!(
                    "client must wait {} days after a cancellation before rebooking",
                    policy.min_days_before_next_appointment
                )));
            }
        }

        Ok(())
    }
}
