//! Collaborator contracts consumed by the scheduling core.
//! Implementations live in `adapters` or in the integrating application.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::cancellation_policy::CancellationPolicy;
use crate::domain::evaluation::Evaluation;
use crate::domain::schedule_configuration::ScheduleConfiguration;
use crate::events::AppointmentSnapshot;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound(err.to_string()),
            other => RepositoryError::Storage(other.to_string()),
        }
    }
}

/// Appointment persistence. `create` and `save` must trigger event
/// dispatch for the aggregate after the write commits; a failed write
/// leaves the aggregate's event queue intact for a safe retry.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Appointment>;

    /// Appointments in a blocking status whose effective interval
    /// overlaps `[start, end)`, optionally excluding one id (the
    /// appointment being moved).
    async fn find_overlapping(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> RepositoryResult<Vec<Appointment>>;

    async fn find_many_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> RepositoryResult<Vec<Appointment>>;

    async fn find_many_by_status(
        &self,
        status: AppointmentStatus,
    ) -> RepositoryResult<Vec<Appointment>>;

    async fn create(&self, appointment: &mut Appointment) -> RepositoryResult<()>;

    async fn save(&self, appointment: &mut Appointment) -> RepositoryResult<()>;
}

#[async_trait]
pub trait ScheduleConfigurationRepository: Send + Sync {
    async fn find_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> RepositoryResult<Option<ScheduleConfiguration>>;
}

#[async_trait]
pub trait CancellationPolicyRepository: Send + Sync {
    async fn find_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> RepositoryResult<Option<CancellationPolicy>>;
}

#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    async fn create(&self, evaluation: &Evaluation) -> RepositoryResult<()>;

    async fn find_by_appointment_id(
        &self,
        appointment_id: Uuid,
    ) -> RepositoryResult<Option<Evaluation>>;
}

/// Outbound message gateway (WhatsApp, email). Called by event handlers
/// only, never by use cases directly.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_message(&self, destination: &str, content: &str) -> anyhow::Result<()>;
}

/// External calendar integration. Failures are non-fatal to scheduling.
#[async_trait]
pub trait CalendarSync: Send + Sync {
    /// Create or update the calendar entry for an appointment. Returns
    /// the conference link when the backend generates one.
    async fn upsert_event(&self, appointment: &AppointmentSnapshot)
        -> anyhow::Result<Option<String>>;

    async fn remove_event(&self, appointment_id: Uuid) -> anyhow::Result<()>;
}
