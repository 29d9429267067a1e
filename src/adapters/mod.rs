//! Port implementations: in-memory for tests and local development,
//! Postgres for production appointment storage.

pub mod in_memory;
pub mod postgres;

pub use in_memory::{
    InMemoryAppointmentRepository, InMemoryCalendarSync, InMemoryCancellationPolicyRepository,
    InMemoryEvaluationRepository, InMemoryNotificationSender,
    InMemoryScheduleConfigurationRepository,
};
pub use postgres::{create_pool, PostgresAppointmentRepository};
