//! Domain entities and value objects of the scheduling core.
//! Framework-agnostic; aggregates are mutated only through named commands.

pub mod appointment;
pub mod cancellation_policy;
pub mod evaluation;
pub mod schedule_configuration;
pub mod slot;

pub use appointment::{Appointment, AppointmentStatus, Modality, NewAppointment, PaymentStatus};
pub use cancellation_policy::CancellationPolicy;
pub use evaluation::Evaluation;
pub use schedule_configuration::{ScheduleConfiguration, WorkingHours};
pub use slot::TimeSlot;
