//! Scheduling use cases: the public boundary of the engine.
//! Each orchestrates entities, validators and the availability resolver
//! through the repository ports, and returns an explicit result.

pub mod cancel_appointment;
pub mod confirm_appointment;
pub mod create_appointment;
pub mod mark_completed;
pub mod mark_no_show;
pub mod record_evaluation;
pub mod reschedule_appointment;
pub mod resolve_reschedule;
pub mod start_appointment;

pub use cancel_appointment::{CancelAppointment, CancelAppointmentInput, CancelAppointmentOutput};
pub use confirm_appointment::{ConfirmAppointment, ConfirmAppointmentInput};
pub use create_appointment::{CreateAppointment, CreateAppointmentInput};
pub use mark_completed::{MarkAppointmentAsCompleted, MarkCompletedInput};
pub use mark_no_show::{MarkAppointmentAsNoShow, MarkNoShowInput};
pub use record_evaluation::{RecordEvaluation, RecordEvaluationInput};
pub use reschedule_appointment::{RescheduleAppointment, RescheduleAppointmentInput};
pub use resolve_reschedule::{ApproveReschedule, DeclineReschedule, ResolveRescheduleInput};
pub use start_appointment::{StartAppointment, StartAppointmentInput};
