//! agenda-core: appointment scheduling engine.
//!
//! Books, reschedules and completes time-boxed professional/client
//! appointments while enforcing no-overlap guarantees and cancellation
//! policies. State transitions record domain events that a
//! dependency-injected bus dispatches to side-effect handlers
//! (notifications, calendar sync, evaluation prompts) after commit.
//!
//! The engine is transport-agnostic: its boundary is the use cases in
//! [`use_cases`], consuming collaborators through the traits in
//! [`ports`].

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod services;
pub mod use_cases;
pub mod validation;

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::adapters::{
    InMemoryAppointmentRepository, InMemoryCalendarSync, InMemoryCancellationPolicyRepository,
    InMemoryEvaluationRepository, InMemoryNotificationSender,
    InMemoryScheduleConfigurationRepository,
};
use crate::config::EngineConfig;
use crate::events::handlers::{CalendarSyncHandler, EvaluationPromptHandler, NotificationHandler};
use crate::events::{EventBus, EventKind};
use crate::ports::{
    AppointmentRepository, CalendarSync, CancellationPolicyRepository, EvaluationRepository,
    NotificationSender, ScheduleConfigurationRepository,
};
use crate::services::ProfessionalLocks;
use crate::use_cases::{
    ApproveReschedule, CancelAppointment, ConfirmAppointment, CreateAppointment,
    DeclineReschedule, MarkAppointmentAsCompleted, MarkAppointmentAsNoShow, RecordEvaluation,
    RescheduleAppointment, StartAppointment,
};

/// Setup logging. Call once from the integrating binary or a test.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}

/// Collaborators the engine consumes through its ports.
pub struct SchedulingDependencies {
    pub appointments: Arc<dyn AppointmentRepository>,
    pub configurations: Arc<dyn ScheduleConfigurationRepository>,
    pub policies: Arc<dyn CancellationPolicyRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
    pub notifier: Arc<dyn NotificationSender>,
    pub calendar: Arc<dyn CalendarSync>,
}

/// The wired scheduling engine: every use case sharing one bus, one
/// lock registry and one set of collaborators.
pub struct SchedulingEngine {
    pub create_appointment: CreateAppointment,
    pub confirm_appointment: ConfirmAppointment,
    pub cancel_appointment: CancelAppointment,
    pub reschedule_appointment: RescheduleAppointment,
    pub approve_reschedule: ApproveReschedule,
    pub decline_reschedule: DeclineReschedule,
    pub start_appointment: StartAppointment,
    pub mark_completed: MarkAppointmentAsCompleted,
    pub mark_no_show: MarkAppointmentAsNoShow,
    pub record_evaluation: RecordEvaluation,
    pub bus: Arc<EventBus>,
}

impl SchedulingEngine {
    /// Deterministic startup wiring: subscribe the built-in side-effect
    /// handlers, then construct the use cases.
    pub fn build(config: EngineConfig, deps: SchedulingDependencies, bus: Arc<EventBus>) -> Self {
        let notification = Arc::new(NotificationHandler::new(deps.notifier.clone()));
        bus.register_all(notification);

        let calendar_sync = Arc::new(CalendarSyncHandler::new(
            deps.calendar.clone(),
            deps.appointments.clone(),
            deps.configurations.clone(),
        ));
        bus.register(EventKind::Scheduled, calendar_sync.clone());
        bus.register(EventKind::Canceled, calendar_sync);

        let evaluation_prompt = Arc::new(EvaluationPromptHandler::new(
            deps.appointments.clone(),
            deps.notifier.clone(),
        ));
        bus.register(EventKind::Finished, evaluation_prompt);

        let locks = Arc::new(ProfessionalLocks::new());

        Self {
            create_appointment: CreateAppointment::new(
                deps.appointments.clone(),
                deps.configurations.clone(),
                deps.policies.clone(),
                locks.clone(),
            ),
            confirm_appointment: ConfirmAppointment::new(deps.appointments.clone()),
            cancel_appointment: CancelAppointment::new(
                deps.appointments.clone(),
                deps.policies.clone(),
            ),
            reschedule_appointment: RescheduleAppointment::new(
                deps.appointments.clone(),
                deps.configurations.clone(),
                deps.policies.clone(),
                locks,
            ),
            approve_reschedule: ApproveReschedule::new(deps.appointments.clone()),
            decline_reschedule: DeclineReschedule::new(deps.appointments.clone()),
            start_appointment: StartAppointment::new(deps.appointments.clone(), config),
            mark_completed: MarkAppointmentAsCompleted::new(deps.appointments.clone()),
            mark_no_show: MarkAppointmentAsNoShow::new(deps.appointments.clone()),
            record_evaluation: RecordEvaluation::new(deps.appointments, deps.evaluations),
            bus,
        }
    }
}

/// Handles onto the in-memory collaborators behind an engine built with
/// [`build_in_memory_engine`], for seeding and assertions.
pub struct InMemoryHandles {
    pub appointments: Arc<InMemoryAppointmentRepository>,
    pub configurations: Arc<InMemoryScheduleConfigurationRepository>,
    pub policies: Arc<InMemoryCancellationPolicyRepository>,
    pub evaluations: Arc<InMemoryEvaluationRepository>,
    pub notifier: Arc<InMemoryNotificationSender>,
    pub calendar: Arc<InMemoryCalendarSync>,
}

/// Wire a fully in-memory engine, for tests and local development.
pub fn build_in_memory_engine(config: EngineConfig) -> (SchedulingEngine, InMemoryHandles) {
    let bus = Arc::new(EventBus::new(config.handler_timeout));

    let handles = InMemoryHandles {
        appointments: Arc::new(InMemoryAppointmentRepository::new(bus.clone())),
        configurations: Arc::new(InMemoryScheduleConfigurationRepository::new()),
        policies: Arc::new(InMemoryCancellationPolicyRepository::new()),
        evaluations: Arc::new(InMemoryEvaluationRepository::new()),
        notifier: Arc::new(InMemoryNotificationSender::new()),
        calendar: Arc::new(InMemoryCalendarSync::new()),
    };

    let deps = SchedulingDependencies {
        appointments: handles.appointments.clone(),
        configurations: handles.configurations.clone(),
        policies: handles.policies.clone(),
        evaluations: handles.evaluations.clone(),
        notifier: handles.notifier.clone(),
        calendar: handles.calendar.clone(),
    };

    (SchedulingEngine::build(config, deps, bus), handles)
}
