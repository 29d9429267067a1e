use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::str::FromStr;
use uuid::Uuid;

use agenda_core::config::EngineConfig;
use agenda_core::domain::{
    AppointmentStatus, CancellationPolicy, Modality, ScheduleConfiguration, WorkingHours,
};
use agenda_core::error::DomainError;
use agenda_core::use_cases::{
    ConfirmAppointmentInput, CreateAppointmentInput, RescheduleAppointmentInput,
    ResolveRescheduleInput,
};
use agenda_core::{build_in_memory_engine, InMemoryHandles, SchedulingEngine};

fn engine() -> (SchedulingEngine, InMemoryHandles) {
    build_in_memory_engine(EngineConfig::default())
}

fn configure(handles: &InMemoryHandles, professional_id: Uuid) {
    handles.configurations.put(
        ScheduleConfiguration::new(
            professional_id,
            &[1, 2, 3, 4, 5],
            WorkingHours::parse("08:00", "18:00").unwrap(),
            60,
            15,
            vec![],
            false,
        )
        .unwrap(),
    );
}

/// 2025-03-10 is a Monday.
fn monday(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
}

async fn book(
    engine: &SchedulingEngine,
    client_id: Uuid,
    professional_id: Uuid,
    start: DateTime<Utc>,
) -> agenda_core::domain::Appointment {
    engine
        .create_appointment
        .execute(CreateAppointmentInput {
            client_id,
            professional_id,
            start,
            end: start + Duration::hours(1),
            modality: Modality::InPerson,
            agreed_price: BigDecimal::from(100),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_reschedule_request_stays_pending() {
    let (engine, handles) = engine();
    let professional_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let appointment = book(&engine, client_id, professional_id, monday(9, 0)).await;

    let updated = engine
        .reschedule_appointment
        .execute(RescheduleAppointmentInput {
            appointment_id: appointment.id(),
            actor_id: client_id,
            new_start: monday(14, 0),
            new_end: monday(15, 0),
        })
        .await
        .unwrap();

    // pending, not committed
    assert_eq!(updated.status(), AppointmentStatus::Scheduled);
    assert_eq!(updated.slot().start(), monday(9, 0));
    assert_eq!(updated.effective_slot().start(), monday(14, 0));
}

#[tokio::test]
async fn test_pending_reschedule_blocks_requested_interval() {
    let (engine, handles) = engine();
    let professional_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let appointment = book(&engine, client_id, professional_id, monday(9, 0)).await;
    engine
        .reschedule_appointment
        .execute(RescheduleAppointmentInput {
            appointment_id: appointment.id(),
            actor_id: client_id,
            new_start: monday(14, 0),
            new_end: monday(15, 0),
        })
        .await
        .unwrap();

    // another client cannot book the requested interval
    let result = engine
        .create_appointment
        .execute(CreateAppointmentInput {
            client_id: Uuid::new_v4(),
            professional_id,
            start: monday(14, 0),
            end: monday(15, 0),
            modality: Modality::InPerson,
            agreed_price: BigDecimal::from(100),
        })
        .await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));

    // the original interval is released by the pending request
    engine
        .create_appointment
        .execute(CreateAppointmentInput {
            client_id: Uuid::new_v4(),
            professional_id,
            start: monday(9, 0),
            end: monday(10, 0),
            modality: Modality::InPerson,
            agreed_price: BigDecimal::from(100),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reschedule_forbidden_by_policy() {
    let (engine, handles) = engine();
    let professional_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    configure(&handles, professional_id);
    handles.policies.put(
        CancellationPolicy::new(
            professional_id,
            24,
            0,
            BigDecimal::from_str("0.25").unwrap(),
            false,
        )
        .unwrap(),
    );

    let appointment = book(&engine, client_id, professional_id, monday(9, 0)).await;

    let result = engine
        .reschedule_appointment
        .execute(RescheduleAppointmentInput {
            appointment_id: appointment.id(),
            actor_id: client_id,
            new_start: monday(14, 0),
            new_end: monday(15, 0),
        })
        .await;

    assert!(matches!(result, Err(DomainError::BadRequest(_))));
}

#[tokio::test]
async fn test_reschedule_into_conflict_fails() {
    let (engine, handles) = engine();
    let professional_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let appointment = book(&engine, client_id, professional_id, monday(9, 0)).await;
    book(&engine, Uuid::new_v4(), professional_id, monday(14, 0)).await;

    let result = engine
        .reschedule_appointment
        .execute(RescheduleAppointmentInput {
            appointment_id: appointment.id(),
            actor_id: client_id,
            new_start: monday(14, 0),
            new_end: monday(15, 0),
        })
        .await;

    assert!(matches!(result, Err(DomainError::Conflict(_))));
}

#[tokio::test]
async fn test_reschedule_excludes_the_moved_appointment() {
    let (engine, handles) = engine();
    let professional_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let appointment = book(&engine, client_id, professional_id, monday(9, 0)).await;

    // shifting within the buffer of its own interval is fine
    engine
        .reschedule_appointment
        .execute(RescheduleAppointmentInput {
            appointment_id: appointment.id(),
            actor_id: client_id,
            new_start: monday(10, 0),
            new_end: monday(11, 0),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_reschedule_outside_window_fails() {
    let (engine, handles) = engine();
    let professional_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let appointment = book(&engine, client_id, professional_id, monday(9, 0)).await;

    let result = engine
        .reschedule_appointment
        .execute(RescheduleAppointmentInput {
            appointment_id: appointment.id(),
            actor_id: client_id,
            new_start: monday(19, 0),
            new_end: monday(20, 0),
        })
        .await;

    assert!(matches!(result, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn test_approval_then_confirmation_commits_new_interval() {
    let (engine, handles) = engine();
    let professional_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let appointment = book(&engine, client_id, professional_id, monday(9, 0)).await;
    engine
        .reschedule_appointment
        .execute(RescheduleAppointmentInput {
            appointment_id: appointment.id(),
            actor_id: client_id,
            new_start: monday(14, 0),
            new_end: monday(15, 0),
        })
        .await
        .unwrap();

    let approved = engine
        .approve_reschedule
        .execute(ResolveRescheduleInput {
            appointment_id: appointment.id(),
            professional_id,
        })
        .await
        .unwrap();
    assert_eq!(approved.status(), AppointmentStatus::Rescheduled);

    let confirmed = engine
        .confirm_appointment
        .execute(ConfirmAppointmentInput {
            appointment_id: appointment.id(),
        })
        .await
        .unwrap();
    assert_eq!(confirmed.status(), AppointmentStatus::Confirmed);
    assert_eq!(confirmed.slot().start(), monday(14, 0));
    assert!(confirmed.reschedule_slot().is_none());
}

#[tokio::test]
async fn test_decline_restores_original_interval() {
    let (engine, handles) = engine();
    let professional_id = Uuid::new_v4();
    let client_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let appointment = book(&engine, client_id, professional_id, monday(9, 0)).await;
    engine
        .reschedule_appointment
        .execute(RescheduleAppointmentInput {
            appointment_id: appointment.id(),
            actor_id: client_id,
            new_start: monday(14, 0),
            new_end: monday(15, 0),
        })
        .await
        .unwrap();

    let declined = engine
        .decline_reschedule
        .execute(ResolveRescheduleInput {
            appointment_id: appointment.id(),
            professional_id,
        })
        .await
        .unwrap();

    assert_eq!(declined.status(), AppointmentStatus::Scheduled);
    assert_eq!(declined.effective_slot().start(), monday(9, 0));

    // the requested interval is free again
    engine
        .create_appointment
        .execute(CreateAppointmentInput {
            client_id: Uuid::new_v4(),
            professional_id,
            start: monday(14, 0),
            end: monday(15, 0),
            modality: Modality::InPerson,
            agreed_price: BigDecimal::from(100),
        })
        .await
        .unwrap();
}
