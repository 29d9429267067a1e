use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use agenda_core::config::EngineConfig;
use agenda_core::domain::{Modality, ScheduleConfiguration, WorkingHours};
use agenda_core::error::DomainError;
use agenda_core::use_cases::CreateAppointmentInput;
use agenda_core::{build_in_memory_engine, InMemoryHandles};

fn monday(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
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

fn booking(professional_id: Uuid, start: DateTime<Utc>) -> CreateAppointmentInput {
    CreateAppointmentInput {
        client_id: Uuid::new_v4(),
        professional_id,
        start,
        end: start + Duration::hours(1),
        modality: Modality::InPerson,
        agreed_price: BigDecimal::from(100),
    }
}

#[tokio::test]
async fn test_racing_bookings_for_one_slot_yield_one_winner() {
    let (engine, handles) = build_in_memory_engine(EngineConfig::default());
    let engine = Arc::new(engine);
    let professional_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .create_appointment
                .execute(booking(professional_id, monday(9, 0)))
                .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(DomainError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
    assert_eq!(handles.appointments.count(), 1);
}

#[tokio::test]
async fn test_many_racing_bookings_store_exactly_one_appointment() {
    let (engine, handles) = build_in_memory_engine(EngineConfig::default());
    let engine = Arc::new(engine);
    let professional_id = Uuid::new_v4();
    configure(&handles, professional_id);

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .create_appointment
                .execute(booking(professional_id, monday(11, 0)))
                .await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(handles.appointments.count(), 1);
}

#[tokio::test]
async fn test_different_professionals_book_in_parallel() {
    let (engine, handles) = build_in_memory_engine(EngineConfig::default());
    let engine = Arc::new(engine);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let professional_id = Uuid::new_v4();
        configure(&handles, professional_id);
        let engine = engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .create_appointment
                .execute(booking(professional_id, monday(9, 0)))
                .await
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(handles.appointments.count(), 8);
}
