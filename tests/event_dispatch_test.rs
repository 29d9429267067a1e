use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use uuid::Uuid;

use agenda_core::config::EngineConfig;
use agenda_core::domain::{
    Appointment, Modality, NewAppointment, ScheduleConfiguration, TimeSlot, WorkingHours,
};
use agenda_core::events::{DomainEvent, EventBus, EventHandler, EventKind};
use agenda_core::ports::{AppointmentRepository, RepositoryError};
use agenda_core::use_cases::CreateAppointmentInput;
use agenda_core::{build_in_memory_engine, InMemoryHandles, SchedulingEngine};

fn monday(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
}

fn configure(handles: &InMemoryHandles, professional_id: Uuid, enable_google_meet: bool) {
    handles.configurations.put(
        ScheduleConfiguration::new(
            professional_id,
            &[1, 2, 3, 4, 5],
            WorkingHours::parse("08:00", "18:00").unwrap(),
            60,
            15,
            vec![],
            enable_google_meet,
        )
        .unwrap(),
    );
}

struct Failing;

#[async_trait]
impl EventHandler for Failing {
    fn name(&self) -> &'static str {
        "always-failing"
    }

    async fn handle(&self, _event: &DomainEvent) -> anyhow::Result<()> {
        anyhow::bail!("downstream gateway unavailable")
    }
}

struct Collector {
    kinds: Arc<Mutex<Vec<EventKind>>>,
}

#[async_trait]
impl EventHandler for Collector {
    fn name(&self) -> &'static str {
        "collector"
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        self.kinds.lock().unwrap().push(event.kind());
        Ok(())
    }
}

#[tokio::test]
async fn test_failing_handler_never_rolls_back_the_booking() {
    let (engine, handles) = build_in_memory_engine(EngineConfig::default());
    let professional_id = Uuid::new_v4();
    configure(&handles, professional_id, false);

    // a broken side effect registered alongside the built-in handlers
    engine.bus.register(EventKind::Scheduled, Arc::new(Failing));

    let appointment = engine
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

    // the booking stands and later handlers still ran
    assert!(handles.appointments.find_by_id(appointment.id()).await.is_ok());
    assert!(
        handles
            .notifier
            .wait_for(1, StdDuration::from_secs(2))
            .await
    );
}

#[tokio::test]
async fn test_failed_save_leaves_events_queued() {
    let (_engine, handles) = build_in_memory_engine(EngineConfig::default());

    let start = monday(9, 0);
    let mut appointment = Appointment::book(NewAppointment {
        client_id: Uuid::new_v4(),
        professional_id: Uuid::new_v4(),
        slot: TimeSlot::new(start, start + Duration::hours(1)).unwrap(),
        modality: Modality::InPerson,
        agreed_price: BigDecimal::from(100),
    })
    .unwrap();

    // save without create fails; the event queue must survive for retry
    let result = handles.appointments.save(&mut appointment).await;
    assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    assert_eq!(appointment.take_events().len(), 1);
}

#[tokio::test]
async fn test_events_for_one_aggregate_dispatch_in_order() {
    let bus = EventBus::new(StdDuration::from_secs(1));
    let kinds = Arc::new(Mutex::new(Vec::new()));
    bus.register_all(Arc::new(Collector { kinds: kinds.clone() }));

    let start = monday(9, 0);
    let mut appointment = Appointment::book(NewAppointment {
        client_id: Uuid::new_v4(),
        professional_id: Uuid::new_v4(),
        slot: TimeSlot::new(start, start + Duration::hours(1)).unwrap(),
        modality: Modality::InPerson,
        agreed_price: BigDecimal::from(100),
    })
    .unwrap();
    appointment.confirm().unwrap();
    appointment.start(start, 60 * 24 * 365, false).unwrap();
    appointment.complete(start + Duration::hours(1)).unwrap();

    bus.dispatch(appointment.take_events()).await;

    assert_eq!(
        kinds.lock().unwrap().clone(),
        vec![EventKind::Scheduled, EventKind::Confirmed, EventKind::Finished]
    );
}

#[tokio::test]
async fn test_online_booking_gets_meet_link_when_enabled() {
    let config = EngineConfig::default();
    let bus = Arc::new(EventBus::new(config.handler_timeout));

    let appointments = Arc::new(
        agenda_core::adapters::InMemoryAppointmentRepository::new(bus.clone()),
    );
    let configurations =
        Arc::new(agenda_core::adapters::InMemoryScheduleConfigurationRepository::new());
    let policies = Arc::new(agenda_core::adapters::InMemoryCancellationPolicyRepository::new());
    let evaluations = Arc::new(agenda_core::adapters::InMemoryEvaluationRepository::new());
    let notifier = Arc::new(agenda_core::adapters::InMemoryNotificationSender::new());
    let calendar = Arc::new(agenda_core::adapters::InMemoryCalendarSync::with_meet_link(
        "https://meet.example/abc-defg-hij",
    ));

    let engine = SchedulingEngine::build(
        config,
        agenda_core::SchedulingDependencies {
            appointments: appointments.clone(),
            configurations: configurations.clone(),
            policies,
            evaluations,
            notifier,
            calendar: calendar.clone(),
        },
        bus,
    );

    let professional_id = Uuid::new_v4();
    configurations.put(
        ScheduleConfiguration::new(
            professional_id,
            &[1, 2, 3, 4, 5],
            WorkingHours::parse("08:00", "18:00").unwrap(),
            60,
            15,
            vec![],
            true,
        )
        .unwrap(),
    );

    let appointment = engine
        .create_appointment
        .execute(CreateAppointmentInput {
            client_id: Uuid::new_v4(),
            professional_id,
            start: monday(9, 0),
            end: monday(10, 0),
            modality: Modality::Online,
            agreed_price: BigDecimal::from(100),
        })
        .await
        .unwrap();

    let deadline = tokio::time::Instant::now() + StdDuration::from_secs(2);
    loop {
        let stored = appointments.find_by_id(appointment.id()).await.unwrap();
        if stored.google_meet_link().is_some() {
            assert_eq!(
                stored.google_meet_link(),
                Some("https://meet.example/abc-defg-hij")
            );
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "meet link was never attached"
        );
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }

    assert_eq!(calendar.upserts(), vec![appointment.id()]);
}

#[tokio::test]
async fn test_in_person_booking_syncs_without_meet_link() {
    let (engine, handles) = build_in_memory_engine(EngineConfig::default());
    let professional_id = Uuid::new_v4();
    configure(&handles, professional_id, true);

    let appointment = engine
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

    let deadline = tokio::time::Instant::now() + StdDuration::from_secs(2);
    while handles.calendar.upserts().is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(StdDuration::from_millis(5)).await;
    }

    assert_eq!(handles.calendar.upserts(), vec![appointment.id()]);
    let stored = handles.appointments.find_by_id(appointment.id()).await.unwrap();
    assert!(stored.google_meet_link().is_none());
}
