//! In-memory implementations of every port.
//!
//! All data lives in maps behind locks, giving fast, deterministic and
//! isolated execution for unit and integration tests as well as local
//! development without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::appointment::{Appointment, AppointmentStatus};
use crate::domain::cancellation_policy::CancellationPolicy;
use crate::domain::evaluation::Evaluation;
use crate::domain::schedule_configuration::ScheduleConfiguration;
use crate::events::{AppointmentSnapshot, EventBus};
use crate::ports::{
    AppointmentRepository, CalendarSync, CancellationPolicyRepository, EvaluationRepository,
    NotificationSender, RepositoryError, RepositoryResult, ScheduleConfigurationRepository,
};

#[derive(Clone)]
pub struct InMemoryAppointmentRepository {
    data: Arc<RwLock<HashMap<Uuid, Appointment>>>,
    bus: Arc<EventBus>,
}

impl InMemoryAppointmentRepository {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            bus,
        }
    }

    pub fn count(&self) -> usize {
        self.data.read().unwrap().len()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Appointment> {
        self.data
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(format!("appointment {}", id)))
    }

    async fn find_overlapping(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> RepositoryResult<Vec<Appointment>> {
        let data = self.data.read().unwrap();
        Ok(data
            .values()
            .filter(|a| a.professional_id() == professional_id)
            .filter(|a| Some(a.id()) != excluding)
            .filter(|a| a.blocks())
            .filter(|a| {
                let slot = a.effective_slot();
                slot.start() < end && slot.end() > start
            })
            .cloned()
            .collect())
    }

    async fn find_many_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> RepositoryResult<Vec<Appointment>> {
        let data = self.data.read().unwrap();
        Ok(data
            .values()
            .filter(|a| a.professional_id() == professional_id)
            .cloned()
            .collect())
    }

    async fn find_many_by_status(
        &self,
        status: AppointmentStatus,
    ) -> RepositoryResult<Vec<Appointment>> {
        let data = self.data.read().unwrap();
        Ok(data
            .values()
            .filter(|a| a.status() == status)
            .cloned()
            .collect())
    }

    async fn create(&self, appointment: &mut Appointment) -> RepositoryResult<()> {
        let mut data = self.data.write().unwrap();
        if data.contains_key(&appointment.id()) {
            return Err(RepositoryError::Conflict(format!(
                "appointment {} already exists",
                appointment.id()
            )));
        }

        // drained only after the write is known to succeed
        let events = appointment.take_events();
        data.insert(appointment.id(), appointment.clone());
        drop(data);

        self.bus.clone().dispatch_background(events);
        Ok(())
    }

    async fn save(&self, appointment: &mut Appointment) -> RepositoryResult<()> {
        let mut data = self.data.write().unwrap();
        if !data.contains_key(&appointment.id()) {
            return Err(RepositoryError::NotFound(format!(
                "appointment {}",
                appointment.id()
            )));
        }

        let events = appointment.take_events();
        data.insert(appointment.id(), appointment.clone());
        drop(data);

        self.bus.clone().dispatch_background(events);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryScheduleConfigurationRepository {
    data: RwLock<HashMap<Uuid, ScheduleConfiguration>>,
}

impl InMemoryScheduleConfigurationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, configuration: ScheduleConfiguration) {
        self.data
            .write()
            .unwrap()
            .insert(configuration.professional_id(), configuration);
    }
}

#[async_trait]
impl ScheduleConfigurationRepository for InMemoryScheduleConfigurationRepository {
    async fn find_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> RepositoryResult<Option<ScheduleConfiguration>> {
        Ok(self.data.read().unwrap().get(&professional_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryCancellationPolicyRepository {
    data: RwLock<HashMap<Uuid, CancellationPolicy>>,
}

impl InMemoryCancellationPolicyRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, policy: CancellationPolicy) {
        self.data
            .write()
            .unwrap()
            .insert(policy.professional_id, policy);
    }
}

#[async_trait]
impl CancellationPolicyRepository for InMemoryCancellationPolicyRepository {
    async fn find_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> RepositoryResult<Option<CancellationPolicy>> {
        Ok(self.data.read().unwrap().get(&professional_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryEvaluationRepository {
    data: RwLock<HashMap<Uuid, Evaluation>>,
}

impl InMemoryEvaluationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvaluationRepository for InMemoryEvaluationRepository {
    async fn create(&self, evaluation: &Evaluation) -> RepositoryResult<()> {
        let mut data = self.data.write().unwrap();
        if data.contains_key(&evaluation.appointment_id) {
            return Err(RepositoryError::Conflict(format!(
                "appointment {} already has an evaluation",
                evaluation.appointment_id
            )));
        }
        data.insert(evaluation.appointment_id, evaluation.clone());
        Ok(())
    }

    async fn find_by_appointment_id(
        &self,
        appointment_id: Uuid,
    ) -> RepositoryResult<Option<Evaluation>> {
        Ok(self.data.read().unwrap().get(&appointment_id).cloned())
    }
}

/// Records outbound messages instead of sending them.
#[derive(Default)]
pub struct InMemoryNotificationSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl InMemoryNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Wait until at least `count` messages were recorded. Dispatch runs
    /// on a background task, so assertions poll with a deadline.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.sent.lock().unwrap().len() >= count {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl NotificationSender for InMemoryNotificationSender {
    async fn send_message(&self, destination: &str, content: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), content.to_string()));
        Ok(())
    }
}

/// Records calendar operations; optionally hands out a conference link.
#[derive(Default)]
pub struct InMemoryCalendarSync {
    meet_link: Option<String>,
    upserts: Mutex<Vec<Uuid>>,
    removals: Mutex<Vec<Uuid>>,
}

impl InMemoryCalendarSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_meet_link(link: impl Into<String>) -> Self {
        Self {
            meet_link: Some(link.into()),
            ..Self::default()
        }
    }

    pub fn upserts(&self) -> Vec<Uuid> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<Uuid> {
        self.removals.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarSync for InMemoryCalendarSync {
    async fn upsert_event(
        &self,
        appointment: &AppointmentSnapshot,
    ) -> anyhow::Result<Option<String>> {
        self.upserts.lock().unwrap().push(appointment.id);
        Ok(self.meet_link.clone())
    }

    async fn remove_event(&self, appointment_id: Uuid) -> anyhow::Result<()> {
        self.removals.lock().unwrap().push(appointment_id);
        Ok(())
    }
}
