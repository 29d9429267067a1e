//! Built-in side-effect handlers wired onto the bus at startup.

use std::sync::Arc;

use async_trait::async_trait;

use super::bus::EventHandler;
use super::{AppointmentSnapshot, DomainEvent};
use crate::domain::appointment::{AppointmentStatus, Modality};
use crate::ports::{
    AppointmentRepository, CalendarSync, NotificationSender, ScheduleConfigurationRepository,
};

/// Sends client-facing messages for every appointment transition.
///
/// The destination is the client id; the integrating application maps
/// ids to channel addresses inside its `NotificationSender`.
pub struct NotificationHandler {
    notifier: Arc<dyn NotificationSender>,
}

impl NotificationHandler {
    pub fn new(notifier: Arc<dyn NotificationSender>) -> Self {
        Self { notifier }
    }

    fn message_for(event: &DomainEvent) -> String {
        let appointment = event.appointment();
        match event {
            DomainEvent::Scheduled { .. } => format!(
                "Your appointment on {} was booked and awaits confirmation.",
                appointment.start.format("%Y-%m-%d %H:%M")
            ),
            DomainEvent::Confirmed { .. } => format!(
                "Your appointment on {} is confirmed.",
                appointment.start.format("%Y-%m-%d %H:%M")
            ),
            DomainEvent::Canceled { fee, .. } => {
                if fee > &bigdecimal::BigDecimal::from(0) {
                    format!(
                        "Your appointment was cancelled. A cancellation fee of {} applies.",
                        fee
                    )
                } else {
                    "Your appointment was cancelled.".to_string()
                }
            }
            DomainEvent::Rescheduled { requested, .. } => format!(
                "A reschedule to {} was requested for your appointment.",
                requested.start().format("%Y-%m-%d %H:%M")
            ),
            DomainEvent::Finished { .. } => {
                "Your session has finished. Thank you!".to_string()
            }
            DomainEvent::NoShow { .. } => format!(
                "You missed your appointment on {}.",
                appointment.start.format("%Y-%m-%d %H:%M")
            ),
        }
    }
}

#[async_trait]
impl EventHandler for NotificationHandler {
    fn name(&self) -> &'static str {
        "notification"
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        let destination = event.appointment().client_id.to_string();
        let content = Self::message_for(event);
        self.notifier.send_message(&destination, &content).await
    }
}

/// Mirrors bookings into the external calendar; attaches the conference
/// link to online appointments when the professional enables it.
pub struct CalendarSyncHandler {
    calendar: Arc<dyn CalendarSync>,
    appointments: Arc<dyn AppointmentRepository>,
    configurations: Arc<dyn ScheduleConfigurationRepository>,
}

impl CalendarSyncHandler {
    pub fn new(
        calendar: Arc<dyn CalendarSync>,
        appointments: Arc<dyn AppointmentRepository>,
        configurations: Arc<dyn ScheduleConfigurationRepository>,
    ) -> Self {
        Self {
            calendar,
            appointments,
            configurations,
        }
    }

    async fn sync_booking(&self, snapshot: &AppointmentSnapshot) -> anyhow::Result<()> {
        let link = self.calendar.upsert_event(snapshot).await?;

        if snapshot.modality != Modality::Online {
            return Ok(());
        }

        let meet_enabled = self
            .configurations
            .find_by_professional_id(snapshot.professional_id)
            .await?
            .map(|config| config.enable_google_meet())
            .unwrap_or(false);

        if let (true, Some(link)) = (meet_enabled, link) {
            let mut appointment = self.appointments.find_by_id(snapshot.id).await?;
            if appointment.google_meet_link().is_none() {
                appointment.attach_meet_link(link);
                self.appointments.save(&mut appointment).await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for CalendarSyncHandler {
    fn name(&self) -> &'static str {
        "calendar-sync"
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        match event {
            DomainEvent::Scheduled { appointment } => self.sync_booking(appointment).await,
            DomainEvent::Canceled { appointment, .. } => {
                self.calendar.remove_event(appointment.id).await
            }
            _ => Ok(()),
        }
    }
}

/// Moves a finished appointment into the evaluation window and prompts
/// the client for a score.
pub struct EvaluationPromptHandler {
    appointments: Arc<dyn AppointmentRepository>,
    notifier: Arc<dyn NotificationSender>,
}

impl EvaluationPromptHandler {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        notifier: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            appointments,
            notifier,
        }
    }
}

#[async_trait]
impl EventHandler for EvaluationPromptHandler {
    fn name(&self) -> &'static str {
        "evaluation-prompt"
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        let snapshot = match event {
            DomainEvent::Finished { appointment } => appointment,
            _ => return Ok(()),
        };

        let mut appointment = self.appointments.find_by_id(snapshot.id).await?;
        if appointment.status() != AppointmentStatus::Completed {
            return Ok(());
        }

        appointment
            .to_awaiting_score()
            .map_err(|err| anyhow::anyhow!(err))?;
        self.appointments.save(&mut appointment).await?;

        self.notifier
            .send_message(
                &snapshot.client_id.to_string(),
                "How was your session? Please rate it from 1 to 5.",
            )
            .await
    }
}
