//! Domain events and their dispatch machinery.
//!
//! Events are immutable facts recorded by the aggregate at the moment of
//! a state change and dispatched to registered handlers after the
//! repository write commits.

pub mod bus;
pub mod handlers;

pub use bus::{EventBus, EventHandler};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::appointment::{AppointmentStatus, Modality, PaymentStatus};
use crate::domain::slot::TimeSlot;

/// Plain-data copy of an appointment carried by every event. `start` and
/// `end` reflect the effective interval at the time the event was
/// recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentSnapshot {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub modality: Modality,
    pub agreed_price: BigDecimal,
    pub google_meet_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tagged union of everything the scheduling core announces. Each
/// variant carries a strongly-typed payload; handlers match exhaustively.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    Scheduled {
        appointment: AppointmentSnapshot,
    },
    Confirmed {
        appointment: AppointmentSnapshot,
    },
    Canceled {
        appointment: AppointmentSnapshot,
        fee: BigDecimal,
    },
    Rescheduled {
        appointment: AppointmentSnapshot,
        previous: TimeSlot,
        requested: TimeSlot,
    },
    Finished {
        appointment: AppointmentSnapshot,
    },
    NoShow {
        appointment: AppointmentSnapshot,
    },
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::Scheduled { .. } => EventKind::Scheduled,
            DomainEvent::Confirmed { .. } => EventKind::Confirmed,
            DomainEvent::Canceled { .. } => EventKind::Canceled,
            DomainEvent::Rescheduled { .. } => EventKind::Rescheduled,
            DomainEvent::Finished { .. } => EventKind::Finished,
            DomainEvent::NoShow { .. } => EventKind::NoShow,
        }
    }

    pub fn appointment(&self) -> &AppointmentSnapshot {
        match self {
            DomainEvent::Scheduled { appointment }
            | DomainEvent::Confirmed { appointment }
            | DomainEvent::Canceled { appointment, .. }
            | DomainEvent::Rescheduled { appointment, .. }
            | DomainEvent::Finished { appointment }
            | DomainEvent::NoShow { appointment } => appointment,
        }
    }

    pub fn aggregate_id(&self) -> Uuid {
        self.appointment().id
    }
}

/// Discriminant-only mirror of `DomainEvent`, used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Scheduled,
    Confirmed,
    Canceled,
    Rescheduled,
    Finished,
    NoShow,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Scheduled,
        EventKind::Confirmed,
        EventKind::Canceled,
        EventKind::Rescheduled,
        EventKind::Finished,
        EventKind::NoShow,
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventKind::Scheduled => "scheduled",
            EventKind::Confirmed => "confirmed",
            EventKind::Canceled => "canceled",
            EventKind::Rescheduled => "rescheduled",
            EventKind::Finished => "finished",
            EventKind::NoShow => "no_show",
        };
        write!(f, "{}", s)
    }
}
