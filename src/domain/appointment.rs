use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use uuid::Uuid;

use crate::domain::cancellation_policy::CancellationPolicy;
use crate::domain::slot::TimeSlot;
use crate::error::DomainError;
use crate::events::{AppointmentSnapshot, DomainEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Rescheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    AwaitingScore,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Rescheduled => "rescheduled",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
            AppointmentStatus::AwaitingScore => "awaiting_score",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "rescheduled" => Ok(AppointmentStatus::Rescheduled),
            "in_progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            "awaiting_score" => Ok(AppointmentStatus::AwaitingScore),
            other => Err(format!("unknown appointment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Succeeded,
    Failed,
    Refunded,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "succeeded" => Ok(PaymentStatus::Succeeded),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    InPerson,
    Online,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::InPerson => write!(f, "in_person"),
            Modality::Online => write!(f, "online"),
        }
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_person" => Ok(Modality::InPerson),
            "online" => Ok(Modality::Online),
            other => Err(format!("unknown modality: {}", other)),
        }
    }
}

/// Booking request for a new appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub slot: TimeSlot,
    pub modality: Modality,
    pub agreed_price: BigDecimal,
}

/// Flat persistence view of an appointment, used by repository adapters.
#[derive(Debug, Clone)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub client_id: Uuid,
    pub professional_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub reschedule_start: Option<DateTime<Utc>>,
    pub reschedule_end: Option<DateTime<Utc>>,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub modality: Modality,
    pub agreed_price: BigDecimal,
    pub google_meet_link: Option<String>,
    pub evaluation_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub total_elapsed_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Appointment aggregate root.
///
/// State changes go through the named commands below; each either
/// completes the transition and records the corresponding domain event,
/// or fails without touching any field. Recorded events stay queued on
/// the aggregate until a repository write drains them for dispatch.
#[derive(Debug, Clone)]
pub struct Appointment {
    id: Uuid,
    client_id: Uuid,
    professional_id: Uuid,
    slot: TimeSlot,
    reschedule_slot: Option<TimeSlot>,
    status: AppointmentStatus,
    payment_status: PaymentStatus,
    modality: Modality,
    agreed_price: BigDecimal,
    google_meet_link: Option<String>,
    evaluation_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    started_instant: Option<Instant>,
    total_elapsed_ms: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pending_events: Vec<DomainEvent>,
}

impl Appointment {
    /// Book a new appointment in `Scheduled` status.
    pub fn book(request: NewAppointment) -> Result<Self, DomainError> {
        if request.agreed_price < BigDecimal::from(0) {
            return Err(DomainError::NegativeValue(
                "agreed price cannot be negative".to_string(),
            ));
        }

        let now = Utc::now();
        let mut appointment = Self {
            id: Uuid::new_v4(),
            client_id: request.client_id,
            professional_id: request.professional_id,
            slot: request.slot,
            reschedule_slot: None,
            status: AppointmentStatus::Scheduled,
            payment_status: PaymentStatus::Pending,
            modality: request.modality,
            agreed_price: request.agreed_price,
            google_meet_link: None,
            evaluation_id: None,
            started_at: None,
            started_instant: None,
            total_elapsed_ms: None,
            created_at: now,
            updated_at: now,
            pending_events: Vec::new(),
        };

        let snapshot = appointment.snapshot();
        appointment.record(DomainEvent::Scheduled { appointment: snapshot });

        Ok(appointment)
    }

    /// Rebuild an aggregate from its stored representation.
    pub fn from_record(record: AppointmentRecord) -> Result<Self, DomainError> {
        let slot = TimeSlot::new(record.start, record.end)?;
        let reschedule_slot = match (record.reschedule_start, record.reschedule_end) {
            (Some(start), Some(end)) => Some(TimeSlot::new(start, end)?),
            (None, None) => None,
            _ => {
                return Err(DomainError::Validation(
                    "reschedule interval must have both start and end".to_string(),
                ))
            }
        };

        Ok(Self {
            id: record.id,
            client_id: record.client_id,
            professional_id: record.professional_id,
            slot,
            reschedule_slot,
            status: record.status,
            payment_status: record.payment_status,
            modality: record.modality,
            agreed_price: record.agreed_price,
            google_meet_link: record.google_meet_link,
            evaluation_id: record.evaluation_id,
            started_at: record.started_at,
            started_instant: None,
            total_elapsed_ms: record.total_elapsed_ms,
            created_at: record.created_at,
            updated_at: record.updated_at,
            pending_events: Vec::new(),
        })
    }

    pub fn to_record(&self) -> AppointmentRecord {
        AppointmentRecord {
            id: self.id,
            client_id: self.client_id,
            professional_id: self.professional_id,
            start: self.slot.start(),
            end: self.slot.end(),
            reschedule_start: self.reschedule_slot.map(|s| s.start()),
            reschedule_end: self.reschedule_slot.map(|s| s.end()),
            status: self.status,
            payment_status: self.payment_status,
            modality: self.modality,
            agreed_price: self.agreed_price.clone(),
            google_meet_link: self.google_meet_link.clone(),
            evaluation_id: self.evaluation_id,
            started_at: self.started_at,
            total_elapsed_ms: self.total_elapsed_ms,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn professional_id(&self) -> Uuid {
        self.professional_id
    }

    pub fn slot(&self) -> TimeSlot {
        self.slot
    }

    pub fn reschedule_slot(&self) -> Option<TimeSlot> {
        self.reschedule_slot
    }

    pub fn status(&self) -> AppointmentStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn agreed_price(&self) -> &BigDecimal {
        &self.agreed_price
    }

    pub fn google_meet_link(&self) -> Option<&str> {
        self.google_meet_link.as_deref()
    }

    pub fn evaluation_id(&self) -> Option<Uuid> {
        self.evaluation_id
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn total_elapsed_ms(&self) -> Option<i64> {
        self.total_elapsed_ms
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The currently-binding interval: a pending or accepted reschedule
    /// takes precedence over the original booking, so both block new
    /// bookings uniformly.
    pub fn effective_slot(&self) -> TimeSlot {
        self.reschedule_slot.unwrap_or(self.slot)
    }

    /// Whether this appointment occupies its professional's calendar.
    pub fn blocks(&self) -> bool {
        matches!(
            self.status,
            AppointmentStatus::Scheduled
                | AppointmentStatus::Confirmed
                | AppointmentStatus::Rescheduled
                | AppointmentStatus::InProgress
        )
    }

    /// Scheduled/Rescheduled -> Confirmed. Confirming an approved
    /// reschedule folds the requested interval into the binding slot.
    pub fn confirm(&mut self) -> Result<(), DomainError> {
        match self.status {
            AppointmentStatus::Scheduled => {}
            AppointmentStatus::Rescheduled => {
                if let Some(requested) = self.reschedule_slot.take() {
                    self.slot = requested;
                }
            }
            other => {
                return Err(DomainError::BadRequest(format!(
                    "cannot confirm appointment in status {}",
                    other
                )))
            }
        }

        self.status = AppointmentStatus::Confirmed;
        self.touch();
        let snapshot = self.snapshot();
        self.record(DomainEvent::Confirmed { appointment: snapshot });
        Ok(())
    }

    /// Record a reschedule request without committing it. The caller is
    /// responsible for policy, working-window and overlap checks.
    pub fn request_reschedule(&mut self, requested: TimeSlot) -> Result<(), DomainError> {
        match self.status {
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed => {}
            other => {
                return Err(DomainError::BadRequest(format!(
                    "cannot reschedule appointment in status {}",
                    other
                )))
            }
        }

        let previous = self.slot;
        self.reschedule_slot = Some(requested);
        self.touch();
        let snapshot = self.snapshot();
        self.record(DomainEvent::Rescheduled {
            appointment: snapshot,
            previous,
            requested,
        });
        Ok(())
    }

    /// Commit a pending reschedule request: the appointment moves to
    /// `Rescheduled` and awaits re-confirmation.
    pub fn approve_reschedule(&mut self) -> Result<(), DomainError> {
        if self.reschedule_slot.is_none() {
            return Err(DomainError::BadRequest(
                "no pending reschedule request".to_string(),
            ));
        }

        match self.status {
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed => {
                self.status = AppointmentStatus::Rescheduled;
                self.touch();
                Ok(())
            }
            other => Err(DomainError::BadRequest(format!(
                "cannot approve reschedule in status {}",
                other
            ))),
        }
    }

    /// Drop a pending reschedule request, keeping the original interval.
    pub fn decline_reschedule(&mut self) -> Result<(), DomainError> {
        if self.status == AppointmentStatus::Rescheduled {
            return Err(DomainError::BadRequest(
                "reschedule request was already approved".to_string(),
            ));
        }

        if self.reschedule_slot.take().is_none() {
            return Err(DomainError::BadRequest(
                "no pending reschedule request".to_string(),
            ));
        }

        self.touch();
        Ok(())
    }

    /// Begin the session. Allowed from the effective start minus the
    /// grace window; optionally gated on settled payment.
    pub fn start(
        &mut self,
        now: DateTime<Utc>,
        grace_minutes: u32,
        require_settled_payment: bool,
    ) -> Result<(), DomainError> {
        match self.status {
            AppointmentStatus::Scheduled
            | AppointmentStatus::Confirmed
            | AppointmentStatus::Rescheduled => {}
            other => {
                return Err(DomainError::BadRequest(format!(
                    "cannot start appointment in status {}",
                    other
                )))
            }
        }

        if require_settled_payment && self.payment_status != PaymentStatus::Succeeded {
            return Err(DomainError::BadRequest(
                "payment has not been settled".to_string(),
            ));
        }

        let earliest = self.effective_slot().start() - Duration::minutes(i64::from(grace_minutes));
        if now < earliest {
            return Err(DomainError::BadRequest(
                "appointment start window has not opened yet".to_string(),
            ));
        }

        self.status = AppointmentStatus::InProgress;
        self.started_at = Some(now);
        self.started_instant = Some(Instant::now());
        self.touch();
        Ok(())
    }

    /// Finish a running session, recording the elapsed time from the
    /// monotonic clock when the session was started in this process.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != AppointmentStatus::InProgress {
            return Err(DomainError::BadRequest(format!(
                "cannot complete appointment in status {}",
                self.status
            )));
        }

        let elapsed_ms = match (self.started_instant, self.started_at) {
            (Some(instant), _) => instant.elapsed().as_millis() as i64,
            (None, Some(started_at)) => (now - started_at).num_milliseconds().max(0),
            (None, None) => 0,
        };

        self.status = AppointmentStatus::Completed;
        self.total_elapsed_ms = Some(elapsed_ms);
        self.touch();
        let snapshot = self.snapshot();
        self.record(DomainEvent::Finished { appointment: snapshot });
        Ok(())
    }

    /// Professional-driven completion; also covers sessions that were
    /// never started through the timer.
    pub fn mark_completed(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            AppointmentStatus::InProgress => self.complete(now),
            AppointmentStatus::Completed => Err(DomainError::BadRequest(
                "appointment is already completed".to_string(),
            )),
            AppointmentStatus::Scheduled => {
                self.status = AppointmentStatus::Completed;
                self.touch();
                let snapshot = self.snapshot();
                self.record(DomainEvent::Finished { appointment: snapshot });
                Ok(())
            }
            other => Err(DomainError::BadRequest(format!(
                "cannot mark appointment as completed in status {}",
                other
            ))),
        }
    }

    /// Cancel, returning the fee owed under the given policy. The
    /// transition succeeds even with short notice; the fee tells the
    /// caller what to charge.
    pub fn cancel(
        &mut self,
        now: DateTime<Utc>,
        policy: &CancellationPolicy,
    ) -> Result<BigDecimal, DomainError> {
        match self.status {
            AppointmentStatus::Cancelled => {
                return Err(DomainError::AlreadyCanceled(self.id.to_string()))
            }
            AppointmentStatus::Completed => {
                return Err(DomainError::BadRequest(
                    "cannot cancel a completed appointment".to_string(),
                ))
            }
            AppointmentStatus::Scheduled
            | AppointmentStatus::Confirmed
            | AppointmentStatus::Rescheduled => {}
            other => {
                return Err(DomainError::BadRequest(format!(
                    "cannot cancel appointment in status {}",
                    other
                )))
            }
        }

        let notice_hours = (self.effective_slot().start() - now).num_hours();
        let fee = policy.fee_for(notice_hours, &self.agreed_price);

        self.status = AppointmentStatus::Cancelled;
        self.touch();
        let snapshot = self.snapshot();
        self.record(DomainEvent::Canceled {
            appointment: snapshot,
            fee: fee.clone(),
        });
        Ok(fee)
    }

    /// Mark a client absence once the effective end time has passed.
    pub fn mark_no_show(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        match self.status {
            AppointmentStatus::Scheduled | AppointmentStatus::Confirmed => {}
            other => {
                return Err(DomainError::BadRequest(format!(
                    "cannot mark appointment as no-show in status {}",
                    other
                )))
            }
        }

        if now <= self.effective_slot().end() {
            return Err(DomainError::BadRequest(
                "appointment has not ended yet".to_string(),
            ));
        }

        self.status = AppointmentStatus::NoShow;
        self.touch();
        let snapshot = self.snapshot();
        self.record(DomainEvent::NoShow { appointment: snapshot });
        Ok(())
    }

    /// System-driven move into the evaluation window, triggered by the
    /// finished-appointment handler.
    pub fn to_awaiting_score(&mut self) -> Result<(), DomainError> {
        if self.status != AppointmentStatus::Completed {
            return Err(DomainError::BadRequest(format!(
                "cannot await score in status {}",
                self.status
            )));
        }

        self.status = AppointmentStatus::AwaitingScore;
        self.touch();
        Ok(())
    }

    /// Attach the recorded evaluation; the appointment is terminal
    /// afterwards.
    pub fn attach_evaluation(&mut self, evaluation_id: Uuid) -> Result<(), DomainError> {
        if self.status != AppointmentStatus::AwaitingScore {
            return Err(DomainError::BadRequest(format!(
                "cannot record evaluation in status {}",
                self.status
            )));
        }

        if self.evaluation_id.is_some() {
            return Err(DomainError::BadRequest(
                "evaluation already recorded".to_string(),
            ));
        }

        self.evaluation_id = Some(evaluation_id);
        self.touch();
        Ok(())
    }

    pub fn attach_meet_link(&mut self, link: String) {
        self.google_meet_link = Some(link);
        self.touch();
    }

    /// Payment lifecycle, independent from the appointment status.
    pub fn update_payment_status(&mut self, next: PaymentStatus) -> Result<(), DomainError> {
        let legal = matches!(
            (self.payment_status, next),
            (PaymentStatus::Pending, PaymentStatus::Processing)
                | (PaymentStatus::Processing, PaymentStatus::Succeeded)
                | (PaymentStatus::Processing, PaymentStatus::Failed)
                | (PaymentStatus::Failed, PaymentStatus::Processing)
                | (PaymentStatus::Succeeded, PaymentStatus::Refunded)
        );

        if !legal {
            return Err(DomainError::BadRequest(format!(
                "illegal payment transition {} -> {}",
                self.payment_status, next
            )));
        }

        self.payment_status = next;
        self.touch();
        Ok(())
    }

    /// Drain the queued events for dispatch. Called exactly once per
    /// successful repository write.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn snapshot(&self) -> AppointmentSnapshot {
        let effective = self.effective_slot();
        AppointmentSnapshot {
            id: self.id,
            client_id: self.client_id,
            professional_id: self.professional_id,
            start: effective.start(),
            end: effective.end(),
            status: self.status,
            payment_status: self.payment_status,
            modality: self.modality,
            agreed_price: self.agreed_price.clone(),
            google_meet_link: self.google_meet_link.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn record(&mut self, event: DomainEvent) {
        self.pending_events.push(event);
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
