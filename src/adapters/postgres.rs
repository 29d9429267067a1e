//! Postgres implementation of `AppointmentRepository`.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE appointments (
//!     id UUID PRIMARY KEY,
//!     client_id UUID NOT NULL,
//!     professional_id UUID NOT NULL,
//!     start_time TIMESTAMPTZ NOT NULL,
//!     end_time TIMESTAMPTZ NOT NULL,
//!     reschedule_start TIMESTAMPTZ,
//!     reschedule_end TIMESTAMPTZ,
//!     status TEXT NOT NULL,
//!     payment_status TEXT NOT NULL,
//!     modality TEXT NOT NULL,
//!     agreed_price NUMERIC NOT NULL,
//!     google_meet_link TEXT,
//!     evaluation_id UUID,
//!     started_at TIMESTAMPTZ,
//!     total_elapsed_ms BIGINT,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE INDEX idx_appointments_professional
//!     ON appointments (professional_id, start_time);
//! ```

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::domain::appointment::{
    Appointment, AppointmentRecord, AppointmentStatus, Modality, PaymentStatus,
};
use crate::events::EventBus;
use crate::ports::{AppointmentRepository, RepositoryError, RepositoryResult};

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

const BLOCKING_STATUSES: &[&str] = &["scheduled", "confirmed", "rescheduled", "in_progress"];

/// Postgres-backed appointment repository.
#[derive(Clone)]
pub struct PostgresAppointmentRepository {
    pool: PgPool,
    bus: Arc<EventBus>,
}

impl PostgresAppointmentRepository {
    pub fn new(pool: PgPool, bus: Arc<EventBus>) -> Self {
        Self { pool, bus }
    }
}

#[async_trait]
impl AppointmentRepository for PostgresAppointmentRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Appointment> {
        let row = sqlx::query_as::<_, AppointmentRow>("SELECT * FROM appointments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        row.map(AppointmentRow::into_domain)
            .ok_or_else(|| RepositoryError::NotFound(format!("appointment {}", id)))?
    }

    async fn find_overlapping(
        &self,
        professional_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        excluding: Option<Uuid>,
    ) -> RepositoryResult<Vec<Appointment>> {
        let blocking: Vec<String> = BLOCKING_STATUSES.iter().map(|s| s.to_string()).collect();

        let rows = sqlx::query_as::<_, AppointmentRow>(
            r#"
            SELECT * FROM appointments
            WHERE professional_id = $1
              AND status = ANY($2)
              AND COALESCE(reschedule_start, start_time) < $4
              AND COALESCE(reschedule_end, end_time) > $3
              AND ($5::uuid IS NULL OR id <> $5)
            ORDER BY start_time
            "#,
        )
        .bind(professional_id)
        .bind(blocking)
        .bind(start)
        .bind(end)
        .bind(excluding)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(AppointmentRow::into_domain).collect()
    }

    async fn find_many_by_professional_id(
        &self,
        professional_id: Uuid,
    ) -> RepositoryResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            "SELECT * FROM appointments WHERE professional_id = $1 ORDER BY start_time DESC",
        )
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(AppointmentRow::into_domain).collect()
    }

    async fn find_many_by_status(
        &self,
        status: AppointmentStatus,
    ) -> RepositoryResult<Vec<Appointment>> {
        let rows = sqlx::query_as::<_, AppointmentRow>(
            "SELECT * FROM appointments WHERE status = $1 ORDER BY start_time",
        )
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        rows.into_iter().map(AppointmentRow::into_domain).collect()
    }

    async fn create(&self, appointment: &mut Appointment) -> RepositoryResult<()> {
        let record = appointment.to_record();

        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, client_id, professional_id, start_time, end_time,
                reschedule_start, reschedule_end, status, payment_status, modality,
                agreed_price, google_meet_link, evaluation_id, started_at,
                total_elapsed_ms, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(record.id)
        .bind(record.client_id)
        .bind(record.professional_id)
        .bind(record.start)
        .bind(record.end)
        .bind(record.reschedule_start)
        .bind(record.reschedule_end)
        .bind(record.status.to_string())
        .bind(record.payment_status.to_string())
        .bind(record.modality.to_string())
        .bind(&record.agreed_price)
        .bind(&record.google_meet_link)
        .bind(record.evaluation_id)
        .bind(record.started_at)
        .bind(record.total_elapsed_ms)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        self.bus.clone().dispatch_background(appointment.take_events());
        Ok(())
    }

    async fn save(&self, appointment: &mut Appointment) -> RepositoryResult<()> {
        let record = appointment.to_record();

        let result = sqlx::query(
            r#"
            UPDATE appointments SET
                start_time = $2, end_time = $3,
                reschedule_start = $4, reschedule_end = $5,
                status = $6, payment_status = $7,
                agreed_price = $8, google_meet_link = $9, evaluation_id = $10,
                started_at = $11, total_elapsed_ms = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(record.start)
        .bind(record.end)
        .bind(record.reschedule_start)
        .bind(record.reschedule_end)
        .bind(record.status.to_string())
        .bind(record.payment_status.to_string())
        .bind(&record.agreed_price)
        .bind(&record.google_meet_link)
        .bind(record.evaluation_id)
        .bind(record.started_at)
        .bind(record.total_elapsed_ms)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            // events stay queued on the aggregate for a safe retry
            return Err(RepositoryError::NotFound(format!(
                "appointment {}",
                record.id
            )));
        }

        self.bus.clone().dispatch_background(appointment.take_events());
        Ok(())
    }
}

/// Internal row type for sqlx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: Uuid,
    client_id: Uuid,
    professional_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    reschedule_start: Option<DateTime<Utc>>,
    reschedule_end: Option<DateTime<Utc>>,
    status: String,
    payment_status: String,
    modality: String,
    agreed_price: BigDecimal,
    google_meet_link: Option<String>,
    evaluation_id: Option<Uuid>,
    started_at: Option<DateTime<Utc>>,
    total_elapsed_ms: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AppointmentRow {
    fn into_domain(self) -> RepositoryResult<Appointment> {
        let record = AppointmentRecord {
            id: self.id,
            client_id: self.client_id,
            professional_id: self.professional_id,
            start: self.start_time,
            end: self.end_time,
            reschedule_start: self.reschedule_start,
            reschedule_end: self.reschedule_end,
            status: AppointmentStatus::from_str(&self.status)
                .map_err(RepositoryError::Storage)?,
            payment_status: PaymentStatus::from_str(&self.payment_status)
                .map_err(RepositoryError::Storage)?,
            modality: Modality::from_str(&self.modality).map_err(RepositoryError::Storage)?,
            agreed_price: self.agreed_price,
            google_meet_link: self.google_meet_link,
            evaluation_id: self.evaluation_id,
            started_at: self.started_at,
            total_elapsed_ms: self.total_elapsed_ms,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };

        Appointment::from_record(record)
            .map_err(|err| RepositoryError::Storage(err.to_string()))
    }
}
