//! Record the client's score for a finished appointment.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::evaluation::Evaluation;
use crate::error::DomainError;
use crate::ports::{AppointmentRepository, EvaluationRepository};

#[derive(Debug)]
pub struct RecordEvaluationInput {
    pub appointment_id: Uuid,
    pub client_id: Uuid,
    pub score: u8,
    pub comment: Option<String>,
}

pub struct RecordEvaluation {
    appointments: Arc<dyn AppointmentRepository>,
    evaluations: Arc<dyn EvaluationRepository>,
}

impl RecordEvaluation {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        evaluations: Arc<dyn EvaluationRepository>,
    ) -> Self {
        Self {
            appointments,
            evaluations,
        }
    }

    pub async fn execute(&self, input: RecordEvaluationInput) -> Result<Evaluation, DomainError> {
        let mut appointment = self.appointments.find_by_id(input.appointment_id).await?;

        if input.client_id != appointment.client_id() {
            return Err(DomainError::NotAllowed(
                "only the client may evaluate the appointment".to_string(),
            ));
        }

        if self
            .evaluations
            .find_by_appointment_id(appointment.id())
            .await?
            .is_some()
        {
            return Err(DomainError::BadRequest(
                "appointment was already evaluated".to_string(),
            ));
        }

        let evaluation = Evaluation::new(appointment.id(), input.score, input.comment)?;

        // validates the AwaitingScore status before anything is stored
        appointment.attach_evaluation(evaluation.id)?;

        self.evaluations.create(&evaluation).await?;
        self.appointments.save(&mut appointment).await?;

        tracing::info!(
            appointment_id = %appointment.id(),
            score = evaluation.score,
            "evaluation recorded"
        );

        Ok(evaluation)
    }
}
