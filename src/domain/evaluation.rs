use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DomainError;
use crate::validation;

/// Client score recorded after a finished appointment.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub score: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Evaluation {
    pub fn new(
        appointment_id: Uuid,
        score: u8,
        comment: Option<String>,
    ) -> Result<Self, DomainError> {
        validation::validate_score(score)?;

        Ok(Self {
            id: Uuid::new_v4(),
            appointment_id,
            score,
            comment,
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_out_of_range_score() {
        assert!(Evaluation::new(Uuid::new_v4(), 0, None).is_err());
        assert!(Evaluation::new(Uuid::new_v4(), 6, None).is_err());
        assert!(Evaluation::new(Uuid::new_v4(), 4, Some("great session".into())).is_ok());
    }
}
