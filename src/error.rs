use chrono::NaiveDate;
use thiserror::Error;

use crate::model::{ProjectId, ResourceId};

/// Problems with user input. The creation flow reports these and keeps the
/// dialog open; nothing reaches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("select at least one weekday")]
    NoWeekdays,

    #[error("select a start and end date")]
    InvalidDateRange,

    #[error("end time must be after start time")]
    InvalidTimeRange,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unknown resource: {0}")]
    UnknownResource(ResourceId),

    #[error("unknown project: {0}")]
    UnknownProject(ProjectId),

    #[error("{resource} is already booked on {date} ({existing} planning item(s) overlap)")]
    Conflict {
        resource: ResourceId,
        date: NaiveDate,
        existing: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store rejected the request: {0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no creation dialog is open")]
    NoDialog,
}

impl PlannerError {
    /// Validation problems are recoverable in place: re-prompt the user.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::NoWeekdays.to_string(),
            "select at least one weekday"
        );
        assert_eq!(
            ValidationError::InvalidDateRange.to_string(),
            "select a start and end date"
        );
    }

    #[test]
    fn test_is_validation() {
        let err: PlannerError = ValidationError::MissingField("resource").into();
        assert!(err.is_validation());

        let err: PlannerError = StoreError::Unavailable("offline".into()).into();
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "store unavailable: offline");
    }
}
