// libs/scheduling-cell/src/error.rs
use thiserror::Error;

use crate::ports::PortError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Availability data could not be loaded: {0}")]
    NoAvailabilityData(String),

    #[error("Deadline of {deadline_ms} ms elapsed before {operation} completed")]
    Timeout { operation: &'static str, deadline_ms: u64 },
}

impl SchedulingError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SchedulingError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<PortError> for SchedulingError {
    fn from(err: PortError) -> Self {
        SchedulingError::NoAvailabilityData(err.to_string())
    }
}
