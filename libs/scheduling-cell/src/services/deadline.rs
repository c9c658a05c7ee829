// libs/scheduling-cell/src/services/deadline.rs
use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::warn;

use crate::error::SchedulingError;
use crate::ports::PortError;

/// Caller-supplied budget shared by every collaborator call of one operation.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget_ms: u64,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget_ms: budget.as_millis() as u64,
        }
    }

    /// Runs one collaborator call; port failures become `NoAvailabilityData`
    /// and an elapsed deadline becomes `Timeout`.
    pub async fn run<F, T>(&self, operation: &'static str, call: F) -> Result<T, SchedulingError>
    where
        F: Future<Output = Result<T, PortError>>,
    {
        match timeout_at(self.at, call).await {
            Ok(result) => result.map_err(SchedulingError::from),
            Err(_) => {
                warn!("{} exceeded its {} ms deadline", operation, self.budget_ms);
                Err(SchedulingError::Timeout {
                    operation,
                    deadline_ms: self.budget_ms,
                })
            }
        }
    }
}
