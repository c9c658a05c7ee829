// libs/scheduling-cell/src/ports.rs
//
// What the engine needs from the outside world. Adapters in `crate::adapters`
// implement these against Supabase or in-process state; the engine only ever
// sees the traits.

use async_trait::async_trait;
use chrono::{NaiveDate, Weekday};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Booking, WorkingWindow};

#[derive(Debug, Error)]
pub enum PortError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Read-only access to a therapist's committed bookings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AvailabilityPort: Send + Sync {
    async fn get_bookings(&self, therapist_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>, PortError>;
}

/// Bookable hours per therapist and weekday. `None` means the therapist does
/// not work that day.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkingHoursPolicy: Send + Sync {
    async fn window_for(&self, therapist_id: Uuid, weekday: Weekday) -> Result<Option<WorkingWindow>, PortError>;
}
