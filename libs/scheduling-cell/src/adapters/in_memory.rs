// libs/scheduling-cell/src/adapters/in_memory.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Booking, WorkingWindow};
use crate::ports::{AvailabilityPort, PortError, WorkingHoursPolicy};

/// In-process calendar implementing both ports. Used by tests and local runs
/// without a database.
#[derive(Default)]
pub struct InMemoryCalendar {
    bookings: RwLock<Vec<Booking>>,
    hours: RwLock<HashMap<(Uuid, Weekday), WorkingWindow>>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_booking(&self, booking: Booking) {
        self.bookings.write().await.push(booking);
    }

    pub async fn remove_booking(&self, booking_id: Uuid) -> bool {
        let mut bookings = self.bookings.write().await;
        let before = bookings.len();
        bookings.retain(|b| b.id != booking_id);
        bookings.len() != before
    }

    pub async fn set_working_window(&self, therapist_id: Uuid, weekday: Weekday, start: NaiveTime, end: NaiveTime) {
        self.hours
            .write()
            .await
            .insert((therapist_id, weekday), WorkingWindow::new(weekday, start, end));
    }

    pub async fn clear_working_window(&self, therapist_id: Uuid, weekday: Weekday) {
        self.hours.write().await.remove(&(therapist_id, weekday));
    }
}

#[async_trait]
impl AvailabilityPort for InMemoryCalendar {
    async fn get_bookings(&self, therapist_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>, PortError> {
        let mut found: Vec<Booking> = self
            .bookings
            .read()
            .await
            .iter()
            .filter(|b| b.therapist_id == therapist_id && b.date == date)
            .cloned()
            .collect();
        found.sort_by_key(|b| b.start);
        Ok(found)
    }
}

#[async_trait]
impl WorkingHoursPolicy for InMemoryCalendar {
    async fn window_for(&self, therapist_id: Uuid, weekday: Weekday) -> Result<Option<WorkingWindow>, PortError> {
        Ok(self.hours.read().await.get(&(therapist_id, weekday)).copied())
    }
}
