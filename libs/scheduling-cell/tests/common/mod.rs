// libs/scheduling-cell/tests/common/mod.rs
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use uuid::Uuid;

use scheduling_cell::adapters::InMemoryCalendar;
use scheduling_cell::{AvailabilityPort, Booking, PortError, SchedulingService, WorkingHoursPolicy, WorkingWindow};
use shared_config::SchedulingConfig;

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// 2025-06-16 is a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
}

pub fn therapist() -> Uuid {
    Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap()
}

pub fn booking_on(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Booking {
    Booking {
        id: Uuid::new_v4(),
        therapist_id: therapist(),
        date,
        start,
        end,
    }
}

pub struct TestSetup {
    pub calendar: Arc<InMemoryCalendar>,
}

impl TestSetup {
    /// Therapist works Monday to Friday, 09:00-17:00.
    pub async fn new() -> Self {
        let calendar = Arc::new(InMemoryCalendar::new());
        for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri] {
            calendar.set_working_window(therapist(), day, t(9, 0), t(17, 0)).await;
        }
        Self { calendar }
    }

    pub async fn book(&self, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Booking {
        let booking = booking_on(date, start, end);
        self.calendar.add_booking(booking.clone()).await;
        booking
    }

    pub fn service(&self) -> SchedulingService {
        self.service_with(SchedulingConfig::default())
    }

    pub fn service_with(&self, config: SchedulingConfig) -> SchedulingService {
        SchedulingService::new(self.calendar.clone(), self.calendar.clone(), config)
    }
}

/// Wraps a calendar, counts collaborator calls and can stall booking fetches
/// for chosen dates.
pub struct InstrumentedCalendar {
    pub inner: Arc<InMemoryCalendar>,
    pub booking_fetches: AtomicUsize,
    pub window_lookups: AtomicUsize,
    pub slow_dates: Vec<NaiveDate>,
    pub delay: Duration,
}

impl InstrumentedCalendar {
    pub fn new(inner: Arc<InMemoryCalendar>) -> Self {
        Self {
            inner,
            booking_fetches: AtomicUsize::new(0),
            window_lookups: AtomicUsize::new(0),
            slow_dates: Vec::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn stalling_on(mut self, dates: Vec<NaiveDate>, delay: Duration) -> Self {
        self.slow_dates = dates;
        self.delay = delay;
        self
    }

    pub fn fetches(&self) -> usize {
        self.booking_fetches.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.window_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityPort for InstrumentedCalendar {
    async fn get_bookings(&self, therapist_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>, PortError> {
        self.booking_fetches.fetch_add(1, Ordering::SeqCst);
        if self.slow_dates.contains(&date) {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.get_bookings(therapist_id, date).await
    }
}

#[async_trait]
impl WorkingHoursPolicy for InstrumentedCalendar {
    async fn window_for(&self, therapist_id: Uuid, weekday: Weekday) -> Result<Option<WorkingWindow>, PortError> {
        self.window_lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.window_for(therapist_id, weekday).await
    }
}

/// A store that is always down.
pub struct UnreachableStore;

#[async_trait]
impl AvailabilityPort for UnreachableStore {
    async fn get_bookings(&self, _therapist_id: Uuid, _date: NaiveDate) -> Result<Vec<Booking>, PortError> {
        Err(PortError::Backend("connection refused".to_string()))
    }
}
