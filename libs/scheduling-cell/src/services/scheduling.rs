// libs/scheduling-cell/src/services/scheduling.rs
//
// Entry point for the three scheduling operations. Every answer is computed
// from a read-only snapshot of the therapist's calendar, so a "free" result is
// not a reservation: two callers can both be told the same slot is free. The
// code that creates bookings has to re-check atomically at write time.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use tracing::{instrument, warn};
use uuid::Uuid;

use shared_config::{AppConfig, SchedulingConfig};

use crate::adapters::SupabaseSchedulingStore;
use crate::error::SchedulingError;
use crate::models::{
    AvailabilityQuery, AvailabilityResult, BulkAvailabilityQuery, BulkAvailabilityResult, Resolution,
    ResolutionPreferences, ResolutionRequest, TimeSlot,
};
use crate::ports::{AvailabilityPort, WorkingHoursPolicy};
use crate::services::bulk_checker::BulkSlotChecker;
use crate::services::deadline::Deadline;
use crate::services::resolver::ConflictResolver;
use crate::services::slot_checker::{validate_duration, SlotChecker};
use crate::services::working_hours::StandardWorkingHours;

pub struct SchedulingService {
    checker: Arc<SlotChecker>,
    bulk_checker: BulkSlotChecker,
    resolver: ConflictResolver,
}

impl SchedulingService {
    pub fn new(
        bookings: Arc<dyn AvailabilityPort>,
        hours: Arc<dyn WorkingHoursPolicy>,
        config: SchedulingConfig,
    ) -> Self {
        let checker = Arc::new(SlotChecker::new(bookings, hours, config));

        Self {
            bulk_checker: BulkSlotChecker::new(Arc::clone(&checker)),
            resolver: ConflictResolver::new(Arc::clone(&checker)),
            checker,
        }
    }

    /// Wires the Supabase-backed store. A `SCHEDULING_WORKING_HOURS` template,
    /// when present and valid, replaces per-therapist working hours.
    pub fn from_config(config: &AppConfig) -> Self {
        let store = Arc::new(SupabaseSchedulingStore::new(config));

        let hours: Arc<dyn WorkingHoursPolicy> = match config.scheduling.working_hours.as_deref() {
            Some(template) => match StandardWorkingHours::parse(template) {
                Ok(standard) => Arc::new(standard),
                Err(e) => {
                    warn!("Ignoring SCHEDULING_WORKING_HOURS: {}", e);
                    store.clone()
                }
            },
            None => store.clone(),
        };

        Self::new(store, hours, config.scheduling.clone())
    }

    pub fn config(&self) -> &SchedulingConfig {
        self.checker.config()
    }

    fn default_deadline(&self) -> Deadline {
        Deadline::after(Duration::from_millis(self.config().deadline_ms))
    }

    /// checkAvailability: `duration` must agree with `end - start`.
    #[instrument(skip(self), fields(therapist_id = %therapist_id, date = %date))]
    pub async fn check_availability(
        &self,
        therapist_id: Uuid,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        duration_minutes: u32,
        exclude_booking_id: Option<Uuid>,
    ) -> Result<AvailabilityResult, SchedulingError> {
        let slot = TimeSlot::new(date, start, end);
        validate_duration(i64::from(duration_minutes), self.config(), "duration")?;
        if start < end && slot.duration_minutes() != i64::from(duration_minutes) {
            return Err(SchedulingError::invalid(
                "duration",
                format!("{} minutes does not match {}-{}", duration_minutes, start.format("%H:%M"), end.format("%H:%M")),
            ));
        }

        let query = AvailabilityQuery {
            therapist_id,
            date,
            slot,
            exclude_booking_id,
        };
        self.check_availability_with_deadline(&query, self.default_deadline()).await
    }

    pub async fn check_availability_with_deadline(
        &self,
        query: &AvailabilityQuery,
        deadline: Deadline,
    ) -> Result<AvailabilityResult, SchedulingError> {
        self.checker.check(query, &deadline).await
    }

    /// checkBulkAvailability.
    #[instrument(skip(self, slots, exclude_booking_ids), fields(therapist_id = %therapist_id, date = %date, slots = slots.len()))]
    pub async fn check_bulk_availability(
        &self,
        therapist_id: Uuid,
        date: NaiveDate,
        slots: Vec<TimeSlot>,
        exclude_booking_ids: HashSet<Uuid>,
    ) -> Result<BulkAvailabilityResult, SchedulingError> {
        let query = BulkAvailabilityQuery {
            therapist_id,
            date,
            slots,
            exclude_booking_ids,
        };
        self.check_bulk_availability_with_deadline(&query, self.default_deadline()).await
    }

    pub async fn check_bulk_availability_with_deadline(
        &self,
        query: &BulkAvailabilityQuery,
        deadline: Deadline,
    ) -> Result<BulkAvailabilityResult, SchedulingError> {
        self.bulk_checker.check_all(query, &deadline).await
    }

    /// resolveConflicts. Missing preferences fall back to
    /// `ResolutionPreferences::default()`.
    #[instrument(skip(self, preferences), fields(therapist_id = %therapist_id, date = %date))]
    pub async fn resolve_conflicts(
        &self,
        therapist_id: Uuid,
        date: NaiveDate,
        duration_minutes: u32,
        original_start: Option<NaiveTime>,
        preferences: Option<ResolutionPreferences>,
    ) -> Result<Resolution, SchedulingError> {
        let request = ResolutionRequest {
            therapist_id,
            date,
            duration_minutes,
            original_start,
            preferences: preferences.unwrap_or_default(),
            exclude_booking_id: None,
            limit: None,
        };
        self.resolve_with_deadline(&request, self.default_deadline()).await
    }

    pub async fn resolve(&self, request: &ResolutionRequest) -> Result<Resolution, SchedulingError> {
        self.resolve_with_deadline(request, self.default_deadline()).await
    }

    pub async fn resolve_with_deadline(
        &self,
        request: &ResolutionRequest,
        deadline: Deadline,
    ) -> Result<Resolution, SchedulingError> {
        self.resolver.resolve(request, &deadline).await
    }
}
