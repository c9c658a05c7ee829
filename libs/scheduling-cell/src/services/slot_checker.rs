// libs/scheduling-cell/src/services/slot_checker.rs
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::SchedulingConfig;

use crate::error::SchedulingError;
use crate::models::{
    AvailabilityQuery, AvailabilityResult, Booking, Interval, TimeSlot, UnavailableReason, WorkingWindow,
};
use crate::ports::{AvailabilityPort, WorkingHoursPolicy};
use crate::services::deadline::Deadline;
use crate::services::interval::{contains, overlaps, padded};

/// Single-slot availability decision.
pub struct SlotChecker {
    bookings: Arc<dyn AvailabilityPort>,
    hours: Arc<dyn WorkingHoursPolicy>,
    config: SchedulingConfig,
}

impl SlotChecker {
    pub fn new(
        bookings: Arc<dyn AvailabilityPort>,
        hours: Arc<dyn WorkingHoursPolicy>,
        config: SchedulingConfig,
    ) -> Self {
        Self { bookings, hours, config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub async fn check(
        &self,
        query: &AvailabilityQuery,
        deadline: &Deadline,
    ) -> Result<AvailabilityResult, SchedulingError> {
        validate_slot(&query.slot, &self.config, "slot")?;
        if query.slot.date != query.date {
            return Err(SchedulingError::invalid("slot.date", "must match the query date"));
        }

        debug!("Checking availability for therapist {} on {} from {} to {}",
               query.therapist_id, query.date, query.slot.start, query.slot.end);

        let window = self.window_for(query.therapist_id, query.date, deadline).await?;
        let slot = query.slot.interval();

        if let Some(reason) = working_hours_rejection(window.as_ref(), slot) {
            debug!("Slot rejected for therapist {}: {:?}", query.therapist_id, reason);
            return Ok(AvailabilityResult::rejected(reason));
        }

        let bookings = self
            .bookings_for(query.therapist_id, query.date, |id| Some(id) == query.exclude_booking_id, deadline)
            .await?;

        let result = evaluate(slot, window.as_ref(), &bookings, self.config.buffer_minutes);
        if !result.available {
            warn!("Conflict detected for therapist {} - {} conflicting bookings",
                  query.therapist_id, result.conflicts.len());
        }

        Ok(result)
    }

    pub(crate) async fn window_for(
        &self,
        therapist_id: Uuid,
        date: NaiveDate,
        deadline: &Deadline,
    ) -> Result<Option<WorkingWindow>, SchedulingError> {
        deadline
            .run("working hours lookup", self.hours.window_for(therapist_id, date.weekday()))
            .await
    }

    /// Fetches the day's bookings once, dropping the ones the caller asked to
    /// ignore (typically the session that is being rescheduled).
    pub(crate) async fn bookings_for<F>(
        &self,
        therapist_id: Uuid,
        date: NaiveDate,
        is_excluded: F,
        deadline: &Deadline,
    ) -> Result<Vec<Booking>, SchedulingError>
    where
        F: Fn(Uuid) -> bool,
    {
        let bookings = deadline
            .run("booking fetch", self.bookings.get_bookings(therapist_id, date))
            .await?;

        Ok(bookings.into_iter().filter(|b| !is_excluded(b.id)).collect())
    }
}

/// Rejects malformed slots: `start < end` and duration inside the configured bounds.
pub fn validate_slot(slot: &TimeSlot, config: &SchedulingConfig, field: &str) -> Result<(), SchedulingError> {
    if slot.start >= slot.end {
        return Err(SchedulingError::invalid(field, "start must be before end"));
    }
    validate_duration(slot.duration_minutes(), config, field)
}

pub fn validate_duration(minutes: i64, config: &SchedulingConfig, field: &str) -> Result<(), SchedulingError> {
    let min = i64::from(config.min_duration_minutes);
    let max = i64::from(config.max_duration_minutes);
    if minutes < min || minutes > max {
        return Err(SchedulingError::invalid(
            field,
            format!("duration of {} minutes is outside {}-{}", minutes, min, max),
        ));
    }
    Ok(())
}

fn working_hours_rejection(window: Option<&WorkingWindow>, slot: Interval) -> Option<UnavailableReason> {
    match window {
        None => Some(UnavailableReason::NotWorkingDay),
        Some(w) if !contains(w.interval(), slot) => Some(UnavailableReason::OutsideWorkingHours),
        Some(_) => None,
    }
}

/// Pure decision over an already loaded snapshot. Every overlapping booking
/// is reported, not only the first.
pub fn evaluate(
    slot: Interval,
    window: Option<&WorkingWindow>,
    bookings: &[Booking],
    buffer_minutes: u32,
) -> AvailabilityResult {
    if let Some(reason) = working_hours_rejection(window, slot) {
        return AvailabilityResult::rejected(reason);
    }

    let conflicts = bookings
        .iter()
        .filter(|b| overlaps(slot, padded(b.interval(), buffer_minutes)))
        .cloned()
        .collect();

    AvailabilityResult::conflicting(conflicts)
}
