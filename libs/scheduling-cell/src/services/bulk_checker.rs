// libs/scheduling-cell/src/services/bulk_checker.rs
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::SchedulingError;
use crate::models::{BulkAvailabilityQuery, BulkAvailabilityResult, BulkSlotResult, Interval, UnavailableReason};
use crate::services::deadline::Deadline;
use crate::services::interval::overlaps;
use crate::services::slot_checker::{evaluate, validate_slot, SlotChecker};
use crate::services::working_hours::is_within_working_hours;

/// Checks several proposed sessions on one date against the stored bookings
/// and against each other.
pub struct BulkSlotChecker {
    checker: Arc<SlotChecker>,
}

impl BulkSlotChecker {
    pub fn new(checker: Arc<SlotChecker>) -> Self {
        Self { checker }
    }

    pub async fn check_all(
        &self,
        query: &BulkAvailabilityQuery,
        deadline: &Deadline,
    ) -> Result<BulkAvailabilityResult, SchedulingError> {
        let config = self.checker.config();

        if query.slots.len() > config.max_bulk_slots {
            return Err(SchedulingError::invalid(
                "slots",
                format!("at most {} slots per request, got {}", config.max_bulk_slots, query.slots.len()),
            ));
        }
        for (index, slot) in query.slots.iter().enumerate() {
            validate_slot(slot, config, &format!("slots[{}]", index))?;
            if slot.date != query.date {
                return Err(SchedulingError::invalid(
                    format!("slots[{}].date", index),
                    "must match the query date",
                ));
            }
        }

        debug!("Performing bulk availability check for {} slots of therapist {} on {}",
               query.slots.len(), query.therapist_id, query.date);

        if query.slots.is_empty() {
            return Ok(BulkAvailabilityResult { results: Vec::new() });
        }

        let window = self.checker.window_for(query.therapist_id, query.date, deadline).await?;

        // One fetch for the whole batch, skipped when no slot can be booked anyway.
        let needs_bookings = query
            .slots
            .iter()
            .any(|slot| is_within_working_hours(window.as_ref(), slot.interval()));
        let bookings = if needs_bookings {
            self.checker
                .bookings_for(
                    query.therapist_id,
                    query.date,
                    |id| query.exclude_booking_ids.contains(&id),
                    deadline,
                )
                .await?
        } else {
            Vec::new()
        };

        let within_batch = batch_overlaps(&query.slots.iter().map(|s| s.interval()).collect::<Vec<_>>());

        let results: Vec<BulkSlotResult> = query
            .slots
            .iter()
            .zip(within_batch)
            .enumerate()
            .map(|(index, (slot, conflicts_within_batch))| {
                let stored = evaluate(slot.interval(), window.as_ref(), &bookings, config.buffer_minutes);
                let reason = stored.reason.or_else(|| {
                    (!conflicts_within_batch.is_empty()).then_some(UnavailableReason::BatchConflict)
                });

                BulkSlotResult {
                    index,
                    slot: *slot,
                    available: stored.available && conflicts_within_batch.is_empty(),
                    conflicts: stored.conflicts,
                    conflicts_within_batch,
                    reason,
                }
            })
            .collect();

        let unavailable = results.iter().filter(|r| !r.available).count();
        if unavailable > 0 {
            warn!("{} of {} proposed slots unavailable for therapist {}",
                  unavailable, results.len(), query.therapist_id);
        }

        Ok(BulkAvailabilityResult { results })
    }
}

/// For every interval, the ascending indices of the other intervals it overlaps.
pub fn batch_overlaps(intervals: &[Interval]) -> Vec<Vec<usize>> {
    let mut hits = vec![Vec::new(); intervals.len()];
    for i in 0..intervals.len() {
        for j in (i + 1)..intervals.len() {
            if overlaps(intervals[i], intervals[j]) {
                hits[i].push(j);
                hits[j].push(i);
            }
        }
    }
    hits
}
