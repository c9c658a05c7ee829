// libs/scheduling-cell/tests/slot_checker_test.rs
mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Weekday;

use common::{monday, t, therapist, InstrumentedCalendar, TestSetup, UnreachableStore};
use scheduling_cell::services::Deadline;
use scheduling_cell::{AvailabilityQuery, SchedulingError, SchedulingService, TimeSlot, UnavailableReason};
use shared_config::SchedulingConfig;

#[tokio::test]
async fn test_partial_overlap_reports_the_booking() {
    let setup = TestSetup::new().await;
    let existing = setup.book(monday(), t(10, 0), t(11, 0)).await;

    let result = setup.service()
        .check_availability(therapist(), monday(), t(10, 30), t(11, 15), 45, None)
        .await
        .unwrap();

    assert!(!result.available);
    assert_eq!(result.conflicts, vec![existing]);
    assert_eq!(result.reason, Some(UnavailableReason::BookingConflict));
}

#[tokio::test]
async fn test_back_to_back_slot_is_available() {
    let setup = TestSetup::new().await;
    setup.book(monday(), t(10, 0), t(11, 0)).await;

    let result = setup.service()
        .check_availability(therapist(), monday(), t(11, 0), t(12, 0), 60, None)
        .await
        .unwrap();

    assert!(result.available);
    assert!(result.conflicts.is_empty());
    assert_eq!(result.reason, None);
}

#[tokio::test]
async fn test_exact_match_conflicts() {
    let setup = TestSetup::new().await;
    let existing = setup.book(monday(), t(14, 0), t(15, 0)).await;

    let result = setup.service()
        .check_availability(therapist(), monday(), t(14, 0), t(15, 0), 60, None)
        .await
        .unwrap();

    assert!(!result.available);
    assert!(result.conflicts.contains(&existing));
}

#[tokio::test]
async fn test_all_conflicts_are_listed() {
    let setup = TestSetup::new().await;
    let first = setup.book(monday(), t(9, 0), t(10, 0)).await;
    let second = setup.book(monday(), t(10, 30), t(11, 0)).await;
    setup.book(monday(), t(12, 0), t(13, 0)).await;

    let result = setup.service()
        .check_availability(therapist(), monday(), t(9, 30), t(11, 30), 120, None)
        .await
        .unwrap();

    assert_eq!(result.conflicts, vec![first, second]);
}

#[tokio::test]
async fn test_excluding_the_only_conflict_frees_the_slot() {
    let setup = TestSetup::new().await;
    let moving = setup.book(monday(), t(10, 0), t(11, 0)).await;

    let result = setup.service()
        .check_availability(therapist(), monday(), t(10, 15), t(11, 15), 60, Some(moving.id))
        .await
        .unwrap();

    assert!(result.available);
}

#[tokio::test]
async fn test_exclusion_removes_exactly_one_booking() {
    let setup = TestSetup::new().await;
    let moving = setup.book(monday(), t(10, 0), t(11, 0)).await;
    let other = setup.book(monday(), t(11, 0), t(12, 0)).await;

    let result = setup.service()
        .check_availability(therapist(), monday(), t(10, 30), t(11, 30), 60, Some(moving.id))
        .await
        .unwrap();

    assert!(!result.available);
    assert_eq!(result.conflicts, vec![other]);
}

#[tokio::test]
async fn test_outside_working_hours_is_unavailable_without_conflicts() {
    let setup = TestSetup::new().await;
    setup.book(monday(), t(16, 0), t(17, 0)).await;

    let result = setup.service()
        .check_availability(therapist(), monday(), t(16, 30), t(17, 30), 60, None)
        .await
        .unwrap();

    assert!(!result.available);
    assert!(result.conflicts.is_empty());
    assert_eq!(result.reason, Some(UnavailableReason::OutsideWorkingHours));
}

#[tokio::test]
async fn test_non_working_day_is_unavailable() {
    let setup = TestSetup::new().await;
    setup.calendar.clear_working_window(therapist(), Weekday::Mon).await;

    let result = setup.service()
        .check_availability(therapist(), monday(), t(10, 0), t(11, 0), 60, None)
        .await
        .unwrap();

    assert!(!result.available);
    assert_eq!(result.reason, Some(UnavailableReason::NotWorkingDay));
}

#[tokio::test]
async fn test_repeated_checks_are_identical() {
    let setup = TestSetup::new().await;
    setup.book(monday(), t(10, 0), t(11, 0)).await;
    let service = setup.service();

    let first = service.check_availability(therapist(), monday(), t(10, 30), t(11, 30), 60, None).await.unwrap();
    let second = service.check_availability(therapist(), monday(), t(10, 30), t(11, 30), 60, None).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_check_reads_fresh_snapshot_each_call() {
    let setup = TestSetup::new().await;
    let service = setup.service();

    let before = service.check_availability(therapist(), monday(), t(10, 0), t(11, 0), 60, None).await.unwrap();
    let booking = setup.book(monday(), t(10, 0), t(11, 0)).await;
    let after = service.check_availability(therapist(), monday(), t(10, 0), t(11, 0), 60, None).await.unwrap();
    setup.calendar.remove_booking(booking.id).await;
    let released = service.check_availability(therapist(), monday(), t(10, 0), t(11, 0), 60, None).await.unwrap();

    assert!(before.available);
    assert!(!after.available);
    assert!(released.available);
}

#[tokio::test]
async fn test_invalid_intervals_fail_fast() {
    let setup = TestSetup::new().await;
    let service = setup.service();

    let inverted = service.check_availability(therapist(), monday(), t(11, 0), t(10, 0), 60, None).await;
    assert_matches!(inverted, Err(SchedulingError::InvalidInput { .. }));

    let too_short = service.check_availability(therapist(), monday(), t(10, 0), t(10, 10), 10, None).await;
    assert_matches!(too_short, Err(SchedulingError::InvalidInput { field, .. }) if field == "duration");

    let mismatch = service.check_availability(therapist(), monday(), t(10, 0), t(11, 0), 30, None).await;
    assert_matches!(mismatch, Err(SchedulingError::InvalidInput { field, .. }) if field == "duration");
}

#[tokio::test]
async fn test_storage_failure_is_distinct_from_unavailable() {
    let setup = TestSetup::new().await;
    let service = SchedulingService::new(Arc::new(UnreachableStore), setup.calendar.clone(), SchedulingConfig::default());

    let result = service.check_availability(therapist(), monday(), t(10, 0), t(11, 0), 60, None).await;

    assert_matches!(result, Err(SchedulingError::NoAvailabilityData(_)));
}

#[tokio::test]
async fn test_slow_store_times_out() {
    let setup = TestSetup::new().await;
    let slow = Arc::new(
        InstrumentedCalendar::new(setup.calendar.clone())
            .stalling_on(vec![monday()], Duration::from_secs(2)),
    );
    let service = SchedulingService::new(slow.clone(), slow, SchedulingConfig::default());

    let query = AvailabilityQuery {
        therapist_id: therapist(),
        date: monday(),
        slot: TimeSlot::new(monday(), t(10, 0), t(11, 0)),
        exclude_booking_id: None,
    };
    let result = service
        .check_availability_with_deadline(&query, Deadline::after(Duration::from_millis(100)))
        .await;

    assert_matches!(result, Err(SchedulingError::Timeout { .. }));
}

#[tokio::test]
async fn test_buffer_minutes_blocks_back_to_back() {
    let setup = TestSetup::new().await;
    setup.book(monday(), t(10, 0), t(11, 0)).await;

    let config = SchedulingConfig { buffer_minutes: 15, ..SchedulingConfig::default() };
    let result = setup.service_with(config)
        .check_availability(therapist(), monday(), t(11, 0), t(12, 0), 60, None)
        .await
        .unwrap();

    assert!(!result.available);
}
