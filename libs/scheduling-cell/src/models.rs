// libs/scheduling-cell/src/models.rs
use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// INTERVALS AND CALENDAR ENTRIES
// ==============================================================================

/// Half-open wall-clock interval `[start, end)` on a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl Interval {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        Self { date, start, end }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.interval().duration_minutes()
    }

    pub fn weekday(&self) -> Weekday {
        self.date.weekday()
    }
}

/// An already committed session on a therapist's calendar. Owned by the
/// persistence layer; the engine only ever reads snapshots of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub therapist_id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl Booking {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

/// Bookable hours of a therapist for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingWindow {
    pub weekday: Weekday,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl WorkingWindow {
    pub fn new(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self { weekday, start, end }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

// ==============================================================================
// AVAILABILITY CHECKS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    pub therapist_id: Uuid,
    pub date: NaiveDate,
    pub slot: TimeSlot,
    pub exclude_booking_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// The therapist has no working window on this weekday.
    NotWorkingDay,
    /// The slot is not contained in the working window.
    OutsideWorkingHours,
    /// The slot overlaps at least one stored booking.
    BookingConflict,
    /// The slot overlaps another slot of the same bulk request.
    BatchConflict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub available: bool,
    pub conflicts: Vec<Booking>,
    pub reason: Option<UnavailableReason>,
}

impl AvailabilityResult {
    pub fn free() -> Self {
        Self {
            available: true,
            conflicts: Vec::new(),
            reason: None,
        }
    }

    pub fn rejected(reason: UnavailableReason) -> Self {
        Self {
            available: false,
            conflicts: Vec::new(),
            reason: Some(reason),
        }
    }

    pub fn conflicting(conflicts: Vec<Booking>) -> Self {
        if conflicts.is_empty() {
            return Self::free();
        }
        Self {
            available: false,
            conflicts,
            reason: Some(UnavailableReason::BookingConflict),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAvailabilityQuery {
    pub therapist_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
    #[serde(default)]
    pub exclude_booking_ids: HashSet<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkSlotResult {
    pub index: usize,
    pub slot: TimeSlot,
    pub available: bool,
    pub conflicts: Vec<Booking>,
    pub conflicts_within_batch: Vec<usize>,
    pub reason: Option<UnavailableReason>,
}

/// Per-slot outcomes, in the same order as the submitted slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAvailabilityResult {
    pub results: Vec<BulkSlotResult>,
}

impl BulkAvailabilityResult {
    pub fn all_available(&self) -> bool {
        self.results.iter().all(|r| r.available)
    }
}

// ==============================================================================
// CONFLICT RESOLUTION
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPreferences {
    #[serde(default, with = "hhmm::option")]
    pub preferred_start: Option<NaiveTime>,
    pub max_shift_minutes: u32,
    pub allow_different_day: bool,
}

impl Default for ResolutionPreferences {
    fn default() -> Self {
        Self {
            preferred_start: None,
            max_shift_minutes: 60,
            allow_different_day: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRequest {
    pub therapist_id: Uuid,
    pub date: NaiveDate,
    pub duration_minutes: u32,
    /// Start of the slot that was found to conflict. Used as the search
    /// anchor when no preferred start is given.
    #[serde(default, with = "hhmm::option")]
    pub original_start: Option<NaiveTime>,
    #[serde(default)]
    pub preferences: ResolutionPreferences,
    #[serde(default)]
    pub exclude_booking_id: Option<Uuid>,
    /// Maximum number of suggestions; falls back to the configured default.
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSuggestion {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub time_shift_minutes: i32,
    pub day_shift_count: u32,
}

/// Ranked suggestions plus what the search did to find them. An empty
/// `suggestions` list is a successful "nothing fits" answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub suggestions: Vec<ResolutionSuggestion>,
    pub candidates_evaluated: usize,
    pub days_examined: u32,
    /// The deadline cut the search short after some suggestions were found.
    pub partial: bool,
}

// ==============================================================================
// SERDE HELPERS
// ==============================================================================

/// `HH:mm` wire format for wall-clock times; `HH:mm:ss` is accepted on input.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn parse(value: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(value, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
            .ok()
    }

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}', expected HH:mm", raw)))
    }

    pub mod option {
        use chrono::NaiveTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(t) => super::serialize(t, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid time '{}', expected HH:mm", raw))),
                None => Ok(None),
            }
        }
    }
}
