// libs/scheduling-cell/src/handlers.rs
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use axum::{extract::State, Json};
use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::error::SchedulingError;
use crate::models::{ResolutionPreferences, ResolutionRequest, TimeSlot};
use crate::services::SchedulingService;

static HH_MM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").expect("valid HH:mm pattern"));

// ==============================================================================
// REQUEST BODIES
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityBody {
    #[serde(alias = "therapistId")]
    pub therapist_id: Uuid,
    pub date: String,
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
    pub duration: i64,
    #[serde(default, alias = "excludeBookingId")]
    pub exclude_booking_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct SlotBody {
    #[serde(alias = "startTime")]
    pub start_time: String,
    #[serde(alias = "endTime")]
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkCheckBody {
    #[serde(alias = "therapistId")]
    pub therapist_id: Uuid,
    pub date: String,
    pub slots: Vec<SlotBody>,
    #[serde(default, alias = "excludeBookingIds")]
    pub exclude_booking_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreferencesBody {
    #[serde(default, alias = "preferredTime", alias = "preferred_start")]
    pub preferred_time: Option<String>,
    #[serde(default, alias = "maxTimeShift", alias = "max_shift_minutes")]
    pub max_time_shift: Option<i64>,
    #[serde(default, alias = "allowDifferentDay")]
    pub allow_different_day: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveConflictsBody {
    #[serde(alias = "therapistId")]
    pub therapist_id: Uuid,
    pub date: String,
    pub duration: i64,
    #[serde(default, alias = "originalTime", alias = "startTime", alias = "start_time")]
    pub original_time: Option<String>,
    #[serde(default)]
    pub preferences: Option<PreferencesBody>,
    #[serde(default, alias = "excludeBookingId")]
    pub exclude_booking_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<usize>,
}

// ==============================================================================
// BOUNDARY VALIDATION
// ==============================================================================

fn invalid(field: impl Into<String>, message: impl Into<String>) -> AppError {
    AppError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part is used).
fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| invalid(field, format!("'{}' is not a valid date", raw)))
}

fn parse_hh_mm(raw: &str, field: &str) -> Result<NaiveTime, AppError> {
    if !HH_MM.is_match(raw) {
        return Err(invalid(field, format!("'{}' must match HH:mm (24-hour)", raw)));
    }
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map_err(|_| invalid(field, format!("'{}' is not a valid time", raw)))
}

fn parse_bounded(value: i64, min: u32, max: u32, field: &str) -> Result<u32, AppError> {
    if value < i64::from(min) || value > i64::from(max) {
        return Err(invalid(field, format!("must be an integer between {} and {}", min, max)));
    }
    Ok(value as u32)
}

pub fn to_app_error(err: SchedulingError) -> AppError {
    match err {
        SchedulingError::InvalidInput { field, reason } => AppError::ValidationError { field, message: reason },
        SchedulingError::NoAvailabilityData(msg) => AppError::ExternalService(msg),
        e @ SchedulingError::Timeout { .. } => AppError::Timeout(e.to_string()),
    }
}

// ==============================================================================
// HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn check_availability(
    State(service): State<Arc<SchedulingService>>,
    Json(body): Json<CheckAvailabilityBody>,
) -> Result<Json<Value>, AppError> {
    let config = service.config();
    let date = parse_date(&body.date, "date")?;
    let start = parse_hh_mm(&body.start_time, "start_time")?;
    let end = parse_hh_mm(&body.end_time, "end_time")?;
    let duration = parse_bounded(body.duration, config.min_duration_minutes, config.max_duration_minutes, "duration")?;

    let result = service
        .check_availability(body.therapist_id, date, start, end, duration, body.exclude_booking_id)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "available": result.available,
        "conflicts": result.conflicts,
        "reason": result.reason,
    })))
}

#[axum::debug_handler]
pub async fn check_bulk_availability(
    State(service): State<Arc<SchedulingService>>,
    Json(body): Json<BulkCheckBody>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&body.date, "date")?;

    let slots = body
        .slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            Ok(TimeSlot::new(
                date,
                parse_hh_mm(&slot.start_time, &format!("slots[{}].start_time", i))?,
                parse_hh_mm(&slot.end_time, &format!("slots[{}].end_time", i))?,
            ))
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let excluded: HashSet<Uuid> = body.exclude_booking_ids.unwrap_or_default().into_iter().collect();

    let result = service
        .check_bulk_availability(body.therapist_id, date, slots, excluded)
        .await
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "all_available": result.all_available(),
        "results": result.results,
    })))
}

#[axum::debug_handler]
pub async fn resolve_conflicts(
    State(service): State<Arc<SchedulingService>>,
    Json(body): Json<ResolveConflictsBody>,
) -> Result<Json<Value>, AppError> {
    let config = service.config();
    let date = parse_date(&body.date, "date")?;
    let duration = parse_bounded(body.duration, config.min_duration_minutes, config.max_duration_minutes, "duration")?;
    let original_start = body
        .original_time
        .as_deref()
        .map(|raw| parse_hh_mm(raw, "original_time"))
        .transpose()?;

    let defaults = ResolutionPreferences::default();
    let body_preferences = body.preferences.unwrap_or_default();
    let preferences = ResolutionPreferences {
        preferred_start: body_preferences
            .preferred_time
            .as_deref()
            .map(|raw| parse_hh_mm(raw, "preferences.preferred_time"))
            .transpose()?,
        max_shift_minutes: match body_preferences.max_time_shift {
            Some(value) => parse_bounded(value, 0, config.max_shift_limit_minutes, "preferences.max_time_shift")?,
            None => defaults.max_shift_minutes,
        },
        allow_different_day: body_preferences.allow_different_day.unwrap_or(defaults.allow_different_day),
    };

    let request = ResolutionRequest {
        therapist_id: body.therapist_id,
        date,
        duration_minutes: duration,
        original_start,
        preferences,
        exclude_booking_id: body.exclude_booking_id,
        limit: body.limit,
    };

    let resolution = service.resolve(&request).await.map_err(to_app_error)?;

    let message = if resolution.suggestions.is_empty() {
        "No available slot found under these constraints"
    } else if resolution.partial {
        "Search stopped at the deadline; showing the slots confirmed so far"
    } else {
        "Alternative slots found"
    };

    Ok(Json(json!({
        "success": true,
        "suggestions": resolution.suggestions,
        "partial": resolution.partial,
        "candidates_evaluated": resolution.candidates_evaluated,
        "days_examined": resolution.days_examined,
        "message": message,
    })))
}
