// libs/scheduling-cell/src/adapters/supabase.rs
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Weekday};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{hhmm, Booking, WorkingWindow};
use crate::ports::{AvailabilityPort, PortError, WorkingHoursPolicy};

const SESSIONS_PATH: &str = "/rest/v1/therapy_sessions";
const WORKING_HOURS_PATH: &str = "/rest/v1/therapist_working_hours";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
    Rescheduled,
}

impl SessionStatus {
    /// Only these occupy the therapist's calendar.
    pub fn is_active(&self) -> bool {
        matches!(self,
            SessionStatus::Pending |
            SessionStatus::Confirmed |
            SessionStatus::InProgress
        )
    }
}

#[derive(Debug, Deserialize)]
struct SessionRow {
    id: Uuid,
    therapist_id: Uuid,
    session_date: NaiveDate,
    start_time: String,
    end_time: String,
    status: SessionStatus,
}

#[derive(Debug, Deserialize)]
struct WorkingHoursRow {
    start_time: String,
    end_time: String,
}

/// Reads sessions and working hours from the clinic database through PostgREST.
pub struct SupabaseSchedulingStore {
    supabase: SupabaseClient,
}

impl SupabaseSchedulingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    pub fn with_client(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    async fn fetch_rows<T>(&self, path: &str) -> Result<Vec<T>, PortError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let result: Vec<Value> = self.supabase
            .request(Method::GET, path)
            .await
            .map_err(|e| PortError::Backend(e.to_string()))?;

        result.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(|e| PortError::Malformed(format!("Failed to parse rows from {}: {}", path, e)))
    }
}

fn parse_time(raw: &str, column: &str) -> Result<NaiveTime, PortError> {
    hhmm::parse(raw).ok_or_else(|| PortError::Malformed(format!("{} '{}' is not a time", column, raw)))
}

#[async_trait]
impl AvailabilityPort for SupabaseSchedulingStore {
    async fn get_bookings(&self, therapist_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>, PortError> {
        debug!("Fetching sessions for therapist {} on {}", therapist_id, date);

        let path = format!(
            "{}?therapist_id=eq.{}&session_date=eq.{}&status=in.(pending,confirmed,in_progress)&order=start_time.asc",
            SESSIONS_PATH,
            therapist_id,
            date.format("%Y-%m-%d"),
        );

        let rows: Vec<SessionRow> = self.fetch_rows(&path).await?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in rows.into_iter().filter(|r| r.status.is_active()) {
            bookings.push(Booking {
                id: row.id,
                therapist_id: row.therapist_id,
                date: row.session_date,
                start: parse_time(&row.start_time, "start_time")?,
                end: parse_time(&row.end_time, "end_time")?,
            });
        }

        Ok(bookings)
    }
}

#[async_trait]
impl WorkingHoursPolicy for SupabaseSchedulingStore {
    async fn window_for(&self, therapist_id: Uuid, weekday: Weekday) -> Result<Option<WorkingWindow>, PortError> {
        // day_of_week follows the database convention: 0 = Sunday.
        let path = format!(
            "{}?therapist_id=eq.{}&day_of_week=eq.{}&is_available=eq.true&order=start_time.asc",
            WORKING_HOURS_PATH,
            therapist_id,
            weekday.num_days_from_sunday(),
        );

        let rows: Vec<WorkingHoursRow> = self.fetch_rows(&path).await?;
        if rows.len() > 1 {
            warn!("Therapist {} has {} working-hour rows for {}, using the earliest",
                  therapist_id, rows.len(), weekday);
        }

        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };

        let start = parse_time(&row.start_time, "start_time")?;
        let end = parse_time(&row.end_time, "end_time")?;
        if start >= end {
            return Err(PortError::Malformed(format!(
                "working hours for therapist {} on {} end before they start", therapist_id, weekday
            )));
        }

        Ok(Some(WorkingWindow::new(weekday, start, end)))
    }
}
