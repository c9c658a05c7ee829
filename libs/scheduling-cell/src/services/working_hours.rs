// libs/scheduling-cell/src/services/working_hours.rs
use async_trait::async_trait;
use chrono::{NaiveTime, Weekday};
use uuid::Uuid;

use crate::error::SchedulingError;
use crate::models::{hhmm, Interval, WorkingWindow};
use crate::ports::{PortError, WorkingHoursPolicy};
use crate::services::interval::contains;

/// One weekly template applied to every therapist. Used when the clinic runs
/// fixed opening hours instead of per-therapist schedules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StandardWorkingHours {
    days: [Option<(NaiveTime, NaiveTime)>; 7],
}

impl StandardWorkingHours {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses templates such as `mon-fri=09:00-17:00,sat=10:00-14:00`.
    /// Later entries override earlier ones for the same weekday.
    pub fn parse(template: &str) -> Result<Self, SchedulingError> {
        let mut hours = Self::new();

        for entry in template.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (days, range) = entry
                .split_once('=')
                .ok_or_else(|| SchedulingError::invalid("working_hours", format!("'{}' is missing '='", entry)))?;
            let (start, end) = range
                .split_once('-')
                .and_then(|(s, e)| Some((hhmm::parse(s.trim())?, hhmm::parse(e.trim())?)))
                .ok_or_else(|| SchedulingError::invalid("working_hours", format!("'{}' is not an HH:mm-HH:mm range", range)))?;
            if start >= end {
                return Err(SchedulingError::invalid("working_hours", format!("'{}' ends before it starts", range)));
            }

            for weekday in parse_day_range(days)? {
                hours.days[weekday.num_days_from_monday() as usize] = Some((start, end));
            }
        }

        Ok(hours)
    }

    pub fn window(&self, weekday: Weekday) -> Option<WorkingWindow> {
        self.days[weekday.num_days_from_monday() as usize]
            .map(|(start, end)| WorkingWindow::new(weekday, start, end))
    }
}

fn parse_weekday(raw: &str) -> Result<Weekday, SchedulingError> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| SchedulingError::invalid("working_hours", format!("unknown weekday '{}'", raw)))
}

fn parse_day_range(raw: &str) -> Result<Vec<Weekday>, SchedulingError> {
    let (first, last) = match raw.split_once('-') {
        Some((a, b)) => (parse_weekday(a)?, parse_weekday(b)?),
        None => {
            let day = parse_weekday(raw)?;
            (day, day)
        }
    };

    let mut days = vec![first];
    let mut current = first;
    while current != last {
        current = current.succ();
        days.push(current);
    }
    Ok(days)
}

#[async_trait]
impl WorkingHoursPolicy for StandardWorkingHours {
    async fn window_for(&self, _therapist_id: Uuid, weekday: Weekday) -> Result<Option<WorkingWindow>, PortError> {
        Ok(self.window(weekday))
    }
}

/// A slot is bookable only inside a window; no window means no bookable time.
pub fn is_within_working_hours(window: Option<&WorkingWindow>, slot: Interval) -> bool {
    window.is_some_and(|w| contains(w.interval(), slot))
}
