// libs/scheduling-cell/src/services/resolver.rs
//
// Bounded search for the nearest free slot once a requested time is taken.
//
// Candidates are generated outward from an anchor time in whole shift levels
// (0, ±step, ±2·step, … up to max_shift), first on the requested date and then,
// if allowed, on each following day up to the horizon. Each examined day costs
// one working-hours lookup and one booking fetch; everything after that is
// pure evaluation against the loaded snapshot. The worst case is
// (2·max_shift/step + 1) · days candidate evaluations.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, warn};

use shared_config::{TieBreak, MINUTES_PER_DAY};

use crate::error::SchedulingError;
use crate::models::{Interval, Resolution, ResolutionRequest, ResolutionSuggestion};
use crate::services::deadline::Deadline;
use crate::services::interval::{minutes_of_day, time_from_minutes};
use crate::services::slot_checker::{evaluate, validate_duration, SlotChecker};

pub struct ConflictResolver {
    checker: Arc<SlotChecker>,
}

struct DaySearch {
    suggestions: Vec<ResolutionSuggestion>,
    evaluated: usize,
}

impl ConflictResolver {
    pub fn new(checker: Arc<SlotChecker>) -> Self {
        Self { checker }
    }

    pub async fn resolve(
        &self,
        request: &ResolutionRequest,
        deadline: &Deadline,
    ) -> Result<Resolution, SchedulingError> {
        let config = self.checker.config();
        let preferences = &request.preferences;

        validate_duration(i64::from(request.duration_minutes), config, "duration")?;
        if preferences.max_shift_minutes > config.max_shift_limit_minutes {
            return Err(SchedulingError::invalid(
                "preferences.max_shift_minutes",
                format!("must be between 0 and {}", config.max_shift_limit_minutes),
            ));
        }
        let limit = request.limit.unwrap_or(config.default_limit);
        if limit == 0 {
            return Err(SchedulingError::invalid("limit", "must be at least 1"));
        }

        let last_day_shift = if preferences.allow_different_day { config.horizon_days } else { 0 };

        debug!("Resolving conflict for therapist {} on {} (duration {} min, max shift {} min, days 0..={})",
               request.therapist_id, request.date, request.duration_minutes,
               preferences.max_shift_minutes, last_day_shift);

        let mut suggestions = Vec::new();
        let mut candidates_evaluated = 0;
        let mut days_examined = 0;
        let mut partial = false;

        for day_shift in 0..=last_day_shift {
            let Some(date) = request.date.checked_add_days(Days::new(u64::from(day_shift))) else {
                break;
            };
            days_examined += 1;

            let needed = limit - suggestions.len();
            match self.search_day(request, date, day_shift, needed, deadline).await {
                Ok(day) => {
                    candidates_evaluated += day.evaluated;
                    suggestions.extend(day.suggestions);
                }
                Err(SchedulingError::Timeout { .. }) if !suggestions.is_empty() => {
                    warn!("Deadline hit while resolving for therapist {}, returning {} confirmed suggestions",
                          request.therapist_id, suggestions.len());
                    partial = true;
                    break;
                }
                Err(e) => return Err(e),
            }

            if suggestions.len() >= limit {
                break;
            }
        }

        rank_suggestions(&mut suggestions, config.tie_break);
        suggestions.truncate(limit);

        if suggestions.is_empty() {
            info!("No free slot found for therapist {} within the search horizon", request.therapist_id);
        } else {
            info!("Found {} suggestions for therapist {} after {} candidates over {} days",
                  suggestions.len(), request.therapist_id, candidates_evaluated, days_examined);
        }

        Ok(Resolution {
            suggestions,
            candidates_evaluated,
            days_examined,
            partial,
        })
    }

    /// Expands one day level by level and stops after the first level that
    /// brings the day to `needed` suggestions. Whole levels are evaluated so
    /// `-shift` and `+shift` always compete on equal terms.
    async fn search_day(
        &self,
        request: &ResolutionRequest,
        date: NaiveDate,
        day_shift: u32,
        needed: usize,
        deadline: &Deadline,
    ) -> Result<DaySearch, SchedulingError> {
        let config = self.checker.config();
        let mut day = DaySearch { suggestions: Vec::new(), evaluated: 0 };

        let Some(window) = self.checker.window_for(request.therapist_id, date, deadline).await? else {
            debug!("Therapist {} does not work on {}, skipping", request.therapist_id, date);
            return Ok(day);
        };

        let anchor = request
            .preferences
            .preferred_start
            .or(request.original_start)
            .unwrap_or(window.start);

        let bookings = self
            .checker
            .bookings_for(request.therapist_id, date, |id| Some(id) == request.exclude_booking_id, deadline)
            .await?;

        let anchor_minutes = minutes_of_day(anchor);
        let duration = i64::from(request.duration_minutes);
        let step = config.step_minutes.max(1);

        // No candidate shifted by more than a day can land inside it.
        let max_shift = request.preferences.max_shift_minutes.min(MINUTES_PER_DAY);

        let mut shift = 0;
        while shift <= max_shift {
            for offset in shift_offsets(shift) {
                let Some(candidate) = candidate_interval(anchor_minutes + offset, duration) else {
                    continue;
                };
                day.evaluated += 1;

                if evaluate(candidate, Some(&window), &bookings, config.buffer_minutes).available {
                    day.suggestions.push(ResolutionSuggestion {
                        date,
                        start: candidate.start,
                        end: candidate.end,
                        time_shift_minutes: offset as i32,
                        day_shift_count: day_shift,
                    });
                }
            }

            if day.suggestions.len() >= needed {
                break;
            }
            shift = match shift.checked_add(step) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(day)
    }
}

fn shift_offsets(shift: u32) -> Vec<i64> {
    let shift = i64::from(shift);
    if shift == 0 {
        vec![0]
    } else {
        vec![-shift, shift]
    }
}

/// `None` when the candidate would start before midnight or run past the day.
fn candidate_interval(start_minutes: i64, duration: i64) -> Option<Interval> {
    let start = time_from_minutes(start_minutes)?;
    let end = time_from_minutes(start_minutes + duration)?;
    Some(Interval::new(start, end))
}

/// Orders by `(day_shift_count, |time_shift_minutes|, start)`, with the start
/// comparison direction chosen by `tie_break`.
pub fn rank_suggestions(suggestions: &mut [ResolutionSuggestion], tie_break: TieBreak) {
    suggestions.sort_by(|a, b| {
        a.day_shift_count
            .cmp(&b.day_shift_count)
            .then(a.time_shift_minutes.unsigned_abs().cmp(&b.time_shift_minutes.unsigned_abs()))
            .then_with(|| match tie_break {
                TieBreak::EarlierFirst => a.start.cmp(&b.start),
                TieBreak::LaterFirst => b.start.cmp(&a.start),
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn suggestion(day_shift: u32, shift: i32, start: NaiveTime) -> ResolutionSuggestion {
        ResolutionSuggestion {
            date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
            start,
            end: start,
            time_shift_minutes: shift,
            day_shift_count: day_shift,
        }
    }

    #[test]
    fn test_rank_prefers_same_day_then_small_shift() {
        let mut list = vec![
            suggestion(1, 0, t(10, 0)),
            suggestion(0, 45, t(10, 45)),
            suggestion(0, -15, t(9, 45)),
        ];
        rank_suggestions(&mut list, TieBreak::EarlierFirst);

        let order: Vec<(u32, i32)> = list.iter().map(|s| (s.day_shift_count, s.time_shift_minutes)).collect();
        assert_eq!(order, vec![(0, -15), (0, 45), (1, 0)]);
    }

    #[test]
    fn test_rank_tie_break_direction() {
        let mut earlier = vec![suggestion(0, 60, t(11, 0)), suggestion(0, -60, t(9, 0))];
        rank_suggestions(&mut earlier, TieBreak::EarlierFirst);
        assert_eq!(earlier[0].start, t(9, 0));

        let mut later = vec![suggestion(0, -60, t(9, 0)), suggestion(0, 60, t(11, 0))];
        rank_suggestions(&mut later, TieBreak::LaterFirst);
        assert_eq!(later[0].start, t(11, 0));
    }

    #[test]
    fn test_candidates_never_wrap_midnight() {
        assert_eq!(candidate_interval(-15, 60), None);
        assert_eq!(candidate_interval(23 * 60, 60), None);
        assert_eq!(candidate_interval(22 * 60, 60), Some(Interval::new(t(22, 0), t(23, 0))));
    }

    #[test]
    fn test_shift_zero_has_single_candidate() {
        assert_eq!(shift_offsets(0), vec![0]);
        assert_eq!(shift_offsets(30), vec![-30, 30]);
    }
}
