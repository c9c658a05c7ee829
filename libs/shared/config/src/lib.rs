use std::env;
use std::str::FromStr;
use tracing::warn;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_service_token: Option<String>,
    pub api_port: u16,
    pub scheduling: SchedulingConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_service_token: env::var("SUPABASE_SERVICE_TOKEN").ok(),
            api_port: parse_var("API_PORT", 3000),
            scheduling: SchedulingConfig::from_env(),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }
}

/// Ordering applied between two suggestions that share the same day shift
/// and the same absolute time shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    #[default]
    EarlierFirst,
    LaterFirst,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "earlier" | "earlier_first" | "earliest" => Ok(TieBreak::EarlierFirst),
            "later" | "later_first" | "latest" => Ok(TieBreak::LaterFirst),
            other => Err(format!("unknown tie-break '{}'", other)),
        }
    }
}

/// Tunables of the scheduling engine. Every value has a default, so a bare
/// environment still yields a working engine.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub step_minutes: u32,
    pub horizon_days: u32,
    pub default_limit: usize,
    pub min_duration_minutes: u32,
    pub max_duration_minutes: u32,
    pub max_shift_limit_minutes: u32,
    pub buffer_minutes: u32,
    pub deadline_ms: u64,
    pub max_bulk_slots: usize,
    pub tie_break: TieBreak,
    /// Weekly template such as `mon-fri=09:00-17:00,sat=10:00-14:00`. When set
    /// it replaces per-therapist working hours from the database.
    pub working_hours: Option<String>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            step_minutes: 15,
            horizon_days: 14,
            default_limit: 3,
            min_duration_minutes: 15,
            max_duration_minutes: 480,
            max_shift_limit_minutes: 480,
            buffer_minutes: 0,
            deadline_ms: 5_000,
            max_bulk_slots: 50,
            tie_break: TieBreak::EarlierFirst,
            working_hours: None,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            step_minutes: parse_var("SCHEDULING_STEP_MINUTES", defaults.step_minutes),
            horizon_days: parse_var("SCHEDULING_HORIZON_DAYS", defaults.horizon_days),
            default_limit: parse_var("SCHEDULING_DEFAULT_LIMIT", defaults.default_limit),
            min_duration_minutes: parse_var("SCHEDULING_MIN_DURATION_MINUTES", defaults.min_duration_minutes),
            max_duration_minutes: parse_var("SCHEDULING_MAX_DURATION_MINUTES", defaults.max_duration_minutes),
            max_shift_limit_minutes: parse_var("SCHEDULING_MAX_SHIFT_MINUTES", defaults.max_shift_limit_minutes),
            buffer_minutes: parse_var("SCHEDULING_BUFFER_MINUTES", defaults.buffer_minutes),
            deadline_ms: parse_var("SCHEDULING_DEADLINE_MS", defaults.deadline_ms),
            max_bulk_slots: parse_var("SCHEDULING_MAX_BULK_SLOTS", defaults.max_bulk_slots),
            tie_break: parse_var("SCHEDULING_TIE_BREAK", defaults.tie_break),
            working_hours: env::var("SCHEDULING_WORKING_HOURS").ok().filter(|v| !v.trim().is_empty()),
        }
        .sanitized()
    }

    /// Replaces values the engine cannot work with. Shifts and durations are
    /// wall-clock minutes inside one day, so both are capped at a day.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        if self.step_minutes == 0 {
            warn!("SCHEDULING_STEP_MINUTES must be positive, using default");
            self.step_minutes = defaults.step_minutes;
        }
        if self.default_limit == 0 {
            warn!("SCHEDULING_DEFAULT_LIMIT must be positive, using default");
            self.default_limit = defaults.default_limit;
        }
        if self.max_shift_limit_minutes > MINUTES_PER_DAY {
            warn!("SCHEDULING_MAX_SHIFT_MINUTES of {} exceeds one day, capping at {}",
                  self.max_shift_limit_minutes, MINUTES_PER_DAY);
            self.max_shift_limit_minutes = MINUTES_PER_DAY;
        }
        if self.max_duration_minutes > MINUTES_PER_DAY {
            warn!("SCHEDULING_MAX_DURATION_MINUTES of {} exceeds one day, capping at {}",
                  self.max_duration_minutes, MINUTES_PER_DAY);
            self.max_duration_minutes = MINUTES_PER_DAY;
        }
        if self.min_duration_minutes > self.max_duration_minutes {
            warn!("Scheduling duration bounds are inverted, using defaults");
            self.min_duration_minutes = defaults.min_duration_minutes;
            self.max_duration_minutes = defaults.max_duration_minutes;
        }

        self
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value '{}', using default", key, raw);
            default
        }),
        Err(_) => default,
    }
}
