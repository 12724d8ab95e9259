use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Noon,
    Evening,
}

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Noon => "noon",
            Self::Evening => "evening",
        }
    }
}

/// Weekly plan status as computed by the backend. The values are opaque to
/// this component; nothing client-side derives or recomputes them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeeklyStatus {
    Done,
    Incomplete,
    Scheduled,
}

impl WeeklyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Incomplete => "incomplete",
            Self::Scheduled => "scheduled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyPlanEntry {
    pub status: WeeklyStatus,
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodayPlanItem {
    pub supplement: String,
    pub slot: TimeOfDay,
    pub alert_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Supplement {
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
}

/// Inclusive day counting: a one-day intake starts and ends on the same day.
pub fn intake_end_date(start: NaiveDate, duration_days: u32) -> NaiveDate {
    start + Duration::days(i64::from(duration_days.max(1)) - 1)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntakeSchedule {
    pub supplement_name: String,
    pub intake_time: TimeOfDay,
    pub intake_start: NaiveDate,
    pub intake_distance: u32,
    pub intake_end: NaiveDate,
    pub memo: Option<String>,
}

impl IntakeSchedule {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.supplement_name, "schedule.supplement_name")?;
        if self.intake_distance == 0 {
            return Err("schedule.intake_distance must be > 0".to_string());
        }
        if self.intake_end != intake_end_date(self.intake_start, self.intake_distance) {
            return Err(
                "schedule.intake_end must equal intake_start + intake_distance - 1 days"
                    .to_string(),
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventSyncState {
    Synced,
    OutOfSync,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub sync_state: EventSyncState,
}

impl CalendarEvent {
    pub fn validate(&self) -> Result<(), String> {
        if self.end < self.start {
            return Err("event.end must not precede event.start".to_string());
        }
        Ok(())
    }
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// The Monday-anchored week containing `anchor`.
pub fn week_dates(anchor: NaiveDate) -> [NaiveDate; 7] {
    let monday = anchor - Duration::days(i64::from(anchor.weekday().num_days_from_monday()));
    std::array::from_fn(|offset| monday + Duration::days(offset as i64))
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}
