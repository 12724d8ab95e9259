use crate::domain::models::{intake_end_date, IntakeSchedule, TimeOfDay};
use chrono::NaiveDate;
use std::fmt;

pub const DEFAULT_DURATION_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationOption {
    Days30,
    Days60,
    Days90,
    Custom,
}

impl DurationOption {
    pub fn preset_days(self) -> Option<i64> {
        match self {
            Self::Days30 => Some(30),
            Self::Days60 => Some(60),
            Self::Days90 => Some(90),
            Self::Custom => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Days30 => "30",
            Self::Days60 => "60",
            Self::Days90 => "90",
            Self::Custom => "custom",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim() {
            "30" => Ok(Self::Days30),
            "60" => Ok(Self::Days60),
            "90" => Ok(Self::Days90),
            "custom" => Ok(Self::Custom),
            other => Err(format!("invalid duration option: {other}")),
        }
    }
}

/// First failing check wins; the wording is what the user sees in the modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormWarning {
    EmptySupplementName,
    StartBeforeToday,
    InvalidDuration,
}

impl fmt::Display for FormWarning {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::EmptySupplementName => "enter supplement name.",
            Self::StartBeforeToday => "start date must be today or later.",
            Self::InvalidDuration => "enter a valid duration.",
        };
        formatter.write_str(message)
    }
}

/// Input state for registering a new intake schedule. Time-of-day, start
/// date and the duration selection survive a successful submit; name and
/// memo are cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleForm {
    pub supplement_name: String,
    pub memo: String,
    pub intake_time: TimeOfDay,
    pub start_date: NaiveDate,
    pub duration_days: i64,
    pub custom_duration: String,
    pub duration_option: DurationOption,
}

impl ScheduleForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            supplement_name: String::new(),
            memo: String::new(),
            intake_time: TimeOfDay::Morning,
            start_date: today,
            duration_days: DEFAULT_DURATION_DAYS,
            custom_duration: DEFAULT_DURATION_DAYS.to_string(),
            duration_option: DurationOption::Days30,
        }
    }

    /// Presets write through to the custom field; "custom" applies whatever
    /// integer the custom field holds, defaulting to 30 when unparsable.
    pub fn select_duration_option(&mut self, option: DurationOption) {
        self.duration_option = option;
        match option.preset_days() {
            Some(days) => {
                self.duration_days = days;
                self.custom_duration = days.to_string();
            }
            None => {
                self.duration_days = parse_custom_duration(&self.custom_duration);
            }
        }
    }

    pub fn set_custom_duration(&mut self, value: &str) {
        self.custom_duration = value.to_string();
        if self.duration_option == DurationOption::Custom {
            self.duration_days = parse_custom_duration(value);
        }
    }

    pub fn end_date(&self) -> NaiveDate {
        intake_end_date(self.start_date, self.duration_days.max(1) as u32)
    }

    pub fn validate(&self, today: NaiveDate) -> Result<(), FormWarning> {
        if self.supplement_name.trim().is_empty() {
            return Err(FormWarning::EmptySupplementName);
        }
        if self.start_date < today {
            return Err(FormWarning::StartBeforeToday);
        }
        if self.duration_days <= 0 {
            return Err(FormWarning::InvalidDuration);
        }
        Ok(())
    }

    /// Builds the submission payload source. Only call after `validate`.
    pub fn to_schedule(&self) -> IntakeSchedule {
        let distance = self.duration_days.max(1) as u32;
        let memo = self.memo.trim();
        IntakeSchedule {
            supplement_name: self.supplement_name.trim().to_string(),
            intake_time: self.intake_time,
            intake_start: self.start_date,
            intake_distance: distance,
            intake_end: intake_end_date(self.start_date, distance),
            memo: if memo.is_empty() {
                None
            } else {
                Some(memo.to_string())
            },
        }
    }

    pub fn clear_after_submit(&mut self) {
        self.supplement_name.clear();
        self.memo.clear();
    }
}

fn parse_custom_duration(value: &str) -> i64 {
    value
        .trim()
        .parse::<i64>()
        .unwrap_or(DEFAULT_DURATION_DAYS)
}
