use crate::domain::models::{
    CalendarEvent, EventSyncState, IntakeSchedule, TimeOfDay, TodayPlanItem, WeeklyPlanEntry,
    WeeklyStatus,
};
use crate::infrastructure::backend_client::{
    SchedulePayload, WireCalendarEvent, WireTodayPlanItem, WireWeeklyPlanEntry,
};
use crate::infrastructure::error::InfraError;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use std::collections::HashMap;

/// Decodes a backend event. Events without an id are skipped rather than
/// invented locally: an id-less event could never be addressed by the
/// move/resize/delete sync calls.
pub fn decode_calendar_event(
    event: &WireCalendarEvent,
) -> Result<Option<CalendarEvent>, InfraError> {
    let Some(event_id) = event.id else {
        return Ok(None);
    };

    let start = parse_rfc3339_utc(&event.start, "start")?;
    let end = parse_rfc3339_utc(&event.end, "end")?;
    if end < start {
        return Err(InfraError::Api(
            "invalid calendar event: end precedes start".to_string(),
        ));
    }

    Ok(Some(CalendarEvent {
        id: event_id,
        title: event
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
        start,
        end,
        all_day: event.all_day,
        sync_state: EventSyncState::Synced,
    }))
}

pub fn encode_calendar_event(event: &CalendarEvent) -> WireCalendarEvent {
    WireCalendarEvent {
        id: Some(event.id),
        title: Some(event.title.clone()),
        start: event.start.to_rfc3339(),
        end: event.end.to_rfc3339(),
        all_day: event.all_day,
    }
}

/// Synthesizes the all-day calendar entry shown for a newly created intake
/// schedule, titled "<time-of-day> - <supplement name>".
pub fn event_from_schedule(schedule: &IntakeSchedule, event_id: i64) -> CalendarEvent {
    CalendarEvent {
        id: event_id,
        title: format!(
            "{} - {}",
            schedule.intake_time.as_str(),
            schedule.supplement_name
        ),
        start: day_start_utc(schedule.intake_start),
        end: day_start_utc(schedule.intake_end),
        all_day: true,
        sync_state: EventSyncState::Synced,
    }
}

pub fn payload_from_schedule(schedule: &IntakeSchedule) -> SchedulePayload {
    SchedulePayload {
        supplement_name: schedule.supplement_name.clone(),
        intake_time: schedule.intake_time.as_str().to_string(),
        intake_start: schedule.intake_start.to_string(),
        intake_distance: schedule.intake_distance,
        intake_end: schedule.intake_end.to_string(),
        memo: schedule.memo.clone().unwrap_or_default(),
    }
}

pub fn decode_today_plan(
    items: Vec<WireTodayPlanItem>,
) -> Result<Vec<TodayPlanItem>, InfraError> {
    items.iter().map(decode_today_item).collect()
}

fn decode_today_item(item: &WireTodayPlanItem) -> Result<TodayPlanItem, InfraError> {
    let supplement = item.supplement.trim();
    if supplement.is_empty() {
        return Err(InfraError::Api(
            "invalid today plan item: supplement is empty".to_string(),
        ));
    }

    Ok(TodayPlanItem {
        supplement: supplement.to_string(),
        slot: parse_time_of_day(&item.time_of_day)?,
        alert_time: parse_clock_time(&item.time)?,
    })
}

pub fn decode_weekly_plan(
    plan: HashMap<String, WireWeeklyPlanEntry>,
) -> Result<HashMap<String, WeeklyPlanEntry>, InfraError> {
    plan.into_iter()
        .map(|(day, entry)| {
            let status = match entry.status.as_deref() {
                Some(value) => parse_weekly_status(value)?,
                None => WeeklyStatus::Incomplete,
            };
            Ok((
                day,
                WeeklyPlanEntry {
                    status,
                    items: entry.items,
                },
            ))
        })
        .collect()
}

pub fn parse_time_of_day(value: &str) -> Result<TimeOfDay, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "morning" => Ok(TimeOfDay::Morning),
        "noon" => Ok(TimeOfDay::Noon),
        "evening" => Ok(TimeOfDay::Evening),
        other => Err(InfraError::Api(format!("invalid time-of-day value: {other}"))),
    }
}

fn parse_weekly_status(value: &str) -> Result<WeeklyStatus, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "done" => Ok(WeeklyStatus::Done),
        "incomplete" => Ok(WeeklyStatus::Incomplete),
        "scheduled" => Ok(WeeklyStatus::Scheduled),
        other => Err(InfraError::Api(format!("invalid weekly status value: {other}"))),
    }
}

fn parse_clock_time(value: &str) -> Result<NaiveTime, InfraError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|error| InfraError::Api(format!("invalid clock time '{trimmed}': {error}")))
}

pub fn parse_rfc3339_utc(value: &str, field_name: &str) -> Result<DateTime<Utc>, InfraError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| {
            InfraError::Api(format!("invalid calendar event {field_name} '{value}': {error}"))
        })
}

fn day_start_utc(date: chrono::NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
