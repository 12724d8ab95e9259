use crate::domain::models::{CalendarEvent, Supplement, TodayPlanItem, WeeklyPlanEntry};
use crate::infrastructure::backend_client::ScheduleBackendClient;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::plan_mapper::{
    decode_calendar_event, decode_today_plan, decode_weekly_plan,
};
use std::collections::HashMap;

#[derive(Debug)]
pub struct FetchFailure {
    pub resource: &'static str,
    pub message: String,
}

/// Result of the initial page load. Every resource that failed to fetch or
/// decode is already replaced by its empty value; the failure list exists
/// only for the command log, never for the user.
#[derive(Debug, Default)]
pub struct LoadedPageData {
    pub weekly_plan: HashMap<String, WeeklyPlanEntry>,
    pub today_plan: Vec<TodayPlanItem>,
    pub events: Vec<CalendarEvent>,
    pub supplements: Vec<Supplement>,
    pub failures: Vec<FetchFailure>,
}

#[derive(Debug, Default)]
pub struct RefreshedPlans {
    pub weekly_plan: HashMap<String, WeeklyPlanEntry>,
    pub today_plan: Vec<TodayPlanItem>,
    pub failures: Vec<FetchFailure>,
}

/// Fires the four independent reads concurrently. Completion order is
/// irrelevant; each result lands in its own slot.
pub async fn load_page_data(backend: &dyn ScheduleBackendClient) -> LoadedPageData {
    let (weekly, today, events, supplements) = tokio::join!(
        backend.fetch_weekly_plan(),
        backend.fetch_today_plan(),
        backend.fetch_events(),
        backend.fetch_supplements(),
    );

    let mut failures = Vec::new();
    LoadedPageData {
        weekly_plan: unwrap_or_empty(
            weekly.and_then(decode_weekly_plan),
            "weekly-plan",
            &mut failures,
        ),
        today_plan: unwrap_or_empty(
            today.and_then(decode_today_plan),
            "today-plan",
            &mut failures,
        ),
        events: unwrap_or_empty(events.and_then(decode_events), "events", &mut failures),
        supplements: unwrap_or_empty(supplements, "supplements", &mut failures),
        failures,
    }
}

/// Post-submit reconcile: only the weekly and today plans are re-fetched.
pub async fn refresh_plans(backend: &dyn ScheduleBackendClient) -> RefreshedPlans {
    let (weekly, today) = tokio::join!(backend.fetch_weekly_plan(), backend.fetch_today_plan());

    let mut failures = Vec::new();
    RefreshedPlans {
        weekly_plan: unwrap_or_empty(
            weekly.and_then(decode_weekly_plan),
            "weekly-plan",
            &mut failures,
        ),
        today_plan: unwrap_or_empty(
            today.and_then(decode_today_plan),
            "today-plan",
            &mut failures,
        ),
        failures,
    }
}

fn decode_events(
    wires: Vec<crate::infrastructure::backend_client::WireCalendarEvent>,
) -> Result<Vec<CalendarEvent>, InfraError> {
    let decoded = wires
        .iter()
        .map(decode_calendar_event)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(decoded.into_iter().flatten().collect())
}

fn unwrap_or_empty<T: Default>(
    result: Result<T, InfraError>,
    resource: &'static str,
    failures: &mut Vec<FetchFailure>,
) -> T {
    match result {
        Ok(value) => value,
        Err(error) => {
            failures.push(FetchFailure {
                resource,
                message: error.to_string(),
            });
            T::default()
        }
    }
}
