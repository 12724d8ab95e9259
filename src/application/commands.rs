use crate::application::calendar_board::{CalendarBoardService, EventSyncOutcome};
use crate::application::data_loader::{load_page_data, refresh_plans};
use crate::application::reminder_scheduler::ReminderScheduler;
use crate::application::schedule_form::{DurationOption, ScheduleForm};
use crate::domain::models::{
    week_dates, weekday_name, CalendarEvent, Supplement, TimeOfDay, TodayPlanItem, WeeklyPlanEntry,
    WeeklyStatus,
};
use crate::infrastructure::backend_client::{ReqwestScheduleBackendClient, ScheduleBackendClient};
use crate::infrastructure::credential_store::{CredentialStore, KeyringCredentialStore};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_cache::{EventCacheRepository, InMemoryEventCacheRepository};
use crate::infrastructure::notifier::{InMemoryNotificationCenter, Notice};
use crate::infrastructure::plan_mapper::{parse_rfc3339_utc, payload_from_schedule};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct AppState {
    config_dir: PathBuf,
    logs_dir: PathBuf,
    timezone: Tz,
    backend: Arc<dyn ScheduleBackendClient>,
    credentials: Arc<dyn CredentialStore>,
    event_cache: Arc<InMemoryEventCacheRepository>,
    notices: Arc<InMemoryNotificationCenter>,
    reminders: ReminderScheduler,
    runtime: Mutex<RuntimeState>,
    log_guard: Mutex<()>,
    now_provider: NowProvider,
}

impl AppState {
    pub fn new(workspace_root: &Path) -> Result<Self, InfraError> {
        let bootstrap = crate::application::bootstrap::bootstrap_workspace(workspace_root)?;
        let base_url = crate::infrastructure::config::read_base_url(&bootstrap.config_dir)?;
        let timezone = resolve_timezone(&bootstrap.config_dir)?;

        let credentials: Arc<dyn CredentialStore> = Arc::new(KeyringCredentialStore::default());
        let backend: Arc<dyn ScheduleBackendClient> = Arc::new(ReqwestScheduleBackendClient::new(
            base_url,
            Arc::clone(&credentials),
        ));

        Ok(Self::assemble(
            bootstrap.config_dir,
            bootstrap.logs_dir,
            timezone,
            backend,
            credentials,
            Arc::new(Utc::now),
        ))
    }

    /// Wires the state from already-built components. Production goes
    /// through `new`; tests substitute fakes here.
    pub fn assemble(
        config_dir: PathBuf,
        logs_dir: PathBuf,
        timezone: Tz,
        backend: Arc<dyn ScheduleBackendClient>,
        credentials: Arc<dyn CredentialStore>,
        now_provider: NowProvider,
    ) -> Self {
        let notices = Arc::new(InMemoryNotificationCenter::default());
        let reminders = ReminderScheduler::new(Arc::clone(&notices), timezone)
            .with_now_provider(Arc::clone(&now_provider));
        let today = (now_provider)().with_timezone(&timezone).date_naive();

        Self {
            config_dir,
            logs_dir,
            timezone,
            backend,
            credentials,
            event_cache: Arc::new(InMemoryEventCacheRepository::default()),
            notices,
            reminders,
            runtime: Mutex::new(RuntimeState::new(today)),
            log_guard: Mutex::new(()),
            now_provider,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn notification_center(&self) -> &InMemoryNotificationCenter {
        &self.notices
    }

    pub fn command_error(&self, command: &str, error: &InfraError) -> String {
        self.log_error(command, &error.to_string());
        error.to_string()
    }

    pub fn log_info(&self, command: &str, message: &str) {
        self.append_log("info", command, message);
    }

    pub fn log_error(&self, command: &str, message: &str) {
        self.append_log("error", command, message);
    }

    fn append_log(&self, level: &str, command: &str, message: &str) {
        let Ok(_guard) = self.log_guard.lock() else {
            return;
        };
        let path = self.logs_dir.join("commands.log");
        let payload = serde_json::json!({
            "timestamp": (self.now_provider)().to_rfc3339(),
            "level": level,
            "command": command,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
            let _ = writeln!(file, "{}", payload);
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.now_provider)()
    }

    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.timezone).date_naive()
    }

    fn board(&self) -> CalendarBoardService {
        CalendarBoardService::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.event_cache) as Arc<dyn EventCacheRepository>,
        )
    }
}

fn resolve_timezone(config_dir: &Path) -> Result<Tz, InfraError> {
    let Some(raw) = crate::infrastructure::config::read_timezone(config_dir)? else {
        return Ok(chrono_tz::UTC);
    };
    raw.parse::<Tz>()
        .map_err(|_| InfraError::InvalidConfig(format!("invalid timezone '{raw}'")))
}

#[derive(Debug)]
struct RuntimeState {
    weekly_plan: HashMap<String, WeeklyPlanEntry>,
    today_plan: Vec<TodayPlanItem>,
    supplements: Vec<Supplement>,
    form: ScheduleForm,
    selected_date: NaiveDate,
}

impl RuntimeState {
    fn new(today: NaiveDate) -> Self {
        Self {
            weekly_plan: HashMap::new(),
            today_plan: Vec::new(),
            supplements: Vec::new(),
            form: ScheduleForm::new(today),
            selected_date: today,
        }
    }
}

fn lock_runtime(state: &AppState) -> Result<MutexGuard<'_, RuntimeState>, InfraError> {
    state
        .runtime
        .lock()
        .map_err(|error| InfraError::InvalidConfig(format!("runtime lock poisoned: {error}")))
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActivatePageResponse {
    pub status: String,
    pub weekly_days: usize,
    pub today_items: usize,
    pub events: usize,
    pub supplements: usize,
    pub reminders_armed: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScheduleFormResponse {
    pub supplement_name: String,
    pub memo: String,
    pub intake_time: String,
    pub start_date: String,
    pub duration_days: i64,
    pub custom_duration: String,
    pub duration_option: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubmitScheduleResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EventSyncResponse {
    pub event_id: i64,
    pub start: String,
    pub end: String,
    pub synced: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RefreshPlansResponse {
    pub weekly_days: usize,
    pub today_items: usize,
    pub reminders_armed: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TodayPanelResponse {
    pub slot: String,
    pub supplements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WeekDayResponse {
    pub date: String,
    pub weekday: String,
    pub status: String,
    pub items: Vec<String>,
}

/// First activation of the schedule page: gate on the stored credential,
/// probe the account type (best effort), then load the four resources and
/// arm today's reminders.
pub async fn activate_page_impl(state: &AppState) -> Result<ActivatePageResponse, InfraError> {
    let token = state.credentials.load_token()?;
    if token.as_deref().map(str::trim).unwrap_or_default().is_empty() {
        state.log_info("activate_page", "no access token; redirecting to login");
        return Ok(ActivatePageResponse {
            status: "login_required".to_string(),
            weekly_days: 0,
            today_items: 0,
            events: 0,
            supplements: 0,
            reminders_armed: 0,
        });
    }

    if let Err(error) = state.backend.probe_account_type().await {
        state.log_error("activate_page", &format!("account type probe failed: {error}"));
    }

    let loaded = load_page_data(state.backend.as_ref()).await;
    for failure in &loaded.failures {
        state.log_error(
            "activate_page",
            &format!("fetch {} failed: {}", failure.resource, failure.message),
        );
    }

    state.event_cache.replace_all(loaded.events.clone())?;
    let reminders_armed = state.reminders.arm(&loaded.today_plan)?;

    let response = ActivatePageResponse {
        status: "ready".to_string(),
        weekly_days: loaded.weekly_plan.len(),
        today_items: loaded.today_plan.len(),
        events: loaded.events.len(),
        supplements: loaded.supplements.len(),
        reminders_armed,
    };

    {
        let mut runtime = lock_runtime(state)?;
        runtime.weekly_plan = loaded.weekly_plan;
        runtime.today_plan = loaded.today_plan;
        runtime.supplements = loaded.supplements;
    }

    state.log_info(
        "activate_page",
        &format!(
            "loaded weekly_days={} today_items={} events={} supplements={}",
            response.weekly_days, response.today_items, response.events, response.supplements
        ),
    );
    Ok(response)
}

pub fn update_schedule_form_impl(
    state: &AppState,
    supplement_name: Option<String>,
    memo: Option<String>,
    intake_time: Option<String>,
    start_date: Option<String>,
) -> Result<ScheduleFormResponse, InfraError> {
    let intake_time = intake_time
        .as_deref()
        .map(parse_time_of_day_input)
        .transpose()?;
    let start_date = start_date.as_deref().map(parse_date_input).transpose()?;

    let mut runtime = lock_runtime(state)?;
    if let Some(supplement_name) = supplement_name {
        runtime.form.supplement_name = supplement_name;
    }
    if let Some(memo) = memo {
        runtime.form.memo = memo;
    }
    if let Some(intake_time) = intake_time {
        runtime.form.intake_time = intake_time;
    }
    if let Some(start_date) = start_date {
        runtime.form.start_date = start_date;
    }
    Ok(form_response(&runtime.form))
}

pub fn set_duration_option_impl(
    state: &AppState,
    option: String,
) -> Result<ScheduleFormResponse, InfraError> {
    let option = DurationOption::parse(&option).map_err(InfraError::InvalidConfig)?;
    let mut runtime = lock_runtime(state)?;
    runtime.form.select_duration_option(option);
    Ok(form_response(&runtime.form))
}

pub fn set_custom_duration_impl(
    state: &AppState,
    value: String,
) -> Result<ScheduleFormResponse, InfraError> {
    let mut runtime = lock_runtime(state)?;
    runtime.form.set_custom_duration(&value);
    Ok(form_response(&runtime.form))
}

pub fn schedule_form_impl(state: &AppState) -> Result<ScheduleFormResponse, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok(form_response(&runtime.form))
}

/// Submits the current form. Validation failures warn and never reach the
/// network; a created schedule clears name/memo, appends the synthesized
/// calendar event and reconciles the weekly/today plans.
pub async fn submit_schedule_impl(state: &AppState) -> Result<SubmitScheduleResponse, InfraError> {
    let form = {
        let runtime = lock_runtime(state)?;
        runtime.form.clone()
    };

    if let Err(warning) = form.validate(state.today()) {
        state.log_info("submit_schedule", &format!("rejected: {warning}"));
        state.notices.push(Notice::warning(warning.to_string()));
        return Ok(SubmitScheduleResponse {
            status: "rejected".to_string(),
            warning: Some(warning.to_string()),
            event_id: None,
        });
    }

    let schedule = form.to_schedule();
    let payload = payload_from_schedule(&schedule);

    let schedule_id = match state.backend.create_schedule(&payload).await {
        Ok(schedule_id) => schedule_id,
        Err(error) => {
            state.log_error("submit_schedule", &error.to_string());
            state
                .notices
                .push(Notice::error("failed to register intake schedule."));
            return Ok(SubmitScheduleResponse {
                status: "failed".to_string(),
                warning: None,
                event_id: None,
            });
        }
    };

    let event_id = schedule_id.unwrap_or_else(|| state.now().timestamp_millis());
    state.board().append_created_event(&schedule, event_id)?;

    {
        let mut runtime = lock_runtime(state)?;
        runtime.form.clear_after_submit();
    }
    state
        .notices
        .push(Notice::success("intake schedule registered."));

    let refreshed = refresh_plans(state.backend.as_ref()).await;
    for failure in &refreshed.failures {
        state.log_error(
            "submit_schedule",
            &format!("refresh {} failed: {}", failure.resource, failure.message),
        );
    }
    let reminders_armed = state.reminders.arm(&refreshed.today_plan)?;
    {
        let mut runtime = lock_runtime(state)?;
        runtime.weekly_plan = refreshed.weekly_plan;
        runtime.today_plan = refreshed.today_plan;
    }

    state.log_info(
        "submit_schedule",
        &format!(
            "registered '{}' event_id={event_id} reminders_armed={reminders_armed}",
            schedule.supplement_name
        ),
    );
    Ok(SubmitScheduleResponse {
        status: "created".to_string(),
        warning: None,
        event_id: Some(event_id),
    })
}

pub async fn move_event_impl(
    state: &AppState,
    event_id: i64,
    start: String,
    end: String,
) -> Result<EventSyncResponse, InfraError> {
    let start = parse_rfc3339_utc(&start, "start")?;
    let end = parse_rfc3339_utc(&end, "end")?;

    match state.board().move_event(event_id, start, end).await? {
        EventSyncOutcome::Synced(event) => {
            state.log_info("move_event", &format!("moved event_id={event_id}"));
            Ok(event_sync_response(&event, true))
        }
        EventSyncOutcome::OutOfSync { event, error } => {
            state.log_error(
                "move_event",
                &format!("event_id={event_id} kept locally, backend update failed: {error}"),
            );
            Ok(event_sync_response(&event, false))
        }
    }
}

pub async fn resize_event_impl(
    state: &AppState,
    event_id: i64,
    start: String,
    end: String,
) -> Result<EventSyncResponse, InfraError> {
    let start = parse_rfc3339_utc(&start, "start")?;
    let end = parse_rfc3339_utc(&end, "end")?;

    match state.board().resize_event(event_id, start, end).await? {
        EventSyncOutcome::Synced(event) => {
            state.log_info("resize_event", &format!("resized event_id={event_id}"));
            Ok(event_sync_response(&event, true))
        }
        EventSyncOutcome::OutOfSync { event, error } => {
            state.log_error(
                "resize_event",
                &format!("event_id={event_id} kept locally, backend update failed: {error}"),
            );
            Ok(event_sync_response(&event, false))
        }
    }
}

/// Deletes backend-first; the error from a refused delete propagates to the
/// shell (its blocking alert) and the local event stays in place.
pub async fn delete_event_impl(state: &AppState, event_id: i64) -> Result<bool, InfraError> {
    match state.board().delete_event(event_id).await {
        Ok(removed) => {
            state.log_info("delete_event", &format!("deleted event_id={event_id}"));
            Ok(removed)
        }
        Err(error) => {
            state.log_error("delete_event", &error.to_string());
            Err(error)
        }
    }
}

pub async fn resync_event_impl(
    state: &AppState,
    event_id: i64,
) -> Result<EventSyncResponse, InfraError> {
    match state.board().resync_event(event_id).await {
        Ok(event) => {
            state.log_info("resync_event", &format!("resynced event_id={event_id}"));
            Ok(event_sync_response(&event, true))
        }
        Err(error) => {
            state.log_error("resync_event", &error.to_string());
            Err(error)
        }
    }
}

pub fn list_events_impl(state: &AppState) -> Result<Vec<CalendarEvent>, InfraError> {
    state.board().list_events()
}

pub fn list_out_of_sync_events_impl(state: &AppState) -> Result<Vec<CalendarEvent>, InfraError> {
    state.board().list_out_of_sync()
}

pub async fn refresh_plans_impl(state: &AppState) -> Result<RefreshPlansResponse, InfraError> {
    let refreshed = refresh_plans(state.backend.as_ref()).await;
    for failure in &refreshed.failures {
        state.log_error(
            "refresh_plans",
            &format!("fetch {} failed: {}", failure.resource, failure.message),
        );
    }

    let reminders_armed = state.reminders.arm(&refreshed.today_plan)?;
    let response = RefreshPlansResponse {
        weekly_days: refreshed.weekly_plan.len(),
        today_items: refreshed.today_plan.len(),
        reminders_armed,
    };

    let mut runtime = lock_runtime(state)?;
    runtime.weekly_plan = refreshed.weekly_plan;
    runtime.today_plan = refreshed.today_plan;
    Ok(response)
}

pub fn arm_reminders_impl(state: &AppState) -> Result<usize, InfraError> {
    let today_plan = {
        let runtime = lock_runtime(state)?;
        runtime.today_plan.clone()
    };
    let armed = state.reminders.arm(&today_plan)?;
    state.log_info("arm_reminders", &format!("armed {armed} reminders"));
    Ok(armed)
}

/// The three time-of-day panels above the calendar, in display order.
pub fn today_overview_impl(state: &AppState) -> Result<Vec<TodayPanelResponse>, InfraError> {
    let runtime = lock_runtime(state)?;
    Ok([TimeOfDay::Morning, TimeOfDay::Noon, TimeOfDay::Evening]
        .into_iter()
        .map(|slot| TodayPanelResponse {
            slot: slot.as_str().to_string(),
            supplements: runtime
                .today_plan
                .iter()
                .filter(|item| item.slot == slot)
                .map(|item| item.supplement.clone())
                .collect(),
        })
        .collect())
}

/// The Monday-anchored week strip around the selected date. Days without a
/// fetched entry render as incomplete with no items.
pub fn weekly_overview_impl(
    state: &AppState,
    anchor: Option<String>,
) -> Result<Vec<WeekDayResponse>, InfraError> {
    let anchor = anchor.as_deref().map(parse_date_input).transpose()?;

    let runtime = lock_runtime(state)?;
    let anchor = anchor.unwrap_or(runtime.selected_date);
    Ok(week_dates(anchor)
        .into_iter()
        .map(|date| {
            let day_key = weekday_name(chrono::Datelike::weekday(&date));
            let entry = runtime.weekly_plan.get(day_key);
            WeekDayResponse {
                date: date.to_string(),
                weekday: day_key.to_string(),
                status: entry
                    .map(|entry| entry.status)
                    .unwrap_or(WeeklyStatus::Incomplete)
                    .as_str()
                    .to_string(),
                items: entry.map(|entry| entry.items.clone()).unwrap_or_default(),
            }
        })
        .collect())
}

pub fn select_date_impl(state: &AppState, date: String) -> Result<String, InfraError> {
    let date = parse_date_input(&date)?;
    let mut runtime = lock_runtime(state)?;
    runtime.selected_date = date;
    Ok(date.to_string())
}

pub fn drain_notices_impl(state: &AppState) -> Vec<Notice> {
    state.notices.drain()
}

fn form_response(form: &ScheduleForm) -> ScheduleFormResponse {
    ScheduleFormResponse {
        supplement_name: form.supplement_name.clone(),
        memo: form.memo.clone(),
        intake_time: form.intake_time.as_str().to_string(),
        start_date: form.start_date.to_string(),
        duration_days: form.duration_days,
        custom_duration: form.custom_duration.clone(),
        duration_option: form.duration_option.as_str().to_string(),
        end_date: form.end_date().to_string(),
    }
}

fn event_sync_response(event: &CalendarEvent, synced: bool) -> EventSyncResponse {
    EventSyncResponse {
        event_id: event.id,
        start: event.start.to_rfc3339(),
        end: event.end.to_rfc3339(),
        synced,
    }
}

fn parse_time_of_day_input(value: &str) -> Result<TimeOfDay, InfraError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "morning" => Ok(TimeOfDay::Morning),
        "noon" => Ok(TimeOfDay::Noon),
        "evening" => Ok(TimeOfDay::Evening),
        other => Err(InfraError::InvalidConfig(format!(
            "invalid intake time: {other}"
        ))),
    }
}

fn parse_date_input(value: &str) -> Result<NaiveDate, InfraError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|error| InfraError::InvalidConfig(format!("date must be YYYY-MM-DD: {error}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::EventSyncState;
    use crate::infrastructure::backend_client::{
        SchedulePayload, WireCalendarEvent, WireTodayPlanItem, WireWeeklyPlanEntry,
    };
    use crate::infrastructure::credential_store::InMemoryCredentialStore;
    use crate::infrastructure::notifier::NoticeLevel;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const FIXED_NOW: &str = "2026-08-06T10:00:00Z";

    #[derive(Debug, Clone, Copy)]
    enum FakeCreateResponse {
        Created(Option<i64>),
        ServerError,
    }

    #[derive(Debug, Default)]
    struct FakeBackend {
        create_responses: Mutex<VecDeque<FakeCreateResponse>>,
        last_payload: Mutex<Option<SchedulePayload>>,
        create_calls: AtomicUsize,
        update_calls: AtomicUsize,
        delete_calls: AtomicUsize,
        read_calls: AtomicUsize,
        fail_updates: bool,
        fail_deletes: bool,
        fail_reads: bool,
    }

    impl FakeBackend {
        fn with_create_responses(responses: Vec<FakeCreateResponse>) -> Self {
            Self {
                create_responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ScheduleBackendClient for FakeBackend {
        async fn probe_account_type(&self) -> Result<(), InfraError> {
            Ok(())
        }

        async fn fetch_weekly_plan(
            &self,
        ) -> Result<HashMap<String, WireWeeklyPlanEntry>, InfraError> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(InfraError::Api("http 500".to_string()));
            }
            Ok(HashMap::from([(
                "Thursday".to_string(),
                WireWeeklyPlanEntry {
                    status: Some("done".to_string()),
                    items: vec!["VitaminD".to_string()],
                },
            )]))
        }

        async fn fetch_today_plan(&self) -> Result<Vec<WireTodayPlanItem>, InfraError> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(InfraError::Api("http 500".to_string()));
            }
            Ok(vec![WireTodayPlanItem {
                supplement: "VitaminD".to_string(),
                time: "08:30".to_string(),
                time_of_day: "morning".to_string(),
            }])
        }

        async fn fetch_events(&self) -> Result<Vec<WireCalendarEvent>, InfraError> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(InfraError::Api("http 500".to_string()));
            }
            Ok(vec![WireCalendarEvent {
                id: Some(11),
                title: Some("evening - Magnesium".to_string()),
                start: "2026-08-01T00:00:00Z".to_string(),
                end: "2026-08-30T00:00:00Z".to_string(),
                all_day: true,
            }])
        }

        async fn fetch_supplements(&self) -> Result<Vec<Supplement>, InfraError> {
            self.read_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(InfraError::Api("http 500".to_string()));
            }
            Ok(vec![Supplement {
                id: Some(1),
                name: "VitaminD".to_string(),
                description: None,
            }])
        }

        async fn create_schedule(
            &self,
            payload: &SchedulePayload,
        ) -> Result<Option<i64>, InfraError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_payload.lock().expect("payload lock") = Some(payload.clone());

            let response = self
                .create_responses
                .lock()
                .expect("create response lock")
                .pop_front()
                .unwrap_or(FakeCreateResponse::Created(Some(1)));
            match response {
                FakeCreateResponse::Created(schedule_id) => Ok(schedule_id),
                FakeCreateResponse::ServerError => Err(InfraError::Api("http 500".to_string())),
            }
        }

        async fn update_event(
            &self,
            _event_id: i64,
            _event: &WireCalendarEvent,
        ) -> Result<(), InfraError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_updates {
                return Err(InfraError::Api("http 500".to_string()));
            }
            Ok(())
        }

        async fn delete_event(&self, _event_id: i64) -> Result<(), InfraError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_deletes {
                return Err(InfraError::Api("http 500".to_string()));
            }
            Ok(())
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(FIXED_NOW)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn test_state(backend: Arc<FakeBackend>) -> AppState {
        let scratch = std::env::temp_dir().join(format!("vitadesk-cmd-test-{}", std::process::id()));
        AppState::assemble(
            scratch.join("config"),
            scratch.join("logs"),
            chrono_tz::UTC,
            backend,
            Arc::new(InMemoryCredentialStore::with_token("jwt-abc")),
            Arc::new(fixed_now),
        )
    }

    fn fill_form(state: &AppState, name: &str) {
        update_schedule_form_impl(
            state,
            Some(name.to_string()),
            Some("with food".to_string()),
            None,
            None,
        )
        .expect("fill form");
    }

    #[tokio::test]
    async fn activate_without_token_redirects_to_login_without_fetching() {
        let backend = Arc::new(FakeBackend::default());
        let scratch = std::env::temp_dir().join(format!("vitadesk-cmd-test-{}", std::process::id()));
        let state = AppState::assemble(
            scratch.join("config"),
            scratch.join("logs"),
            chrono_tz::UTC,
            Arc::clone(&backend) as Arc<dyn ScheduleBackendClient>,
            Arc::new(InMemoryCredentialStore::default()),
            Arc::new(fixed_now),
        );

        let response = activate_page_impl(&state).await.expect("activate");
        assert_eq!(response.status, "login_required");
        assert_eq!(backend.read_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn activate_loads_all_resources_and_populates_event_cache() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(Arc::clone(&backend));

        let response = activate_page_impl(&state).await.expect("activate");
        assert_eq!(response.status, "ready");
        assert_eq!(response.weekly_days, 1);
        assert_eq!(response.today_items, 1);
        assert_eq!(response.events, 1);
        assert_eq!(response.supplements, 1);
        // 08:30 is already past the fixed 10:00 clock, so nothing armed.
        assert_eq!(response.reminders_armed, 0);

        let events = list_events_impl(&state).expect("list events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 11);
    }

    #[tokio::test]
    async fn activate_with_failing_reads_degrades_every_resource_to_empty() {
        let backend = Arc::new(FakeBackend {
            fail_reads: true,
            ..FakeBackend::default()
        });
        let state = test_state(Arc::clone(&backend));

        let response = activate_page_impl(&state).await.expect("activate");
        assert_eq!(response.status, "ready");
        assert_eq!(response.weekly_days, 0);
        assert_eq!(response.today_items, 0);
        assert_eq!(response.events, 0);
        assert_eq!(response.supplements, 0);
        assert!(list_events_impl(&state).expect("list events").is_empty());
    }

    #[tokio::test]
    async fn submit_with_empty_name_warns_and_skips_the_network() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(Arc::clone(&backend));

        let response = submit_schedule_impl(&state).await.expect("submit");
        assert_eq!(response.status, "rejected");
        assert_eq!(response.warning.as_deref(), Some("enter supplement name."));
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);

        let notices = drain_notices_impl(&state);
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn submit_with_past_start_date_warns_and_skips_the_network() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(Arc::clone(&backend));
        fill_form(&state, "VitaminD");
        update_schedule_form_impl(&state, None, None, None, Some("2026-08-05".to_string()))
            .expect("set past start date");

        let response = submit_schedule_impl(&state).await.expect("submit");
        assert_eq!(response.status, "rejected");
        assert_eq!(
            response.warning.as_deref(),
            Some("start date must be today or later.")
        );
        assert_eq!(backend.create_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn successful_create_appends_event_and_clears_name_and_memo() {
        let backend = Arc::new(FakeBackend::with_create_responses(vec![
            FakeCreateResponse::Created(Some(7)),
        ]));
        let state = test_state(Arc::clone(&backend));
        fill_form(&state, "VitaminD");
        set_duration_option_impl(&state, "60".to_string()).expect("pick 60 days");

        let response = submit_schedule_impl(&state).await.expect("submit");
        assert_eq!(response.status, "created");
        assert_eq!(response.event_id, Some(7));

        let payload = backend
            .last_payload
            .lock()
            .expect("payload lock")
            .clone()
            .expect("payload sent");
        assert_eq!(payload.supplement_name, "VitaminD");
        assert_eq!(payload.intake_time, "morning");
        assert_eq!(payload.intake_start, "2026-08-06");
        assert_eq!(payload.intake_distance, 60);
        assert_eq!(payload.intake_end, "2026-10-04");

        let events = list_events_impl(&state).expect("list events");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 7);
        assert_eq!(events[0].title, "morning - VitaminD");
        assert!(events[0].all_day);
        assert_eq!(events[0].start.to_rfc3339(), "2026-08-06T00:00:00+00:00");
        assert_eq!(events[0].end.to_rfc3339(), "2026-10-04T00:00:00+00:00");

        let form = schedule_form_impl(&state).expect("form");
        assert!(form.supplement_name.is_empty());
        assert!(form.memo.is_empty());
        assert_eq!(form.intake_time, "morning");
        assert_eq!(form.start_date, "2026-08-06");
        assert_eq!(form.duration_days, 60);

        let notices = drain_notices_impl(&state);
        assert!(notices
            .iter()
            .any(|notice| notice.level == NoticeLevel::Success));
    }

    #[tokio::test]
    async fn successful_create_reconciles_weekly_and_today_plans() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(Arc::clone(&backend));
        fill_form(&state, "VitaminD");

        submit_schedule_impl(&state).await.expect("submit");
        // weekly-plan + today-plan refetched after the create.
        assert_eq!(backend.read_calls.load(Ordering::SeqCst), 2);

        let week = weekly_overview_impl(&state, None).expect("weekly overview");
        let thursday = week
            .iter()
            .find(|day| day.weekday == "Thursday")
            .expect("thursday present");
        assert_eq!(thursday.status, "done");
        assert_eq!(thursday.items, vec!["VitaminD".to_string()]);
    }

    #[tokio::test]
    async fn create_without_schedule_id_falls_back_to_timestamp_id() {
        let backend = Arc::new(FakeBackend::with_create_responses(vec![
            FakeCreateResponse::Created(None),
        ]));
        let state = test_state(Arc::clone(&backend));
        fill_form(&state, "Omega3");

        let response = submit_schedule_impl(&state).await.expect("submit");
        assert_eq!(response.event_id, Some(fixed_now().timestamp_millis()));
    }

    #[tokio::test]
    async fn failed_create_reports_error_and_leaves_form_untouched() {
        let backend = Arc::new(FakeBackend::with_create_responses(vec![
            FakeCreateResponse::ServerError,
        ]));
        let state = test_state(Arc::clone(&backend));
        fill_form(&state, "VitaminD");

        let response = submit_schedule_impl(&state).await.expect("submit");
        assert_eq!(response.status, "failed");
        assert!(list_events_impl(&state).expect("list events").is_empty());

        let form = schedule_form_impl(&state).expect("form");
        assert_eq!(form.supplement_name, "VitaminD");
        assert_eq!(form.memo, "with food");

        let notices = drain_notices_impl(&state);
        assert!(notices
            .iter()
            .any(|notice| notice.level == NoticeLevel::Error));
    }

    #[tokio::test]
    async fn duration_preset_and_custom_commands_mirror_the_form_rules() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(backend);

        let response = set_duration_option_impl(&state, "90".to_string()).expect("preset");
        assert_eq!(response.duration_days, 90);
        assert_eq!(response.custom_duration, "90");

        set_custom_duration_impl(&state, "45".to_string()).expect("custom value");
        let response = set_duration_option_impl(&state, "custom".to_string()).expect("custom");
        assert_eq!(response.duration_days, 45);
        assert_eq!(response.end_date, "2026-09-19");

        set_custom_duration_impl(&state, "abc".to_string()).expect("unparsable value");
        let response = schedule_form_impl(&state).expect("form");
        assert_eq!(response.duration_days, 30);
    }

    #[tokio::test]
    async fn moving_an_event_applies_locally_even_when_backend_refuses() {
        let backend = Arc::new(FakeBackend {
            fail_updates: true,
            ..FakeBackend::default()
        });
        let state = test_state(Arc::clone(&backend));
        activate_page_impl(&state).await.expect("activate");

        let response = move_event_impl(
            &state,
            11,
            "2026-08-03T00:00:00Z".to_string(),
            "2026-09-01T00:00:00Z".to_string(),
        )
        .await
        .expect("move");

        assert!(!response.synced);
        assert_eq!(backend.update_calls.load(Ordering::SeqCst), 1);

        let events = list_events_impl(&state).expect("list events");
        assert_eq!(events[0].start.to_rfc3339(), "2026-08-03T00:00:00+00:00");
        assert_eq!(events[0].sync_state, EventSyncState::OutOfSync);
        assert_eq!(
            list_out_of_sync_events_impl(&state).expect("dirty list").len(),
            1
        );
    }

    #[tokio::test]
    async fn failed_delete_keeps_the_event_and_surfaces_the_failure() {
        let backend = Arc::new(FakeBackend {
            fail_deletes: true,
            ..FakeBackend::default()
        });
        let state = test_state(Arc::clone(&backend));
        activate_page_impl(&state).await.expect("activate");

        assert!(delete_event_impl(&state, 11).await.is_err());
        assert_eq!(backend.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(list_events_impl(&state).expect("list events").len(), 1);
    }

    #[tokio::test]
    async fn successful_delete_removes_the_event_after_backend_confirms() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(Arc::clone(&backend));
        activate_page_impl(&state).await.expect("activate");

        assert!(delete_event_impl(&state, 11).await.expect("delete"));
        assert!(list_events_impl(&state).expect("list events").is_empty());
    }

    #[tokio::test]
    async fn today_overview_groups_items_into_slot_panels() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(backend);
        activate_page_impl(&state).await.expect("activate");

        let panels = today_overview_impl(&state).expect("today overview");
        assert_eq!(panels.len(), 3);
        assert_eq!(panels[0].slot, "morning");
        assert_eq!(panels[0].supplements, vec!["VitaminD".to_string()]);
        assert!(panels[1].supplements.is_empty());
        assert!(panels[2].supplements.is_empty());
    }

    #[tokio::test]
    async fn weekly_overview_fills_missing_days_as_incomplete() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(backend);
        activate_page_impl(&state).await.expect("activate");

        let week = weekly_overview_impl(&state, None).expect("weekly overview");
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].weekday, "Monday");
        assert_eq!(week[0].date, "2026-08-03");
        assert_eq!(week[0].status, "incomplete");
        assert!(week[0].items.is_empty());

        let thursday = &week[3];
        assert_eq!(thursday.weekday, "Thursday");
        assert_eq!(thursday.status, "done");
    }

    #[tokio::test]
    async fn select_date_moves_the_weekly_anchor() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(backend);

        select_date_impl(&state, "2026-08-14".to_string()).expect("select date");
        let week = weekly_overview_impl(&state, None).expect("weekly overview");
        assert_eq!(week[0].date, "2026-08-10");
    }

    #[tokio::test]
    async fn update_form_rejects_unknown_intake_time() {
        let backend = Arc::new(FakeBackend::default());
        let state = test_state(backend);

        let result = update_schedule_form_impl(
            &state,
            None,
            None,
            Some("midnight".to_string()),
            None,
        );
        assert!(result.is_err());
    }
}
