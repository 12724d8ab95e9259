pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::commands::{
    activate_page_impl, arm_reminders_impl, delete_event_impl, drain_notices_impl,
    list_events_impl, list_out_of_sync_events_impl, move_event_impl, refresh_plans_impl,
    resize_event_impl, resync_event_impl, schedule_form_impl, select_date_impl,
    set_custom_duration_impl, set_duration_option_impl, submit_schedule_impl,
    today_overview_impl, update_schedule_form_impl, weekly_overview_impl, AppState,
};
pub use application::schedule_form::{DurationOption, FormWarning, ScheduleForm};
pub use domain::models::{
    CalendarEvent, EventSyncState, IntakeSchedule, Supplement, TimeOfDay, TodayPlanItem,
    WeeklyPlanEntry, WeeklyStatus,
};
pub use infrastructure::error::InfraError;
pub use infrastructure::notifier::{Notice, NoticeLevel};
