use crate::domain::models::TodayPlanItem;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notifier::{InMemoryNotificationCenter, Notice};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const MAX_LEAD_HOURS: i64 = 24;

/// Absolute instant of an alert time on `date` in the configured zone.
/// DST folds resolve to the earlier instant; a gap yields nothing to arm.
pub fn alert_instant(date: NaiveDate, alert_time: NaiveTime, timezone: Tz) -> Option<DateTime<Utc>> {
    timezone
        .from_local_datetime(&date.and_time(alert_time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

/// Delay until `instant`, provided it is strictly in the future and less
/// than 24 hours away.
pub fn fire_delay(instant: DateTime<Utc>, now: DateTime<Utc>) -> Option<std::time::Duration> {
    let lead = instant - now;
    if lead <= Duration::zero() || lead >= Duration::hours(MAX_LEAD_HOURS) {
        return None;
    }
    lead.to_std().ok()
}

/// Arms one-shot reminder timers for today's plan. Each armed timer keeps an
/// abort handle keyed by plan-item identity, and every re-arm cancels the
/// previous set so a superseded plan cannot fire stale reminders.
pub struct ReminderScheduler {
    notices: Arc<InMemoryNotificationCenter>,
    timezone: Tz,
    now_provider: NowProvider,
    handles: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn new(notices: Arc<InMemoryNotificationCenter>, timezone: Tz) -> Self {
        Self {
            notices,
            timezone,
            now_provider: Arc::new(Utc::now),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    pub fn arm(&self, plan: &[TodayPlanItem]) -> Result<usize, InfraError> {
        self.disarm_all()?;

        let now = (self.now_provider)();
        let today = now.with_timezone(&self.timezone).date_naive();
        let mut handles = self.lock_handles()?;
        let mut armed = 0;

        for item in plan {
            let Some(instant) = alert_instant(today, item.alert_time, self.timezone) else {
                continue;
            };
            let Some(delay) = fire_delay(instant, now) else {
                continue;
            };

            let notices = Arc::clone(&self.notices);
            let supplement = item.supplement.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                notices.push(Notice::reminder(&supplement));
            });

            let key = format!("{}@{}", item.supplement, item.slot.as_str());
            if let Some(previous) = handles.insert(key, handle) {
                previous.abort();
            }
            armed += 1;
        }

        Ok(armed)
    }

    pub fn disarm_all(&self) -> Result<(), InfraError> {
        let mut handles = self.lock_handles()?;
        for (_, handle) in handles.drain() {
            handle.abort();
        }
        Ok(())
    }

    pub fn armed_count(&self) -> usize {
        self.handles.lock().map(|handles| handles.len()).unwrap_or(0)
    }

    fn lock_handles(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, JoinHandle<()>>>, InfraError> {
        self.handles
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("reminder lock poisoned: {error}")))
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        let _ = self.disarm_all();
    }
}
