use crate::domain::models::{CalendarEvent, EventSyncState, IntakeSchedule};
use crate::infrastructure::backend_client::ScheduleBackendClient;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::event_cache::EventCacheRepository;
use crate::infrastructure::plan_mapper::{encode_calendar_event, event_from_schedule};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Outcome of a move/resize push. The optimistic local write has already
/// happened in both arms; `OutOfSync` records that the backend disagrees
/// until a resync succeeds.
#[derive(Debug)]
pub enum EventSyncOutcome {
    Synced(CalendarEvent),
    OutOfSync { event: CalendarEvent, error: String },
}

/// Mediates drag/resize/delete interactions between the local event set and
/// the backend.
pub struct CalendarBoardService {
    backend: Arc<dyn ScheduleBackendClient>,
    cache: Arc<dyn EventCacheRepository>,
}

impl CalendarBoardService {
    pub fn new(backend: Arc<dyn ScheduleBackendClient>, cache: Arc<dyn EventCacheRepository>) -> Self {
        Self { backend, cache }
    }

    /// The optimistic half of a drag: the local event takes the new range
    /// before any network traffic.
    pub fn apply_local_reschedule(
        &self,
        event_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<CalendarEvent, InfraError> {
        if end < start {
            return Err(InfraError::InvalidConfig(
                "end must not precede start".to_string(),
            ));
        }
        let Some(mut event) = self.cache.get_by_id(event_id)? else {
            return Err(InfraError::InvalidConfig(format!(
                "event not found: {event_id}"
            )));
        };

        event.start = start;
        event.end = end;
        event.sync_state = EventSyncState::Synced;
        self.cache.upsert(&event)?;
        Ok(event)
    }

    pub async fn move_event(
        &self,
        event_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<EventSyncOutcome, InfraError> {
        let event = self.apply_local_reschedule(event_id, start, end)?;
        Ok(self.push_event_update(event).await)
    }

    pub async fn resize_event(
        &self,
        event_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<EventSyncOutcome, InfraError> {
        let event = self.apply_local_reschedule(event_id, start, end)?;
        Ok(self.push_event_update(event).await)
    }

    /// Backend first; the local entry only disappears once the server
    /// confirmed the delete.
    pub async fn delete_event(&self, event_id: i64) -> Result<bool, InfraError> {
        if self.cache.get_by_id(event_id)?.is_none() {
            return Ok(false);
        }
        self.backend.delete_event(event_id).await?;
        self.cache.remove(event_id)?;
        Ok(true)
    }

    /// Re-pushes an out-of-sync event. On success the entry is clean again;
    /// on failure it stays marked and the error propagates.
    pub async fn resync_event(&self, event_id: i64) -> Result<CalendarEvent, InfraError> {
        let Some(mut event) = self.cache.get_by_id(event_id)? else {
            return Err(InfraError::InvalidConfig(format!(
                "event not found: {event_id}"
            )));
        };

        self.backend
            .update_event(event.id, &encode_calendar_event(&event))
            .await?;
        event.sync_state = EventSyncState::Synced;
        self.cache.upsert(&event)?;
        Ok(event)
    }

    pub fn append_created_event(
        &self,
        schedule: &IntakeSchedule,
        event_id: i64,
    ) -> Result<CalendarEvent, InfraError> {
        let event = event_from_schedule(schedule, event_id);
        self.cache.upsert(&event)?;
        Ok(event)
    }

    pub fn list_events(&self) -> Result<Vec<CalendarEvent>, InfraError> {
        self.cache.list_all()
    }

    pub fn list_out_of_sync(&self) -> Result<Vec<CalendarEvent>, InfraError> {
        Ok(self
            .cache
            .list_all()?
            .into_iter()
            .filter(|event| event.sync_state == EventSyncState::OutOfSync)
            .collect())
    }

    async fn push_event_update(&self, mut event: CalendarEvent) -> EventSyncOutcome {
        match self
            .backend
            .update_event(event.id, &encode_calendar_event(&event))
            .await
        {
            Ok(()) => EventSyncOutcome::Synced(event),
            Err(error) => {
                event.sync_state = EventSyncState::OutOfSync;
                let message = error.to_string();
                // The optimistic write already landed; a failed marker write
                // only leaves the event unflagged.
                let _ = self.cache.upsert(&event);
                EventSyncOutcome::OutOfSync {
                    event,
                    error: message,
                }
            }
        }
    }
}
