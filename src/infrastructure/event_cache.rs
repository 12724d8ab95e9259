use crate::domain::models::CalendarEvent;
use crate::infrastructure::error::InfraError;
use std::collections::HashMap;
use std::sync::Mutex;

/// Page-local event collection mirrored to the backend. Keyed by event id,
/// which keeps identifiers unique within the local set.
pub trait EventCacheRepository: Send + Sync {
    fn get_by_id(&self, event_id: i64) -> Result<Option<CalendarEvent>, InfraError>;
    fn upsert(&self, event: &CalendarEvent) -> Result<(), InfraError>;
    fn remove(&self, event_id: i64) -> Result<(), InfraError>;
    fn replace_all(&self, events: Vec<CalendarEvent>) -> Result<(), InfraError>;
    fn list_all(&self) -> Result<Vec<CalendarEvent>, InfraError>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventCacheRepository {
    events: Mutex<HashMap<i64, CalendarEvent>>,
}

impl InMemoryEventCacheRepository {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<i64, CalendarEvent>>, InfraError> {
        self.events
            .lock()
            .map_err(|error| InfraError::InvalidConfig(format!("event cache lock poisoned: {error}")))
    }
}

impl EventCacheRepository for InMemoryEventCacheRepository {
    fn get_by_id(&self, event_id: i64) -> Result<Option<CalendarEvent>, InfraError> {
        Ok(self.lock()?.get(&event_id).cloned())
    }

    fn upsert(&self, event: &CalendarEvent) -> Result<(), InfraError> {
        self.lock()?.insert(event.id, event.clone());
        Ok(())
    }

    fn remove(&self, event_id: i64) -> Result<(), InfraError> {
        self.lock()?.remove(&event_id);
        Ok(())
    }

    fn replace_all(&self, events: Vec<CalendarEvent>) -> Result<(), InfraError> {
        let mut guard = self.lock()?;
        guard.clear();
        for event in events {
            guard.insert(event.id, event);
        }
        Ok(())
    }

    fn list_all(&self) -> Result<Vec<CalendarEvent>, InfraError> {
        let mut events: Vec<CalendarEvent> = self.lock()?.values().cloned().collect();
        events.sort_by(|left, right| left.start.cmp(&right.start).then(left.id.cmp(&right.id)));
        Ok(events)
    }
}
