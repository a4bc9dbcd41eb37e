use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::timeline::domain::{
    LinkDraft, NewTimelineEvent, StartupId, TimelineEvent, TimelineEventId,
};
use crate::workflows::timeline::repository::{
    RepositoryError, TimelineEventFilter, TimelineEventRepository,
};
use crate::workflows::timeline::{timeline_router, TimelineEventService};

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 17, 9, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn new_event_input(startup: &str) -> NewTimelineEvent {
    NewTimelineEvent {
        startup_id: StartupId(startup.to_string()),
        event_type: "Prototype Launched".to_string(),
        description: "Shipped the first hardware prototype to pilot customers.".to_string(),
        event_on: NaiveDate::from_ymd_opt(2025, 9, 30).expect("valid date"),
    }
}

pub(super) fn pending_event() -> TimelineEvent {
    TimelineEvent::new(
        TimelineEventId("te-test".to_string()),
        new_event_input("acme"),
        fixed_now(),
    )
}

pub(super) fn docs_link() -> LinkDraft {
    LinkDraft::new("Docs", "http://a", false)
}

pub(super) fn deck_link() -> LinkDraft {
    LinkDraft::new("Deck", "http://b", true)
}

pub(super) fn event_with_links(drafts: &[LinkDraft]) -> TimelineEvent {
    let mut event = pending_event();
    for draft in drafts {
        event.add_link(draft.clone());
    }
    event
}

pub(super) fn build_service() -> (TimelineEventService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = TimelineEventService::new(repository.clone());
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<TimelineEventId, TimelineEvent>>>,
    pub(super) writes: Arc<Mutex<usize>>,
}

impl MemoryRepository {
    pub(super) fn stored(&self, id: &TimelineEventId) -> TimelineEvent {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("record stored")
    }

    pub(super) fn write_count(&self) -> usize {
        *self.writes.lock().expect("write counter poisoned")
    }
}

impl TimelineEventRepository for MemoryRepository {
    fn insert(&self, event: TimelineEvent) -> Result<TimelineEvent, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&event.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    fn update(
        &self,
        mut event: TimelineEvent,
        expected_version: Option<u64>,
    ) -> Result<TimelineEvent, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        let current = guard.get(&event.id).ok_or(RepositoryError::NotFound)?;
        if let Some(expected) = expected_version {
            if current.version != expected {
                return Err(RepositoryError::VersionMismatch {
                    expected,
                    actual: current.version,
                });
            }
        }
        event.version = current.version + 1;
        guard.insert(event.id.clone(), event.clone());
        *self.writes.lock().expect("write counter poisoned") += 1;
        Ok(event)
    }

    fn fetch(&self, id: &TimelineEventId) -> Result<Option<TimelineEvent>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self, filter: &TimelineEventFilter) -> Result<Vec<TimelineEvent>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }
}

/// Serves reads from a fixed record but refuses every write.
pub(super) struct ReadOnlyRepository {
    pub(super) event: TimelineEvent,
}

impl TimelineEventRepository for ReadOnlyRepository {
    fn insert(&self, _event: TimelineEvent) -> Result<TimelineEvent, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn update(
        &self,
        _event: TimelineEvent,
        _expected_version: Option<u64>,
    ) -> Result<TimelineEvent, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn fetch(&self, id: &TimelineEventId) -> Result<Option<TimelineEvent>, RepositoryError> {
        Ok((id == &self.event.id).then(|| self.event.clone()))
    }

    fn list(&self, _filter: &TimelineEventFilter) -> Result<Vec<TimelineEvent>, RepositoryError> {
        Ok(vec![self.event.clone()])
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: TimelineEventService<MemoryRepository>) -> axum::Router {
    timeline_router(Arc::new(service))
}
