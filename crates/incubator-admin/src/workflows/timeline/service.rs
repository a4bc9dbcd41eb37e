use std::cmp::Reverse;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::domain::{
    LinkDraft, LinkEntry, LinkError, LinkLocator, NewTimelineEvent, TimelineEvent,
    TimelineEventId,
};
use super::repository::{RepositoryError, TimelineEventFilter, TimelineEventRepository};

/// Service applying verification transitions and link edits to stored events.
///
/// Every mutation loads the record, changes an in-memory copy and, only if that
/// succeeded, writes the full record back in a single `update`. Nothing here
/// serializes concurrent editors of the same event; pass `expected_version`
/// to have the repository reject stale writes instead of overwriting them.
pub struct TimelineEventService<R> {
    repository: Arc<R>,
}

static TIMELINE_EVENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_timeline_event_id() -> TimelineEventId {
    let id = TIMELINE_EVENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    TimelineEventId(format!("te-{id:06}"))
}

impl<R> TimelineEventService<R>
where
    R: TimelineEventRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Register a pending event with no links.
    pub fn create(&self, input: NewTimelineEvent) -> Result<TimelineEvent, TimelineServiceError> {
        let event = TimelineEvent::new(next_timeline_event_id(), input, Utc::now());
        let stored = self.repository.insert(event)?;
        info!(event_id = %stored.id.0, startup_id = %stored.startup_id.0, "timeline event created");
        Ok(stored)
    }

    pub fn get(&self, id: &TimelineEventId) -> Result<TimelineEvent, TimelineServiceError> {
        let event = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(event)
    }

    /// Events matching `filter`, most recently updated first.
    pub fn list(
        &self,
        filter: &TimelineEventFilter,
    ) -> Result<Vec<TimelineEvent>, TimelineServiceError> {
        let mut events = self.repository.list(filter)?;
        events.sort_by_key(|event| Reverse(event.updated_at));
        Ok(events)
    }

    pub fn verify(
        &self,
        id: &TimelineEventId,
        expected_version: Option<u64>,
    ) -> Result<TimelineEvent, TimelineServiceError> {
        let (stored, ()) = self.modify(id, expected_version, |event| {
            event.verify(Utc::now());
            Ok(())
        })?;
        info!(event_id = %id.0, verified_at = ?stored.verified_at(), "timeline event verified");
        Ok(stored)
    }

    pub fn unverify(
        &self,
        id: &TimelineEventId,
        expected_version: Option<u64>,
    ) -> Result<TimelineEvent, TimelineServiceError> {
        let (stored, ()) = self.modify(id, expected_version, |event| {
            event.unverify();
            Ok(())
        })?;
        info!(event_id = %id.0, "timeline event returned to pending");
        Ok(stored)
    }

    pub fn mark_needs_improvement(
        &self,
        id: &TimelineEventId,
        expected_version: Option<u64>,
    ) -> Result<TimelineEvent, TimelineServiceError> {
        let (stored, ()) = self.modify(id, expected_version, |event| {
            event.mark_needs_improvement();
            Ok(())
        })?;
        info!(event_id = %id.0, "timeline event marked as needing improvement");
        Ok(stored)
    }

    pub fn add_link(
        &self,
        id: &TimelineEventId,
        expected_version: Option<u64>,
        draft: LinkDraft,
    ) -> Result<TimelineEvent, TimelineServiceError> {
        let (stored, link_id) = self.modify(id, expected_version, |event| {
            Ok(event.add_link(draft).id)
        })?;
        info!(event_id = %id.0, %link_id, links = stored.links.len(), "link added");
        Ok(stored)
    }

    pub fn edit_link(
        &self,
        id: &TimelineEventId,
        expected_version: Option<u64>,
        locator: LinkLocator,
        draft: LinkDraft,
    ) -> Result<TimelineEvent, TimelineServiceError> {
        let (stored, link_id) = self.modify(id, expected_version, |event| {
            event.edit_link(locator, draft).map(|link| link.id)
        })?;
        info!(event_id = %id.0, %link_id, ?locator, "link updated");
        Ok(stored)
    }

    /// Remove a link, returning the updated event and the removed entry.
    pub fn delete_link(
        &self,
        id: &TimelineEventId,
        expected_version: Option<u64>,
        locator: LinkLocator,
    ) -> Result<(TimelineEvent, LinkEntry), TimelineServiceError> {
        let (stored, removed) =
            self.modify(id, expected_version, |event| event.delete_link(locator))?;
        info!(event_id = %id.0, link_id = %removed.id, "link deleted");
        Ok((stored, removed))
    }

    fn modify<T, F>(
        &self,
        id: &TimelineEventId,
        expected_version: Option<u64>,
        mutate: F,
    ) -> Result<(TimelineEvent, T), TimelineServiceError>
    where
        F: FnOnce(&mut TimelineEvent) -> Result<T, LinkError>,
    {
        let mut event = self.get(id)?;
        let outcome = mutate(&mut event)?;
        event.updated_at = Utc::now();
        let stored = self.repository.update(event, expected_version)?;
        debug!(event_id = %stored.id.0, version = stored.version, "timeline event saved");
        Ok((stored, outcome))
    }
}

/// Error raised by the timeline event service.
#[derive(Debug, thiserror::Error)]
pub enum TimelineServiceError {
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
