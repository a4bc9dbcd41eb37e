use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::domain::{LinkEntry, StartupId, TimelineEvent, TimelineEventId, VerificationStatus};

/// Storage abstraction so the service module can be exercised in isolation.
///
/// `update` persists the whole record in one write. When `expected_version`
/// is provided the implementation must reject the write if the stored
/// version differs; otherwise the last writer wins. Implementations assign
/// the next version on success and return the stored record.
pub trait TimelineEventRepository: Send + Sync {
    fn insert(&self, event: TimelineEvent) -> Result<TimelineEvent, RepositoryError>;
    fn update(
        &self,
        event: TimelineEvent,
        expected_version: Option<u64>,
    ) -> Result<TimelineEvent, RepositoryError>;
    fn fetch(&self, id: &TimelineEventId) -> Result<Option<TimelineEvent>, RepositoryError>;
    fn list(&self, filter: &TimelineEventFilter) -> Result<Vec<TimelineEvent>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record was modified concurrently (expected version {expected}, found {actual})")]
    VersionMismatch { expected: u64, actual: u64 },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Narrowing applied by the admin index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineEventFilter {
    pub startup_id: Option<StartupId>,
    pub status: Option<VerificationStatus>,
}

impl TimelineEventFilter {
    pub fn matches(&self, event: &TimelineEvent) -> bool {
        let startup_matches = self
            .startup_id
            .as_ref()
            .map_or(true, |startup_id| &event.startup_id == startup_id);
        let status_matches = self
            .status
            .map_or(true, |status| event.verification_status() == status);
        startup_matches && status_matches
    }
}

/// Read-only projection handed to the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineEventView {
    pub id: TimelineEventId,
    pub startup_id: StartupId,
    pub event_type: String,
    pub description: String,
    pub event_on: NaiveDate,
    pub verification_status: VerificationStatus,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_status: String,
    pub anchor: String,
    pub links: Vec<LinkEntry>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl TimelineEventView {
    pub fn from_event(event: &TimelineEvent) -> Self {
        Self {
            id: event.id.clone(),
            startup_id: event.startup_id.clone(),
            event_type: event.event_type.clone(),
            description: event.description.clone(),
            event_on: event.event_on,
            verification_status: event.verification_status(),
            verified_at: event.verified_at(),
            verified_status: verified_status_label(event),
            anchor: format!("event-{}", event.id.0),
            links: event.links.clone(),
            version: event.version,
            updated_at: event.updated_at,
        }
    }
}

/// Human label shown in the admin index, e.g. "Verified on 17/10/26".
pub fn verified_status_label(event: &TimelineEvent) -> String {
    match event.verified_at() {
        Some(verified_at) => format!("Verified on {}", verified_at.format("%d/%m/%y")),
        None => event.verification_status().label().to_string(),
    }
}
