use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for timeline events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineEventId(pub String);

/// Reference to the startup that owns a timeline event. Lookup only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StartupId(pub String);

/// Stable identifier assigned to a link when it is first attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Review outcome without any attached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Verified,
    NeedsImprovement,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Verified => "Verified",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}

/// Review outcome of a timeline event.
///
/// Only the `Verified` variant carries a timestamp, so an event can never be
/// verified without `verified_at` or hold a stale `verified_at` after being
/// moved back to another state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verification_status", rename_all = "snake_case")]
pub enum Verification {
    Pending,
    Verified { verified_at: DateTime<Utc> },
    NeedsImprovement,
}

impl Verification {
    pub const fn status(&self) -> VerificationStatus {
        match self {
            Self::Pending => VerificationStatus::Pending,
            Self::Verified { .. } => VerificationStatus::Verified,
            Self::NeedsImprovement => VerificationStatus::NeedsImprovement,
        }
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Verified { verified_at } => Some(*verified_at),
            _ => None,
        }
    }
}

/// Fields supplied by an editor when adding or replacing a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDraft {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub private: bool,
}

impl LinkDraft {
    pub fn new(title: impl Into<String>, url: impl Into<String>, private: bool) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            private,
        }
    }
}

/// Titled URL attached to a timeline event. `private` is consumed by the
/// presentation layer only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
    pub id: LinkId,
    pub title: String,
    pub url: String,
    pub private: bool,
}

impl LinkEntry {
    fn from_draft(id: LinkId, draft: LinkDraft) -> Self {
        let LinkDraft {
            title,
            url,
            private,
        } = draft;
        Self {
            id,
            title,
            url,
            private,
        }
    }
}

/// How an editor points at an existing link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLocator {
    /// Position in the ordered sequence. Signed so that negative input from
    /// the boundary is rejected as out of range rather than wrapped.
    Index(i64),
    Id(LinkId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("link index {index} is out of range for {len} link(s)")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("link {0} does not exist on this timeline event")]
    UnknownLink(LinkId),
}

/// Input for registering a new timeline event against a startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimelineEvent {
    pub startup_id: StartupId,
    pub event_type: String,
    #[serde(default)]
    pub description: String,
    pub event_on: NaiveDate,
}

/// Dated milestone on a startup's profile, subject to admin verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: TimelineEventId,
    pub startup_id: StartupId,
    pub event_type: String,
    pub description: String,
    pub event_on: NaiveDate,
    #[serde(flatten)]
    pub verification: Verification,
    pub links: Vec<LinkEntry>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl TimelineEvent {
    /// Builds a pending event with no links.
    pub fn new(id: TimelineEventId, input: NewTimelineEvent, now: DateTime<Utc>) -> Self {
        let NewTimelineEvent {
            startup_id,
            event_type,
            description,
            event_on,
        } = input;

        Self {
            id,
            startup_id,
            event_type,
            description,
            event_on,
            verification: Verification::Pending,
            links: Vec::new(),
            version: 0,
            updated_at: now,
        }
    }

    pub fn verification_status(&self) -> VerificationStatus {
        self.verification.status()
    }

    pub fn verified_at(&self) -> Option<DateTime<Utc>> {
        self.verification.verified_at()
    }

    /// Moves to `verified` from any state. Repeating the call refreshes the timestamp.
    pub fn verify(&mut self, at: DateTime<Utc>) {
        self.verification = Verification::Verified { verified_at: at };
    }

    pub fn unverify(&mut self) {
        self.verification = Verification::Pending;
    }

    pub fn mark_needs_improvement(&mut self) {
        self.verification = Verification::NeedsImprovement;
    }

    /// Appends a link and returns the stored entry.
    pub fn add_link(&mut self, draft: LinkDraft) -> &LinkEntry {
        let index = self.links.len();
        self.links.push(LinkEntry::from_draft(LinkId::generate(), draft));
        &self.links[index]
    }

    /// Replaces the link at `locator`, keeping its identifier.
    pub fn edit_link(
        &mut self,
        locator: LinkLocator,
        draft: LinkDraft,
    ) -> Result<&LinkEntry, LinkError> {
        let index = self.resolve(locator)?;
        let id = self.links[index].id;
        self.links[index] = LinkEntry::from_draft(id, draft);
        Ok(&self.links[index])
    }

    /// Removes the link at `locator`; later links shift one position left.
    pub fn delete_link(&mut self, locator: LinkLocator) -> Result<LinkEntry, LinkError> {
        let index = self.resolve(locator)?;
        Ok(self.links.remove(index))
    }

    fn resolve(&self, locator: LinkLocator) -> Result<usize, LinkError> {
        let len = self.links.len();
        match locator {
            LinkLocator::Index(index) => usize::try_from(index)
                .ok()
                .filter(|position| *position < len)
                .ok_or(LinkError::IndexOutOfRange { index, len }),
            LinkLocator::Id(id) => self
                .links
                .iter()
                .position(|link| link.id == id)
                .ok_or(LinkError::UnknownLink(id)),
        }
    }
}
