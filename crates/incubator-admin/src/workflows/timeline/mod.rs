//! Timeline event verification and link management.
//!
//! A timeline event moves freely between `pending`, `verified` and
//! `needs_improvement`, and carries an ordered list of links addressed by
//! position or by stable id. The service persists every change as one
//! full-record write.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    LinkDraft, LinkEntry, LinkError, LinkId, LinkLocator, NewTimelineEvent, StartupId,
    TimelineEvent, TimelineEventId, Verification, VerificationStatus,
};
pub use repository::{
    verified_status_label, RepositoryError, TimelineEventFilter, TimelineEventRepository,
    TimelineEventView,
};
pub use router::timeline_router;
pub use service::{TimelineEventService, TimelineServiceError};
