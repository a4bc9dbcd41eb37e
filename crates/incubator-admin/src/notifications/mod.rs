//! Founder-facing emails triggered by startup lifecycle events.
//!
//! Recipients are derived from the startup's founders; rendering and the
//! actual transport sit behind [`MailTransport`].

pub mod domain;
pub mod mailer;
pub mod router;

#[cfg(test)]
mod tests;

pub use domain::{
    feedback_for_timeline_event, AdminUser, Founder, StartupContact, StartupFeedback,
    StartupNotification,
};
pub use mailer::{MailError, MailTransport, OutboundEmail, StartupMailer};
pub use router::notification_router;
