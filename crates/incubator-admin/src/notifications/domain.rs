use serde::{Deserialize, Serialize};

use crate::workflows::timeline::{StartupId, TimelineEvent};

/// Founder contact used as an email recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Founder {
    pub fullname: String,
    pub email: String,
}

impl Founder {
    /// Mailbox in `Full Name <address>` form.
    pub fn mailbox(&self) -> String {
        format!("{} <{}>", self.fullname, self.email)
    }
}

/// Slice of a startup record needed to address notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupContact {
    pub id: StartupId,
    pub product_name: String,
    #[serde(default)]
    pub name: Option<String>,
    pub founders: Vec<Founder>,
}

impl StartupContact {
    /// Product name followed by the legal name in parentheses when one is set.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("{} ({})", self.product_name, name),
            _ => self.product_name.clone(),
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.founders.iter().map(Founder::mailbox).collect()
    }
}

/// Admin user acting as the sender of feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub email: String,
}

/// Feedback recorded by the incubation team for a startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupFeedback {
    pub id: String,
    pub feedback: String,
    #[serde(default)]
    pub reference_url: Option<String>,
}

impl StartupFeedback {
    /// True when `reference_url` points at the event's anchor on its
    /// startup's profile page, whatever the public host.
    pub fn references_timeline_event(&self, event: &TimelineEvent) -> bool {
        let suffix = format!("/startups/{}#event-{}", event.startup_id.0, event.id.0);
        self.reference_url
            .as_deref()
            .is_some_and(|url| url.ends_with(&suffix))
    }
}

/// Previous feedback left on `event`, in the order given.
pub fn feedback_for_timeline_event<'a>(
    feedback: &'a [StartupFeedback],
    event: &TimelineEvent,
) -> Vec<&'a StartupFeedback> {
    feedback
        .iter()
        .filter(|entry| entry.references_timeline_event(event))
        .collect()
}

/// Business events that trigger a founder email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartupNotification {
    AgreementExpiringSoon {
        expires_in_days: u32,
        renew_within_days: u32,
    },
    StartupApproved,
    StartupRejected,
    ProfileIncomplete,
    InfoIncomplete,
    Feedback {
        feedback: StartupFeedback,
        sender: AdminUser,
    },
}

impl StartupNotification {
    pub const fn subject(&self) -> &'static str {
        match self {
            Self::AgreementExpiringSoon { .. } => {
                "Reminder to renew your incubation agreement with Startup Village"
            }
            Self::StartupApproved => "You are now part of Startup Village!",
            Self::StartupRejected => "Incubation Request update.",
            Self::ProfileIncomplete => "Reminder to complete your startup profile",
            Self::InfoIncomplete => {
                "Reminder to complete incubation application to Startup Village."
            }
            Self::Feedback { .. } => "Feedback from Team SV.",
        }
    }

    /// Template identifier handed to the rendering collaborator.
    pub const fn template(&self) -> &'static str {
        match self {
            Self::AgreementExpiringSoon { .. } => "agreement_expiring_soon",
            Self::StartupApproved => "startup_approved",
            Self::StartupRejected => "startup_rejected",
            Self::ProfileIncomplete => "reminder_to_complete_startup_profile",
            Self::InfoIncomplete => "reminder_to_complete_startup_info",
            Self::Feedback { .. } => "feedback_as_email",
        }
    }

    pub fn reply_to(&self) -> Option<&str> {
        match self {
            Self::Feedback { sender, .. } => Some(sender.email.as_str()),
            _ => None,
        }
    }
}
