use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{StartupContact, StartupNotification};

/// Fully addressed message ready for a transport. Body rendering happens
/// downstream from `template` and `variables`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    pub subject: String,
    pub template: String,
    pub variables: BTreeMap<String, String>,
}

/// Trait describing the outbound mail hook (SMTP relay, API, log sink).
pub trait MailTransport: Send + Sync {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("startup {0} has no founders to notify")]
    NoRecipients(String),
    #[error("mail transport unavailable: {0}")]
    Transport(String),
}

/// Builds founder emails for startup-level business events.
pub struct StartupMailer<T> {
    transport: Arc<T>,
    from: String,
}

impl<T> StartupMailer<T>
where
    T: MailTransport + 'static,
{
    pub fn new(transport: Arc<T>, from: impl Into<String>) -> Self {
        Self {
            transport,
            from: from.into(),
        }
    }

    /// Address `notification` to every founder of `startup` and dispatch it once.
    pub fn deliver(
        &self,
        startup: &StartupContact,
        notification: &StartupNotification,
    ) -> Result<OutboundEmail, MailError> {
        let email = self.compose(startup, notification)?;
        if let Err(error) = self.transport.send(email.clone()) {
            warn!(startup_id = %startup.id.0, template = %email.template, %error, "mail dispatch failed");
            return Err(error);
        }

        info!(
            startup_id = %startup.id.0,
            template = %email.template,
            recipients = email.to.len(),
            "startup notification sent"
        );
        Ok(email)
    }

    pub fn compose(
        &self,
        startup: &StartupContact,
        notification: &StartupNotification,
    ) -> Result<OutboundEmail, MailError> {
        let to = startup.recipients();
        if to.is_empty() {
            return Err(MailError::NoRecipients(startup.id.0.clone()));
        }

        Ok(OutboundEmail {
            from: self.from.clone(),
            to,
            reply_to: notification.reply_to().map(str::to_string),
            subject: notification.subject().to_string(),
            template: notification.template().to_string(),
            variables: template_variables(startup, notification),
        })
    }
}

fn template_variables(
    startup: &StartupContact,
    notification: &StartupNotification,
) -> BTreeMap<String, String> {
    let mut variables = BTreeMap::new();
    variables.insert("startup_id".to_string(), startup.id.0.clone());
    variables.insert("startup_name".to_string(), startup.display_name());

    match notification {
        StartupNotification::AgreementExpiringSoon {
            expires_in_days,
            renew_within_days,
        } => {
            variables.insert("expires_in".to_string(), expires_in_days.to_string());
            variables.insert("renew_within".to_string(), renew_within_days.to_string());
        }
        StartupNotification::Feedback { feedback, sender } => {
            variables.insert("feedback_id".to_string(), feedback.id.clone());
            variables.insert("feedback".to_string(), feedback.feedback.clone());
            if let Some(reference_url) = &feedback.reference_url {
                variables.insert("reference_url".to_string(), reference_url.clone());
            }
            variables.insert("sent_by".to_string(), sender.email.clone());
        }
        StartupNotification::StartupApproved
        | StartupNotification::StartupRejected
        | StartupNotification::ProfileIncomplete
        | StartupNotification::InfoIncomplete => {}
    }

    variables
}
