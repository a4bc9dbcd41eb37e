use chrono::NaiveDate;
use incubator_admin::notifications::{MailError, MailTransport, OutboundEmail};
use incubator_admin::workflows::timeline::{
    RepositoryError, TimelineEvent, TimelineEventFilter, TimelineEventId, TimelineEventRepository,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local stand-in for the record store. Writes replace the whole
/// record under one lock; versions are checked only when the caller asks.
#[derive(Default, Clone)]
pub(crate) struct InMemoryTimelineEventRepository {
    records: Arc<Mutex<HashMap<TimelineEventId, TimelineEvent>>>,
}

impl InMemoryTimelineEventRepository {
    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<TimelineEventId, TimelineEvent>>, RepositoryError>
    {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl TimelineEventRepository for InMemoryTimelineEventRepository {
    fn insert(&self, event: TimelineEvent) -> Result<TimelineEvent, RepositoryError> {
        let mut guard = self.lock()?;
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
        let mut guard = self.lock()?;
        let current_version = guard
            .get(&event.id)
            .map(|stored| stored.version)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(expected) = expected_version {
            if expected != current_version {
                return Err(RepositoryError::VersionMismatch {
                    expected,
                    actual: current_version,
                });
            }
        }

        event.version = current_version + 1;
        guard.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    fn fetch(&self, id: &TimelineEventId) -> Result<Option<TimelineEvent>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }

    fn list(&self, filter: &TimelineEventFilter) -> Result<Vec<TimelineEvent>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .values()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect())
    }
}

/// Writes outbound mail to the log instead of a relay.
#[derive(Default, Clone)]
pub(crate) struct LoggingMailTransport;

impl MailTransport for LoggingMailTransport {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        info!(
            to = ?email.to,
            reply_to = ?email.reply_to,
            subject = %email.subject,
            template = %email.template,
            "outbound email"
        );
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryMailTransport {
    outbox: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MailTransport for InMemoryMailTransport {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let mut guard = self
            .outbox
            .lock()
            .map_err(|_| MailError::Transport("outbox mutex poisoned".to_string()))?;
        guard.push(email);
        Ok(())
    }
}

impl InMemoryMailTransport {
    pub(crate) fn outbox(&self) -> Vec<OutboundEmail> {
        self.outbox
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
