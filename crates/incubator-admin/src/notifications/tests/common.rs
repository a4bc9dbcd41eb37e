use std::sync::{Arc, Mutex};

use crate::notifications::domain::{Founder, StartupContact};
use crate::notifications::mailer::{MailError, MailTransport, OutboundEmail, StartupMailer};
use crate::workflows::timeline::StartupId;

pub(super) const FROM: &str = "Startup Village <no-reply@startupvillage.in>";

pub(super) fn startup() -> StartupContact {
    StartupContact {
        id: StartupId("acme".to_string()),
        product_name: "Rocket Boots".to_string(),
        name: Some("Acme Labs".to_string()),
        founders: vec![
            Founder {
                fullname: "Asha Menon".to_string(),
                email: "asha@acme.test".to_string(),
            },
            Founder {
                fullname: "Vivek Rao".to_string(),
                email: "vivek@acme.test".to_string(),
            },
        ],
    }
}

pub(super) fn build_mailer() -> (StartupMailer<MemoryTransport>, Arc<MemoryTransport>) {
    let transport = Arc::new(MemoryTransport::default());
    (StartupMailer::new(transport.clone(), FROM), transport)
}

#[derive(Default, Clone)]
pub(super) struct MemoryTransport {
    sent: Arc<Mutex<Vec<OutboundEmail>>>,
}

impl MemoryTransport {
    pub(super) fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }
}

impl MailTransport for MemoryTransport {
    fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(email);
        Ok(())
    }
}

pub(super) struct OfflineTransport;

impl MailTransport for OfflineTransport {
    fn send(&self, _email: OutboundEmail) -> Result<(), MailError> {
        Err(MailError::Transport("smtp relay offline".to_string()))
    }
}
