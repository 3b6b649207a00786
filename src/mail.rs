//! Outbound email as a fire-and-forget collaborator.
//!
//! Handlers hand a message to the mailer and move on; delivery happens on
//! its own task and failures are logged, never surfaced to the request.

use std::sync::{Arc, Mutex};

use tracing::info;

/// A message queued for delivery.
#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Delivery seam. The production impl dispatches asynchronously; tests
/// inject a recording fake.
pub trait Mailer: Send + Sync {
    fn deliver(&self, mail: OutgoingMail);
}

/// Mailer that dispatches on a background task and logs the send.
///
/// Stands in for a real transport; the delivery contract (fire-and-forget,
/// no feedback into the request) is the same one a queue-backed sender
/// would honor.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn deliver(&self, mail: OutgoingMail) {
        tokio::spawn(async move {
            info!(
                recipients = ?mail.recipients,
                subject = %mail.subject,
                "Email dispatched"
            );
        });
    }
}

/// Mailer that records messages for assertions instead of sending.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().expect("mailer lock poisoned").clone()
    }
}

impl Mailer for RecordingMailer {
    fn deliver(&self, mail: OutgoingMail) {
        self.sent.lock().expect("mailer lock poisoned").push(mail);
    }
}
