//! Notification sinks. A real email/webhook notifier is an external
//! collaborator; this crate ships only a logging default so the engine
//! never hard-depends on one existing.

use tracing::{error, info, warn};

pub trait Notifier: Send + Sync {
    fn notify_error(&self, title: &str, body: &str);
    fn notify_summary(&self, title: &str, body: &str);
    fn notify_hazard(&self, title: &str, body: &str);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_error(&self, title: &str, body: &str) {
        error!(target: "shuttle::notify", %title, %body, "error notification");
    }

    fn notify_summary(&self, title: &str, body: &str) {
        info!(target: "shuttle::notify", %title, %body, "summary notification");
    }

    fn notify_hazard(&self, title: &str, body: &str) {
        warn!(target: "shuttle::notify", %title, %body, "hazard notification");
    }
}
