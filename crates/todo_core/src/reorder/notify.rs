//! User-visible feedback channel for reorder outcomes.

use log::{info, warn};
use parking_lot::Mutex;

/// Toast-style notification sink.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, text: &str);
    fn notify_failure(&self, text: &str);
}

/// Writes notifications to the core log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_success(&self, text: &str) {
        info!("event=reorder_notify module=reorder status=ok message={text}");
    }

    fn notify_failure(&self, text: &str) {
        warn!("event=reorder_notify module=reorder status=error message={text}");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Success(String),
    Failure(String),
}

/// Keeps every notification in memory, oldest first.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, text: &str) {
        self.entries
            .lock()
            .push(Notification::Success(text.to_string()));
    }

    fn notify_failure(&self, text: &str) {
        self.entries
            .lock()
            .push(Notification::Failure(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::{LogNotifier, Notification, Notifier, RecordingNotifier};

    #[test]
    fn recording_notifier_keeps_arrival_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify_success("saved");
        notifier.notify_failure("rejected");

        assert_eq!(
            notifier.notifications(),
            vec![
                Notification::Success("saved".to_string()),
                Notification::Failure("rejected".to_string())
            ]
        );
    }

    #[test]
    fn log_notifier_accepts_both_outcomes_without_logger() {
        let notifier: &dyn Notifier = &LogNotifier;
        notifier.notify_success("saved");
        notifier.notify_failure("rejected");
    }
}
