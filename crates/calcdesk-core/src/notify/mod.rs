//! Success and error alerts with timed auto-hide.
//!
//! Presentation is behind the `AlertSink` capability; `Notifier` decides
//! when alerts appear and disappear. Each alert kind has at most one pending
//! hide timer, and showing an alert cancels the previous timer for that kind,
//! so an older alert's timer never hides a newer message. Error and success
//! alerts are independent and may be visible together.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::DEFAULT_ALERT_TIMEOUT_SECS;

/// Length of the fade transition between `fade` and `hide`.
pub const FADE_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Error,
    Success,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Error => f.pad("error"),
            AlertKind::Success => f.pad("success"),
        }
    }
}

/// Somewhere alerts can be displayed.
pub trait AlertSink: Send + Sync {
    /// Set the message for `kind` and make it visible.
    fn show(&self, kind: AlertKind, message: &str);

    /// Start the fade-out transition. Sinks without transitions ignore this.
    fn fade(&self, _kind: AlertKind) {}

    /// Hide the alert for `kind`.
    fn hide(&self, kind: AlertKind);
}

#[derive(Clone)]
pub struct Notifier {
    sink: Option<Arc<dyn AlertSink>>,
    timeout: Duration,
    pending: Arc<Mutex<HashMap<AlertKind, JoinHandle<()>>>>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self {
            sink: Some(sink),
            timeout: Duration::from_secs(DEFAULT_ALERT_TIMEOUT_SECS),
            pending: Arc::default(),
        }
    }

    /// A notifier with nowhere to display; every call is a no-op.
    pub fn detached() -> Self {
        Self {
            sink: None,
            timeout: Duration::from_secs(DEFAULT_ALERT_TIMEOUT_SECS),
            pending: Arc::default(),
        }
    }

    /// How long an alert stays up before fading.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Show `message` and schedule it to fade and hide after the timeout.
    pub fn show_alert(&self, kind: AlertKind, message: &str) {
        let Some(sink) = &self.sink else {
            debug!(%kind, "No alert sink attached, dropping alert");
            return;
        };

        self.cancel_pending(kind);
        sink.show(kind, message);

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(%kind, "No async runtime, alert will not auto-hide");
            return;
        };

        let sink = Arc::clone(sink);
        let timeout = self.timeout;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            sink.fade(kind);
            tokio::time::sleep(FADE_DURATION).await;
            sink.hide(kind);
        });

        self.lock_pending().insert(kind, handle);
    }

    pub fn show_error(&self, message: &str) {
        self.show_alert(AlertKind::Error, message);
    }

    pub fn show_success(&self, message: &str) {
        self.show_alert(AlertKind::Success, message);
    }

    /// Hide an alert now, cancelling its timer.
    pub fn dismiss(&self, kind: AlertKind) {
        if let Some(sink) = &self.sink {
            self.cancel_pending(kind);
            sink.hide(kind);
        }
    }

    fn cancel_pending(&self, kind: AlertKind) {
        if let Some(previous) = self.lock_pending().remove(&kind) {
            previous.abort();
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<AlertKind, JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn events(&self) -> Vec<String> {
            self.events.lock().expect("sink lock").clone()
        }
    }

    impl AlertSink for RecordingSink {
        fn show(&self, kind: AlertKind, message: &str) {
            self.events.lock().expect("sink lock").push(format!("show {kind}: {message}"));
        }

        fn fade(&self, kind: AlertKind) {
            self.events.lock().expect("sink lock").push(format!("fade {kind}"));
        }

        fn hide(&self, kind: AlertKind) {
            self.events.lock().expect("sink lock").push(format!("hide {kind}"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_alert_fades_then_hides() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());

        notifier.show_success("Calculation saved");
        assert_eq!(sink.events(), vec!["show success: Calculation saved"]);

        tokio::time::sleep(Duration::from_millis(5100)).await;
        assert_eq!(sink.events().last().map(String::as_str), Some("fade success"));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            sink.events(),
            vec!["show success: Calculation saved", "fade success", "hide success"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_alert_cancels_previous_hide() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());

        notifier.show_error("first");
        tokio::time::sleep(Duration::from_secs(3)).await;
        notifier.show_error("second");

        // The first alert's timer would have fired at 5s
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(sink.events(), vec!["show error: first", "show error: second"]);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(
            sink.events(),
            vec!["show error: first", "show error: second", "fade error", "hide error"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_kinds_are_independent() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone()).with_timeout(Duration::from_secs(1));

        notifier.show_error("bad input");
        notifier.show_success("saved");
        tokio::time::sleep(Duration::from_secs(2)).await;

        let events = sink.events();
        assert_eq!(events.len(), 6);
        assert!(events.contains(&"hide error".to_string()));
        assert!(events.contains(&"hide success".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_hides_immediately() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());

        notifier.show_error("oops");
        notifier.dismiss(AlertKind::Error);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(sink.events(), vec!["show error: oops", "hide error"]);
    }

    #[test]
    fn test_detached_notifier_is_noop() {
        let notifier = Notifier::detached();
        notifier.show_error("nobody sees this");
        notifier.dismiss(AlertKind::Error);
    }

    #[test]
    fn test_show_without_runtime_still_displays() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Notifier::new(sink.clone());
        notifier.show_success("done");
        assert_eq!(sink.events(), vec!["show success: done"]);
    }
}
