//! User-facing notifications raised by a submission.

use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn profile_created(name: &str) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Profile Submitted Successfully!".to_string(),
            description: format!("Welcome {name}! Your profile has been created."),
        }
    }

    pub fn submission_failed(reason: &str) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Submission Failed".to_string(),
            description: reason.to_string(),
        }
    }
}

/// Receives notifications from a controller. Closures implement it directly.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<F> NotificationSink for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// Forwards notifications into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink(pub mpsc::UnboundedSender<Notification>);

impl ChannelSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, notification: Notification) {
        if self.0.send(notification).is_err() {
            debug!("notification receiver dropped");
        }
    }
}
