//! Outbound notification sink.
//!
//! Mail delivery is an external collaborator. Sends are fire-and-forget
//! relative to the membership writes that trigger them.

use crate::errors::AppError;

/// A message addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Invitation for an email without an account; the link carries the token.
    pub fn invite(to: &str, portal_name: &str, redemption_url: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("You're invited to the {} portal", portal_name),
            body: format!(
                "You have been invited to collaborate on {}.\n\nAccept the invitation: {}\n",
                portal_name, redemption_url
            ),
        }
    }

    /// Informational message for an existing account that was added directly.
    pub fn added(to: &str, portal_name: &str) -> Self {
        Self {
            to: to.to_string(),
            subject: format!("You now have access to the {} portal", portal_name),
            body: format!(
                "You were added to {}. Sign in to see its milestones, updates and files.\n",
                portal_name
            ),
        }
    }
}

/// Delivery backend for notifications.
pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), AppError>;
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notification: &Notification) -> Result<(), AppError> {
        tracing::info!(
            to = %notification.to,
            subject = %notification.subject,
            "Notification queued"
        );
        tracing::debug!(body = %notification.body, "Notification body");
        Ok(())
    }
}

/// Send a notification, logging and swallowing any failure.
pub fn dispatch(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.send(&notification) {
        tracing::warn!(to = %notification.to, "Failed to send notification: {}", e);
    }
}
