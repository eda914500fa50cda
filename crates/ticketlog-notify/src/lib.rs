//! Ticketlog Notify - Posting changelogs to chat
//!
//! Provides the [`NotificationSink`] trait and a Slack implementation.

pub mod error;
pub mod slack;

pub use error::{NotifyError, Result};
pub use slack::{SlackClient, SlackSettings};

/// Something that can deliver a rendered changelog to a channel
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Sink name for logging
    fn name(&self) -> &str;

    /// Post `document` to `channel`
    async fn post_message(&self, document: &str, channel: &str) -> Result<()>;
}
