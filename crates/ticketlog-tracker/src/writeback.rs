//! Writing the rendered changelog back into a release ticket

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::traits::IssueTracker;

/// Delay before the single retry of a transient failure
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Upper bound for a tracker-requested `Retry-After`
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Replaces a ticket's description with the rendered changelog.
///
/// The update is a full replace, so running it twice with the same document
/// leaves the ticket in the same state.
pub struct TicketWriteback {
    tracker: Arc<dyn IssueTracker>,
    retry_delay: Duration,
    max_retry_delay: Duration,
}

impl TicketWriteback {
    /// Create a writeback for the given tracker
    pub fn new(tracker: Arc<dyn IssueTracker>) -> Self {
        Self {
            tracker,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
        }
    }

    /// Override the retry delay
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Override the cap on the retry delay
    pub fn with_max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }

    /// Write `document` into the description of `ticket_id`
    #[instrument(skip(self, document), fields(tracker = self.tracker.name(), document_len = document.len()))]
    pub async fn writeback(&self, ticket_id: &str, document: &str) -> Result<()> {
        match self.tracker.update_description(ticket_id, document).await {
            Err(e) if e.is_transient() => {
                let delay = e
                    .retry_after()
                    .unwrap_or(self.retry_delay)
                    .min(self.max_retry_delay);
                warn!(error = %e, delay_ms = delay.as_millis() as u64, "writeback failed, retrying once");
                tokio::time::sleep(delay).await;
                self.tracker.update_description(ticket_id, document).await?;
            }
            other => other?,
        }

        info!(ticket = ticket_id, "changelog written to ticket");
        Ok(())
    }
}
