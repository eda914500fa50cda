//! Issue tracker traits

use crate::error::Result;
use ticketlog_core::{ReleaseVersion, Ticket};

/// Trait for issue tracker clients
///
/// Implementations are shared read-only across concurrent resolver tasks.
#[async_trait::async_trait]
pub trait IssueTracker: Send + Sync {
    /// Get the tracker name
    fn name(&self) -> &str;

    /// Largest number of keys accepted by one [`fetch_tickets`](Self::fetch_tickets) call
    fn max_batch_size(&self) -> usize;

    /// Fetch the tickets for a batch of keys.
    ///
    /// Keys the tracker does not know are simply absent from the result.
    async fn fetch_tickets(&self, keys: &[String]) -> Result<Vec<Ticket>>;

    /// Replace a ticket's description
    async fn update_description(&self, key: &str, description: &str) -> Result<()>;

    /// List the versions defined for a project
    async fn project_versions(&self, project: &str) -> Result<Vec<ReleaseVersion>>;

    /// Web URL of a ticket
    fn browse_url(&self, key: &str) -> String;
}
