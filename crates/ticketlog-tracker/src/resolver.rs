//! Batched, bounded-concurrency ticket resolution

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use ticketlog_core::config::TrackerConfig;
use ticketlog_core::Ticket;

use crate::error::{Result, TrackerError};
use crate::traits::IssueTracker;

/// Resolver tuning
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Keys per request, further capped by the tracker's own limit
    pub batch_size: usize,
    /// Maximum in-flight requests
    pub concurrency: usize,
    /// Retries per batch for transient failures
    pub max_retries: u32,
    /// First retry delay, doubled on every attempt
    pub retry_backoff: Duration,
    /// Upper bound for a single retry delay
    pub max_backoff: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self::from_config(&TrackerConfig::default())
    }
}

impl ResolverOptions {
    /// Build options from the tracker configuration section
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            concurrency: config.concurrency,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Delay before retry number `attempt + 1`
    pub fn backoff(&self, attempt: u32, requested: Option<Duration>) -> Duration {
        let exponential = self
            .retry_backoff
            .saturating_mul(2u32.saturating_pow(attempt));
        requested.unwrap_or(exponential).min(self.max_backoff)
    }
}

/// Outcome of resolving a set of keys
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Every requested key, mapped to its ticket or `None`
    pub tickets: BTreeMap<String, Option<Ticket>>,
    /// Human-readable notes about keys that did not resolve
    pub warnings: Vec<String>,
}

impl Resolution {
    /// Number of keys that resolved to a ticket
    pub fn resolved_count(&self) -> usize {
        self.tickets.values().filter(|t| t.is_some()).count()
    }

    /// Keys that did not resolve
    pub fn missing_keys(&self) -> Vec<&str> {
        self.tickets
            .iter()
            .filter(|(_, t)| t.is_none())
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Resolves ticket keys against an issue tracker
pub struct TicketResolver {
    tracker: Arc<dyn IssueTracker>,
    options: ResolverOptions,
}

impl TicketResolver {
    /// Create a resolver
    pub fn new(tracker: Arc<dyn IssueTracker>, options: ResolverOptions) -> Self {
        Self { tracker, options }
    }

    fn effective_batch_size(&self) -> usize {
        self.options
            .batch_size
            .min(self.tracker.max_batch_size())
            .max(1)
    }

    /// Resolve every key in `keys`.
    ///
    /// Batches run concurrently up to the configured ceiling. Authentication
    /// failures abort the whole resolution; batches that keep failing
    /// transiently resolve to `None` with a warning.
    #[instrument(skip(self, keys), fields(tracker = self.tracker.name(), key_count = keys.len()))]
    pub async fn resolve(&self, keys: &BTreeSet<String>) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        if keys.is_empty() {
            debug!("no ticket keys to resolve");
            return Ok(resolution);
        }

        let keys: Vec<String> = keys.iter().cloned().collect();
        let batch_size = self.effective_batch_size();
        let semaphore = Arc::new(Semaphore::new(self.options.concurrency.max(1)));

        info!(
            batches = keys.len().div_ceil(batch_size),
            batch_size,
            concurrency = self.options.concurrency,
            "resolving tickets"
        );

        // Set by the first batch that fails for good; no batch starts after it
        let aborted = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();
        for batch in keys.chunks(batch_size) {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| TrackerError::Other(e.to_string()))?;
            if aborted.load(Ordering::SeqCst) {
                break;
            }
            let tracker = self.tracker.clone();
            let options = self.options.clone();
            let aborted = aborted.clone();
            let batch = batch.to_vec();

            tasks.spawn(async move {
                let result = fetch_with_retry(tracker.as_ref(), &batch, &options).await;
                if matches!(&result, Err(e) if !e.is_transient()) {
                    aborted.store(true, Ordering::SeqCst);
                }
                drop(permit);
                (batch, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (batch, result) = joined
                .map_err(|e| TrackerError::Other(format!("resolver task failed: {}", e)))?;

            match result {
                Ok(tickets) => match_batch(&batch, tickets, &mut resolution),
                Err(e) if e.is_transient() => {
                    warn!(error = %e, keys = batch.len(), "giving up on ticket batch");
                    resolution.warnings.push(format!(
                        "Could not fetch {} ({})",
                        batch.join(", "),
                        e
                    ));
                    for key in batch {
                        resolution.tickets.insert(key, None);
                    }
                }
                Err(e) => {
                    warn!(error = %e, in_flight = tasks.len(), "aborting ticket resolution");
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        // Batches finish in any order
        resolution.warnings.sort();

        info!(
            resolved = resolution.resolved_count(),
            missing = resolution.tickets.len() - resolution.resolved_count(),
            "ticket resolution finished"
        );
        Ok(resolution)
    }
}

async fn fetch_with_retry(
    tracker: &dyn IssueTracker,
    keys: &[String],
    options: &ResolverOptions,
) -> Result<Vec<Ticket>> {
    let mut attempt = 0;
    loop {
        match tracker.fetch_tickets(keys).await {
            Ok(tickets) => return Ok(tickets),
            Err(e) if e.is_transient() && attempt < options.max_retries => {
                let delay = options.backoff(attempt, e.retry_after());
                warn!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "ticket fetch failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Match returned tickets to requested keys, exactly first and then ignoring case
fn match_batch(batch: &[String], tickets: Vec<Ticket>, resolution: &mut Resolution) {
    for key in batch {
        let found = tickets
            .iter()
            .find(|t| &t.key == key)
            .or_else(|| tickets.iter().find(|t| t.key.eq_ignore_ascii_case(key)));

        match found {
            Some(ticket) => {
                if &ticket.key != key {
                    debug!(requested = %key, canonical = %ticket.key, "matched ticket by canonical key");
                }
                resolution.tickets.insert(key.clone(), Some(ticket.clone()));
            }
            None => {
                warn!(key = %key, "ticket not found");
                resolution
                    .warnings
                    .push(format!("Ticket {} was not found", key));
                resolution.tickets.insert(key.clone(), None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use ticketlog_core::ReleaseVersion;

    /// In-memory tracker that can fail the first N calls
    struct FakeTracker {
        tickets: HashMap<String, Ticket>,
        max_batch: usize,
        failures: Mutex<Vec<TrackerError>>,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl FakeTracker {
        fn new(keys: &[&str]) -> Self {
            Self {
                tickets: keys
                    .iter()
                    .map(|k| (k.to_string(), Ticket::new("1", *k, "Bug", "Done", "s")))
                    .collect(),
                max_batch: 100,
                failures: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                batches: Mutex::new(Vec::new()),
            }
        }

        fn failing_with(self, errors: Vec<TrackerError>) -> Self {
            *self.failures.lock().unwrap() = errors;
            self
        }
    }

    #[async_trait::async_trait]
    impl IssueTracker for FakeTracker {
        fn name(&self) -> &str {
            "fake"
        }

        fn max_batch_size(&self) -> usize {
            self.max_batch
        }

        async fn fetch_tickets(&self, keys: &[String]) -> Result<Vec<Ticket>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.batches.lock().unwrap().push(keys.to_vec());
            if let Some(err) = self.failures.lock().unwrap().pop() {
                return Err(err);
            }
            Ok(keys
                .iter()
                .filter_map(|k| {
                    self.tickets
                        .values()
                        .find(|t| t.key.eq_ignore_ascii_case(k))
                        .cloned()
                })
                .collect())
        }

        async fn update_description(&self, _key: &str, _description: &str) -> Result<()> {
            Ok(())
        }

        async fn project_versions(&self, _project: &str) -> Result<Vec<ReleaseVersion>> {
            Ok(Vec::new())
        }

        fn browse_url(&self, key: &str) -> String {
            format!("https://tracker.test/browse/{}", key)
        }
    }

    fn fast_options() -> ResolverOptions {
        ResolverOptions {
            retry_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
            ..Default::default()
        }
    }

    fn keys(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_resolve_found_and_missing() {
        let tracker = Arc::new(FakeTracker::new(&["PROJ-1", "PROJ-2"]));
        let resolver = TicketResolver::new(tracker, fast_options());

        let resolution = resolver
            .resolve(&keys(&["PROJ-1", "PROJ-2", "PROJ-99"]))
            .await
            .unwrap();

        assert_eq!(resolution.tickets.len(), 3);
        assert_eq!(resolution.resolved_count(), 2);
        assert_eq!(resolution.missing_keys(), vec!["PROJ-99"]);
        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].contains("PROJ-99"));
    }

    #[tokio::test]
    async fn test_empty_keys_make_no_calls() {
        let tracker = Arc::new(FakeTracker::new(&[]));
        let resolver = TicketResolver::new(tracker.clone(), fast_options());
        let resolution = resolver.resolve(&BTreeSet::new()).await.unwrap();
        assert!(resolution.tickets.is_empty());
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batches_respect_both_limits() {
        let all: Vec<String> = (1..=10).map(|i| format!("PROJ-{}", i)).collect();
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let mut fake = FakeTracker::new(&refs);
        fake.max_batch = 3;
        let tracker = Arc::new(fake);

        let options = ResolverOptions {
            batch_size: 4,
            ..fast_options()
        };
        let resolver = TicketResolver::new(tracker.clone(), options);
        let resolution = resolver.resolve(&all.iter().cloned().collect()).await.unwrap();

        assert_eq!(resolution.resolved_count(), 10);
        let batches = tracker.batches.lock().unwrap();
        assert_eq!(batches.len(), 4);
        assert!(batches.iter().all(|b| b.len() <= 3));
    }

    #[tokio::test]
    async fn test_concurrency_ceiling() {
        let all: Vec<String> = (1..=12).map(|i| format!("OPS-{}", i)).collect();
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let tracker = Arc::new(FakeTracker::new(&refs));

        let options = ResolverOptions {
            batch_size: 1,
            concurrency: 2,
            ..fast_options()
        };
        let resolver = TicketResolver::new(tracker.clone(), options);
        resolver.resolve(&all.iter().cloned().collect()).await.unwrap();

        assert_eq!(tracker.calls.load(Ordering::SeqCst), 12);
        assert!(tracker.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let tracker = Arc::new(
            FakeTracker::new(&["PROJ-1"]).failing_with(vec![TrackerError::from_status(
                503,
                "unavailable",
                None,
            )]),
        );
        let resolver = TicketResolver::new(tracker.clone(), fast_options());

        let resolution = resolver.resolve(&keys(&["PROJ-1"])).await.unwrap();
        assert_eq!(resolution.resolved_count(), 1);
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 2);
        assert!(resolution.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_retry_exhaustion_degrades_to_missing() {
        let failures = (0..4)
            .map(|_| TrackerError::RateLimited { retry_after: None })
            .collect();
        let tracker = Arc::new(FakeTracker::new(&["PROJ-1", "PROJ-2"]).failing_with(failures));
        let options = ResolverOptions {
            max_retries: 3,
            ..fast_options()
        };
        let resolver = TicketResolver::new(tracker.clone(), options);

        let resolution = resolver
            .resolve(&keys(&["PROJ-1", "PROJ-2"]))
            .await
            .unwrap();
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 4);
        assert_eq!(resolution.resolved_count(), 0);
        assert_eq!(resolution.tickets.len(), 2);
        assert_eq!(resolution.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_authentication_failure_is_fatal() {
        let tracker = Arc::new(
            FakeTracker::new(&["PROJ-1"])
                .failing_with(vec![TrackerError::Authentication("bad token".into())]),
        );
        let resolver = TicketResolver::new(tracker.clone(), fast_options());

        let err = resolver.resolve(&keys(&["PROJ-1"])).await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_authentication_failure_stops_remaining_batches() {
        let all: Vec<String> = (1..=20).map(|n| format!("PROJ-{}", n)).collect();
        let refs: Vec<&str> = all.iter().map(String::as_str).collect();
        let mut tracker = FakeTracker::new(&refs).failing_with(
            (0..20)
                .map(|_| TrackerError::Authentication("401".into()))
                .collect(),
        );
        tracker.max_batch = 1;
        let tracker = Arc::new(tracker);
        let resolver = TicketResolver::new(
            tracker.clone(),
            ResolverOptions {
                concurrency: 1,
                ..fast_options()
            },
        );

        let err = resolver.resolve(&keys(&refs)).await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_canonical_key_wins() {
        let tracker = Arc::new(FakeTracker::new(&["PROJ-5"]));
        let resolver = TicketResolver::new(tracker, fast_options());

        let resolution = resolver.resolve(&keys(&["proj-5"])).await.unwrap();
        let ticket = resolution.tickets["proj-5"].as_ref().unwrap();
        assert_eq!(ticket.key, "PROJ-5");
    }

    #[test]
    fn test_backoff() {
        let options = ResolverOptions {
            retry_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(1_000),
            ..Default::default()
        };
        assert_eq!(options.backoff(0, None), Duration::from_millis(100));
        assert_eq!(options.backoff(2, None), Duration::from_millis(400));
        assert_eq!(options.backoff(10, None), Duration::from_millis(1_000));
        assert_eq!(
            options.backoff(0, Some(Duration::from_secs(30))),
            Duration::from_millis(1_000)
        );
    }
}
