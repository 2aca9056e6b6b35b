//! fairway-filter — temporary offer suppressions.
//!
//! When a tenant declines (or only partially uses) an offer it can ask
//! for a filter: a hold that keeps the agent's resources out of that
//! tenant's offers until the hold expires. Filters reduce offer churn;
//! they are advisory to the allocation pass and carry no correctness
//! weight; the ledger stays authoritative about availability either
//! way.
//!
//! Expiry is measured with [`tokio::time::Instant`], so tests running
//! on a paused runtime clock control it deterministically. Expired
//! entries are evicted lazily at query time; there is no background
//! sweep.

use std::collections::HashMap;

use tokio::time::{Duration, Instant};
use tracing::debug;

/// Per-(tenant, agent) offer suppressions.
#[derive(Debug, Default)]
pub struct OfferFilterTable {
    /// (tenant, agent) -> expiry. A later filter for the same pair
    /// extends the hold; it never shortens one already in place.
    filters: HashMap<(String, String), Instant>,
}

impl OfferFilterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a suppression for `duration`. A zero duration means "no
    /// suppression" and installs nothing.
    pub fn add_filter(&mut self, tenant: &str, agent: &str, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        let expiry = Instant::now() + duration;
        let key = (tenant.to_string(), agent.to_string());
        let entry = self.filters.entry(key).or_insert(expiry);
        *entry = (*entry).max(expiry);
        debug!(%tenant, %agent, ?duration, "offer filter installed");
    }

    /// True if a live, unexpired filter exists for the pair. Expired
    /// entries are dropped on the way through.
    pub fn is_filtered(&mut self, tenant: &str, agent: &str) -> bool {
        let key = (tenant.to_string(), agent.to_string());
        match self.filters.get(&key) {
            Some(expiry) if *expiry > Instant::now() => true,
            Some(_) => {
                self.filters.remove(&key);
                false
            }
            None => false,
        }
    }

    /// Drop all filters involving a departing tenant.
    pub fn remove_tenant(&mut self, tenant: &str) {
        self.filters.retain(|(t, _), _| t != tenant);
    }

    /// Drop all filters involving a departing agent.
    pub fn remove_agent(&mut self, agent: &str) {
        self.filters.retain(|(_, a), _| a != agent);
    }

    /// Number of installed (possibly expired, not yet evicted) filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time;

    #[tokio::test(start_paused = true)]
    async fn filter_suppresses_until_expiry() {
        let mut table = OfferFilterTable::new();
        table.add_filter("t1", "a1", Duration::from_secs(5));

        assert!(table.is_filtered("t1", "a1"));
        assert!(!table.is_filtered("t1", "a2"));
        assert!(!table.is_filtered("t2", "a1"));

        time::advance(Duration::from_secs(6)).await;
        assert!(!table.is_filtered("t1", "a1"));
        // Lazy eviction removed the expired entry.
        assert!(table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_installs_nothing() {
        let mut table = OfferFilterTable::new();
        table.add_filter("t1", "a1", Duration::ZERO);
        assert!(!table.is_filtered("t1", "a1"));
        assert!(table.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refilter_extends_but_never_shortens() {
        let mut table = OfferFilterTable::new();
        table.add_filter("t1", "a1", Duration::from_secs(10));
        table.add_filter("t1", "a1", Duration::from_secs(1));

        time::advance(Duration::from_secs(5)).await;
        assert!(table.is_filtered("t1", "a1"));

        table.add_filter("t1", "a1", Duration::from_secs(10));
        time::advance(Duration::from_secs(6)).await;
        assert!(table.is_filtered("t1", "a1"));
    }

    #[tokio::test(start_paused = true)]
    async fn removal_clears_both_directions() {
        let mut table = OfferFilterTable::new();
        table.add_filter("t1", "a1", Duration::from_secs(60));
        table.add_filter("t1", "a2", Duration::from_secs(60));
        table.add_filter("t2", "a1", Duration::from_secs(60));

        table.remove_tenant("t1");
        assert!(!table.is_filtered("t1", "a1"));
        assert!(!table.is_filtered("t1", "a2"));
        assert!(table.is_filtered("t2", "a1"));

        table.remove_agent("a1");
        assert!(!table.is_filtered("t2", "a1"));
        assert!(table.is_empty());
    }
}
