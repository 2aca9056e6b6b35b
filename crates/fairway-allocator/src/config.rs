//! Allocator engine configuration.

use std::time::Duration;

use fairway_resources::{Quantity, ResourceVector};
use fairway_whitelist::Whitelist;

/// Tunables for the engine, fixed at spawn time.
#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Period of the timer-driven allocation pass. Event-driven passes
    /// (agent added, resources recovered, ...) run in addition to it.
    pub allocation_interval: Duration,

    /// An agent's available resources are worth offering only when
    /// they meet at least one of these minimums; anything smaller is
    /// left unallocated for the pass to avoid fragmenting tiny
    /// leftovers.
    pub min_allocatable: ResourceVector,

    /// The whitelist in force before the first update arrives.
    pub initial_whitelist: Whitelist,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            allocation_interval: Duration::from_secs(1),
            min_allocatable: ResourceVector::new()
                .with("cpus", Quantity::Scalar(0.01))
                .with("mem", Quantity::Scalar(32.0)),
            initial_whitelist: Whitelist::AllowAll,
        }
    }
}

impl AllocatorConfig {
    pub fn with_allocation_interval(mut self, interval: Duration) -> Self {
        self.allocation_interval = interval;
        self
    }

    pub fn with_min_allocatable(mut self, min: ResourceVector) -> Self {
        self.min_allocatable = min;
        self
    }

    pub fn with_initial_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.initial_whitelist = whitelist;
        self
    }
}
