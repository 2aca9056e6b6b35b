//! Dominant Resource Fairness sorter.
//!
//! Each client's dominant share is `max over resource r of
//! allocated[r] / cluster_total[r]`. Clients are ordered ascending by
//! that share, so the most under-served client is offered resources
//! first. Shares are cached per client and recomputed only when the
//! client's own allocation changes; a cluster-total change recomputes
//! every cached share (the denominator moved for everyone).

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use fairway_resources::{Quantity, ResourceVector};

use crate::Sorter;

#[derive(Debug, Clone)]
struct ClientState {
    allocation: ResourceVector,
    /// Cached dominant share; invariant: consistent with `allocation`
    /// and the sorter's current totals.
    share: f64,
    active: bool,
}

/// The DRF ranking policy.
#[derive(Debug, Default)]
pub struct DrfSorter {
    clients: HashMap<String, ClientState>,
    total: ResourceVector,
}

impl DrfSorter {
    pub fn new() -> Self {
        Self::default()
    }

    fn recompute(&mut self, client: &str) {
        let total = self.total.clone();
        if let Some(state) = self.clients.get_mut(client) {
            state.share = dominant_share(&state.allocation, &total);
        }
    }
}

impl Sorter for DrfSorter {
    fn add(&mut self, client: &str) {
        self.clients.entry(client.to_string()).or_insert(ClientState {
            allocation: ResourceVector::new(),
            share: 0.0,
            active: true,
        });
        debug!(%client, "sorter client added");
    }

    fn remove(&mut self, client: &str) {
        self.clients.remove(client);
        debug!(%client, "sorter client removed");
    }

    fn activate(&mut self, client: &str) {
        if let Some(state) = self.clients.get_mut(client) {
            state.active = true;
        }
    }

    fn deactivate(&mut self, client: &str) {
        if let Some(state) = self.clients.get_mut(client) {
            state.active = false;
        }
    }

    fn allocated(&mut self, client: &str, delta: &ResourceVector) {
        let Some(state) = self.clients.get_mut(client) else {
            return;
        };
        state.allocation.add(delta);
        self.recompute(client);
    }

    fn unallocated(&mut self, client: &str, delta: &ResourceVector) {
        let Some(state) = self.clients.get_mut(client) else {
            return;
        };
        let rest = state.allocation.checked_sub(delta);
        assert!(
            rest.is_some(),
            "sorter allocation underflow for {client}: held {}, subtracting {delta}",
            state.allocation
        );
        state.allocation = rest.unwrap_or_default();
        self.recompute(client);
    }

    fn update_total(&mut self, total: &ResourceVector) {
        self.total = total.clone();
        let ids: Vec<String> = self.clients.keys().cloned().collect();
        for id in ids {
            self.recompute(&id);
        }
    }

    fn allocation(&self, client: &str) -> Option<&ResourceVector> {
        self.clients.get(client).map(|s| &s.allocation)
    }

    fn contains(&self, client: &str) -> bool {
        self.clients.contains_key(client)
    }

    /// Ascending by dominant share; ties broken lexicographically on
    /// client id so the ordering is a strict, reproducible total order.
    fn order(&self) -> Vec<String> {
        let mut active: Vec<(&String, f64)> = self
            .clients
            .iter()
            .filter(|(_, state)| state.active)
            .map(|(id, state)| (id, state.share))
            .collect();
        active.sort_by(|(a_id, a_share), (b_id, b_share)| {
            a_share
                .partial_cmp(b_share)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a_id.cmp(b_id))
        });
        active.into_iter().map(|(id, _)| id.clone()).collect()
    }
}

/// `max over r of allocated[r] / total[r]`, over resources present in
/// the cluster totals. Zero totals yield a zero share.
fn dominant_share(allocation: &ResourceVector, total: &ResourceVector) -> f64 {
    let mut share: f64 = 0.0;
    for (name, total_quantity) in total.iter() {
        let denominator = total_quantity.amount();
        if denominator <= 0.0 {
            continue;
        }
        let numerator = allocation.get(name).map_or(0.0, Quantity::amount);
        share = share.max(numerator / denominator);
    }
    share
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(s: &str) -> ResourceVector {
        ResourceVector::parse(s).unwrap()
    }

    fn sorter_with(total: &str, clients: &[&str]) -> DrfSorter {
        let mut sorter = DrfSorter::new();
        sorter.update_total(&vec_of(total));
        for client in clients {
            sorter.add(client);
        }
        sorter
    }

    #[test]
    fn empty_allocations_order_by_id() {
        let sorter = sorter_with("cpus:10;mem:100", &["b", "a", "c"]);
        assert_eq!(sorter.order(), vec!["a", "b", "c"]);
    }

    #[test]
    fn dominant_share_is_max_component() {
        let mut sorter = sorter_with("cpus:10;mem:100", &["a", "b"]);
        // a: cpus 2/10 = 0.2, mem 10/100 = 0.1 -> dominant 0.2
        sorter.allocated("a", &vec_of("cpus:2;mem:10"));
        // b: cpus 1/10 = 0.1, mem 30/100 = 0.3 -> dominant 0.3
        sorter.allocated("b", &vec_of("cpus:1;mem:30"));
        assert_eq!(sorter.order(), vec!["a", "b"]);
    }

    #[test]
    fn drf_progression_matches_allocator_contract() {
        // Mirrors the canonical bring-up: agents join one at a time and
        // the lowest-share client absorbs each new agent entirely.
        let mut sorter = sorter_with("cpus:2;mem:1024", &["t1"]);
        sorter.allocated("t1", &vec_of("cpus:2;mem:1024"));
        assert_eq!(sorter.order(), vec!["t1"]); // share = 1

        sorter.add("t2");
        sorter.update_total(&vec_of("cpus:3;mem:1536"));
        // t1 = 0.66, t2 = 0.
        assert_eq!(sorter.order(), vec!["t2", "t1"]);

        sorter.allocated("t2", &vec_of("cpus:1;mem:512"));
        sorter.update_total(&vec_of("cpus:6;mem:3584"));
        // t1 = 0.33, t2 = 0.16.
        assert_eq!(sorter.order(), vec!["t2", "t1"]);

        sorter.allocated("t2", &vec_of("cpus:3;mem:2048"));
        // t1 = 0.33, t2 = 0.71.
        assert_eq!(sorter.order(), vec!["t1", "t2"]);
    }

    #[test]
    fn total_update_recomputes_all_shares() {
        let mut sorter = sorter_with("cpus:4", &["a", "b"]);
        sorter.allocated("a", &vec_of("cpus:2"));
        sorter.allocated("b", &vec_of("cpus:1"));
        assert_eq!(sorter.order(), vec!["b", "a"]);

        // Doubling the cluster halves every share but keeps the order.
        sorter.update_total(&vec_of("cpus:8"));
        assert_eq!(sorter.order(), vec!["b", "a"]);
    }

    #[test]
    fn deactivate_hides_without_clearing() {
        let mut sorter = sorter_with("cpus:4", &["a", "b"]);
        sorter.allocated("a", &vec_of("cpus:2"));
        sorter.deactivate("a");
        assert_eq!(sorter.order(), vec!["b"]);

        sorter.activate("a");
        assert_eq!(sorter.order(), vec!["b", "a"]);
        assert_eq!(sorter.allocation("a"), Some(&vec_of("cpus:2")));
    }

    #[test]
    fn remove_clears_contribution() {
        let mut sorter = sorter_with("cpus:4", &["a"]);
        sorter.allocated("a", &vec_of("cpus:2"));
        sorter.remove("a");
        assert!(!sorter.contains("a"));
        assert!(sorter.order().is_empty());
    }

    #[test]
    fn unallocated_reduces_share() {
        let mut sorter = sorter_with("cpus:4;mem:64", &["a", "b"]);
        sorter.allocated("a", &vec_of("cpus:3"));
        sorter.allocated("b", &vec_of("cpus:1"));
        assert_eq!(sorter.order(), vec!["b", "a"]);

        sorter.unallocated("a", &vec_of("cpus:3"));
        assert_eq!(sorter.order(), vec!["a", "b"]);
    }

    #[test]
    #[should_panic(expected = "sorter allocation underflow")]
    fn unallocated_underflow_asserts() {
        let mut sorter = sorter_with("cpus:4", &["a"]);
        sorter.allocated("a", &vec_of("cpus:1"));
        sorter.unallocated("a", &vec_of("cpus:2"));
    }

    #[test]
    fn share_stays_in_unit_interval() {
        let mut sorter = sorter_with("cpus:2;mem:1024", &["a"]);
        sorter.allocated("a", &vec_of("cpus:2;mem:1024"));
        let state = sorter.clients.get("a").unwrap();
        assert!(state.share >= 0.0 && state.share <= 1.0);
    }

    #[test]
    fn zero_total_means_zero_share() {
        let mut sorter = sorter_with("", &["a"]);
        sorter.allocated("a", &vec_of("cpus:1"));
        assert_eq!(sorter.clients.get("a").unwrap().share, 0.0);
    }
}
