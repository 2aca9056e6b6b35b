//! Per-agent resource bookkeeping.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use fairway_resources::{Attributes, ResourceVector};

use crate::error::{LedgerError, LedgerResult};

/// Bookkeeping for a single agent.
#[derive(Debug, Clone)]
struct AgentRecord {
    total: ResourceVector,
    available: ResourceVector,
    attributes: Attributes,
    /// tenant id -> resources currently allocated on this agent.
    allocations: BTreeMap<String, ResourceVector>,
}

/// Authoritative total/allocated/available state for every agent.
///
/// Agents are kept in an ordered map so every iteration (and therefore
/// every allocation pass walking the agents) is deterministic.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    agents: BTreeMap<String, AgentRecord>,
}

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. A duplicate id is a no-op with a diagnostic;
    /// existing state is never clobbered.
    pub fn add_agent(
        &mut self,
        agent: &str,
        total: ResourceVector,
        attributes: Attributes,
    ) -> bool {
        if self.agents.contains_key(agent) {
            warn!(%agent, "duplicate agent registration ignored");
            return false;
        }
        debug!(%agent, %total, "agent registered in ledger");
        self.agents.insert(
            agent.to_string(),
            AgentRecord {
                available: total.clone(),
                total,
                attributes,
                allocations: BTreeMap::new(),
            },
        );
        true
    }

    /// Drop an agent and all of its allocation bookkeeping, returning
    /// the per-tenant allocations that were outstanding so the caller
    /// can reconcile fairness state atomically with the removal.
    pub fn remove_agent(
        &mut self,
        agent: &str,
    ) -> Option<BTreeMap<String, ResourceVector>> {
        match self.agents.remove(agent) {
            Some(record) => {
                debug!(%agent, "agent removed from ledger");
                Some(record.allocations)
            }
            None => {
                warn!(%agent, "removal of unknown agent ignored");
                None
            }
        }
    }

    /// Move `resources` from available to allocated for the pairing.
    pub fn allocate(
        &mut self,
        agent: &str,
        tenant: &str,
        resources: &ResourceVector,
    ) -> LedgerResult<()> {
        let record = self
            .agents
            .get_mut(agent)
            .ok_or_else(|| LedgerError::UnknownAgent(agent.to_string()))?;

        let rest = record.available.checked_sub(resources).ok_or_else(|| {
            LedgerError::Insufficient {
                agent: agent.to_string(),
                requested: resources.to_string(),
                available: record.available.to_string(),
            }
        })?;

        record.available = rest;
        record
            .allocations
            .entry(tenant.to_string())
            .or_default()
            .add(resources);
        debug!(%agent, %tenant, %resources, "resources allocated");
        Ok(())
    }

    /// Return `resources` from the pairing's allocation to the agent's
    /// available pool.
    ///
    /// Unknown agents or pairings are tolerated as no-ops: a recovery
    /// message may legitimately arrive after the agent or tenant is
    /// already gone. Recovering more than a *live* pairing holds,
    /// however, is a bookkeeping bug and asserts.
    pub fn recover(&mut self, agent: &str, tenant: &str, resources: &ResourceVector) {
        let Some(record) = self.agents.get_mut(agent) else {
            debug!(%agent, %tenant, "recovery for unknown agent ignored");
            return;
        };
        let Some(allocation) = record.allocations.get_mut(tenant) else {
            debug!(%agent, %tenant, "recovery for unknown pairing ignored");
            return;
        };

        let rest = allocation.checked_sub(resources);
        assert!(
            rest.is_some(),
            "over-recovery on agent {agent} for tenant {tenant}: held {allocation}, recovering {resources}"
        );
        let rest = rest.unwrap_or_default();
        if rest.is_empty() {
            record.allocations.remove(tenant);
        } else {
            *allocation = rest;
        }
        record.available.add(resources);
        debug!(%agent, %tenant, %resources, "resources recovered");
    }

    /// The agent's current unallocated vector.
    pub fn available_on(&self, agent: &str) -> Option<&ResourceVector> {
        self.agents.get(agent).map(|r| &r.available)
    }

    pub fn total_on(&self, agent: &str) -> Option<&ResourceVector> {
        self.agents.get(agent).map(|r| &r.total)
    }

    pub fn attributes_of(&self, agent: &str) -> Option<&Attributes> {
        self.agents.get(agent).map(|r| &r.attributes)
    }

    /// The tenant's allocation on one agent, if any.
    pub fn allocation_on(&self, agent: &str, tenant: &str) -> Option<&ResourceVector> {
        self.agents.get(agent).and_then(|r| r.allocations.get(tenant))
    }

    /// Every (agent, resources) allocation a tenant currently holds.
    pub fn allocations_of(&self, tenant: &str) -> Vec<(String, ResourceVector)> {
        self.agents
            .iter()
            .filter_map(|(agent, record)| {
                record
                    .allocations
                    .get(tenant)
                    .map(|alloc| (agent.clone(), alloc.clone()))
            })
            .collect()
    }

    pub fn contains_agent(&self, agent: &str) -> bool {
        self.agents.contains_key(agent)
    }

    /// Agent ids in deterministic (sorted) order.
    pub fn agent_ids(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    /// Sum of all agents' total vectors.
    pub fn cluster_total(&self) -> ResourceVector {
        let mut total = ResourceVector::new();
        for record in self.agents.values() {
            total.add(&record.total);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_of(s: &str) -> ResourceVector {
        ResourceVector::parse(s).unwrap()
    }

    fn ledger_with_agent(agent: &str, total: &str) -> ResourceLedger {
        let mut ledger = ResourceLedger::new();
        ledger.add_agent(agent, vec_of(total), Attributes::new());
        ledger
    }

    #[test]
    fn add_agent_sets_availability() {
        let ledger = ledger_with_agent("a1", "cpus:2;mem:1024");
        assert_eq!(ledger.available_on("a1"), Some(&vec_of("cpus:2;mem:1024")));
        assert_eq!(ledger.total_on("a1"), Some(&vec_of("cpus:2;mem:1024")));
    }

    #[test]
    fn duplicate_agent_is_ignored() {
        let mut ledger = ledger_with_agent("a1", "cpus:2");
        ledger.allocate("a1", "t1", &vec_of("cpus:1")).unwrap();

        assert!(!ledger.add_agent("a1", vec_of("cpus:8"), Attributes::new()));
        // Existing bookkeeping untouched.
        assert_eq!(ledger.available_on("a1"), Some(&vec_of("cpus:1")));
    }

    #[test]
    fn allocate_moves_available_to_allocated() {
        let mut ledger = ledger_with_agent("a1", "cpus:2;mem:1024");
        ledger.allocate("a1", "t1", &vec_of("cpus:1;mem:512")).unwrap();

        assert_eq!(ledger.available_on("a1"), Some(&vec_of("cpus:1;mem:512")));
        assert_eq!(
            ledger.allocation_on("a1", "t1"),
            Some(&vec_of("cpus:1;mem:512"))
        );
    }

    #[test]
    fn allocate_rejects_overdraw() {
        let mut ledger = ledger_with_agent("a1", "cpus:2");
        let err = ledger.allocate("a1", "t1", &vec_of("cpus:3")).unwrap_err();
        assert!(matches!(err, LedgerError::Insufficient { .. }));
        // Failed allocation must not mutate anything.
        assert_eq!(ledger.available_on("a1"), Some(&vec_of("cpus:2")));
        assert!(ledger.allocation_on("a1", "t1").is_none());
    }

    #[test]
    fn allocate_unknown_agent_errors() {
        let mut ledger = ResourceLedger::new();
        assert!(matches!(
            ledger.allocate("ghost", "t1", &vec_of("cpus:1")),
            Err(LedgerError::UnknownAgent(_))
        ));
    }

    #[test]
    fn recover_round_trip_is_idempotent() {
        let mut ledger = ledger_with_agent("a1", "cpus:2;mem:1024");
        let chunk = vec_of("cpus:1;mem:512");

        ledger.allocate("a1", "t1", &chunk).unwrap();
        ledger.recover("a1", "t1", &chunk);
        assert_eq!(ledger.available_on("a1"), Some(&vec_of("cpus:2;mem:1024")));
        assert!(ledger.allocation_on("a1", "t1").is_none());

        // recover then allocate again lands in the same state.
        ledger.allocate("a1", "t1", &chunk).unwrap();
        assert_eq!(ledger.available_on("a1"), Some(&chunk));
    }

    #[test]
    fn recover_for_missing_agent_is_noop() {
        let mut ledger = ledger_with_agent("a1", "cpus:2");
        ledger.recover("gone", "t1", &vec_of("cpus:1"));
        assert_eq!(ledger.available_on("a1"), Some(&vec_of("cpus:2")));
    }

    #[test]
    fn recover_for_missing_pairing_is_noop() {
        let mut ledger = ledger_with_agent("a1", "cpus:2");
        ledger.allocate("a1", "t1", &vec_of("cpus:1")).unwrap();
        ledger.recover("a1", "t2", &vec_of("cpus:1"));
        // t1's allocation and the availability are untouched.
        assert_eq!(ledger.available_on("a1"), Some(&vec_of("cpus:1")));
        assert_eq!(ledger.allocation_on("a1", "t1"), Some(&vec_of("cpus:1")));
    }

    #[test]
    #[should_panic(expected = "over-recovery")]
    fn over_recovery_on_live_pairing_asserts() {
        let mut ledger = ledger_with_agent("a1", "cpus:4");
        ledger.allocate("a1", "t1", &vec_of("cpus:1")).unwrap();
        ledger.recover("a1", "t1", &vec_of("cpus:2"));
    }

    #[test]
    fn remove_agent_returns_outstanding_allocations() {
        let mut ledger = ledger_with_agent("a1", "cpus:4;mem:2048");
        ledger.allocate("a1", "t1", &vec_of("cpus:1;mem:512")).unwrap();
        ledger.allocate("a1", "t2", &vec_of("cpus:2;mem:1024")).unwrap();

        let dropped = ledger.remove_agent("a1").unwrap();
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped.get("t1"), Some(&vec_of("cpus:1;mem:512")));
        assert!(!ledger.contains_agent("a1"));
        assert!(ledger.remove_agent("a1").is_none());
    }

    #[test]
    fn cluster_total_sums_agents() {
        let mut ledger = ledger_with_agent("a1", "cpus:2;mem:1024");
        ledger.add_agent("a2", vec_of("cpus:1;mem:512"), Attributes::new());
        assert_eq!(ledger.cluster_total(), vec_of("cpus:3;mem:1536"));
    }

    #[test]
    fn allocations_of_spans_agents() {
        let mut ledger = ledger_with_agent("a1", "cpus:2");
        ledger.add_agent("a2", vec_of("cpus:2"), Attributes::new());
        ledger.allocate("a1", "t1", &vec_of("cpus:1")).unwrap();
        ledger.allocate("a2", "t1", &vec_of("cpus:2")).unwrap();

        let held = ledger.allocations_of("t1");
        assert_eq!(held.len(), 2);
        assert_eq!(held[0], ("a1".to_string(), vec_of("cpus:1")));
        assert_eq!(held[1], ("a2".to_string(), vec_of("cpus:2")));
    }

    #[test]
    fn agent_ids_sorted() {
        let mut ledger = ledger_with_agent("zeta", "cpus:1");
        ledger.add_agent("alpha", vec_of("cpus:1"), Attributes::new());
        assert_eq!(ledger.agent_ids(), vec!["alpha", "zeta"]);
    }
}
