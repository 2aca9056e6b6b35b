//! Boundary types exchanged with the embedding manager.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use fairway_resources::ResourceVector;

/// Descriptor a tenant registers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub name: String,
    pub user: String,
    /// Resource role used for fairness grouping by role-aware sorters.
    pub role: String,
    /// How long a disconnected tenant may linger before the manager
    /// tears it down. The engine records it; grace-period expiry is the
    /// manager's call (it results in an explicit `remove_tenant`).
    pub failover_timeout: Option<Duration>,
}

impl TenantInfo {
    pub fn new(name: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: user.into(),
            role: "*".to_string(),
            failover_timeout: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_failover_timeout(mut self, timeout: Duration) -> Self {
        self.failover_timeout = Some(timeout);
        self
    }
}

/// One agent's contribution to an offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOffer {
    pub agent_id: String,
    pub resources: ResourceVector,
}

/// A proposed set of agent resources for one tenant, produced by a
/// single allocation pass. Offers are never retracted by the engine;
/// the tenant declines or times them out via `resources_unused`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub tenant_id: String,
    pub allocations: Vec<AgentOffer>,
}

impl Offer {
    /// Sum of the offered vectors across agents.
    pub fn total_resources(&self) -> ResourceVector {
        let mut total = ResourceVector::new();
        for allocation in &self.allocations {
            total.add(&allocation.resources);
        }
        total
    }
}
