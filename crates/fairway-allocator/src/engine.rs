//! The engine task: lifecycle handlers and the allocation pass.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use fairway_filter::OfferFilterTable;
use fairway_ledger::ResourceLedger;
use fairway_resources::{Attributes, Quantity, ResourceVector};
use fairway_sorter::Sorter;
use fairway_whitelist::Whitelist;

use crate::config::AllocatorConfig;
use crate::message::Message;
use crate::types::{AgentOffer, Offer, TenantInfo};

/// Per-tenant engine state.
struct TenantRecord {
    #[allow(dead_code)] // surfaced to role-aware sorters and diagnostics
    info: TenantInfo,
    active: bool,
}

/// The allocator engine. Owns all allocation state exclusively; runs
/// as a single task draining its mailbox FIFO.
pub struct Engine {
    config: AllocatorConfig,
    ledger: ResourceLedger,
    sorter: Box<dyn Sorter>,
    filters: OfferFilterTable,
    whitelist: Whitelist,
    tenants: HashMap<String, TenantRecord>,
    mailbox: mpsc::UnboundedReceiver<Message>,
    offers_tx: mpsc::UnboundedSender<Offer>,
}

impl Engine {
    pub(crate) fn new(
        config: AllocatorConfig,
        sorter: Box<dyn Sorter>,
        mailbox: mpsc::UnboundedReceiver<Message>,
        offers_tx: mpsc::UnboundedSender<Offer>,
    ) -> Self {
        let whitelist = config.initial_whitelist.clone();
        Self {
            config,
            ledger: ResourceLedger::new(),
            sorter,
            filters: OfferFilterTable::new(),
            whitelist,
            tenants: HashMap::new(),
            mailbox,
            offers_tx,
        }
    }

    /// Drain the mailbox until every handle is dropped, running the
    /// periodic allocation pass in between.
    pub(crate) async fn run(mut self) {
        let mut interval = tokio::time::interval(self.config.allocation_interval);
        info!(
            interval = ?self.config.allocation_interval,
            "allocator engine started"
        );

        loop {
            tokio::select! {
                maybe = self.mailbox.recv() => match maybe {
                    Some(message) => self.handle(message),
                    None => break,
                },
                _ = interval.tick() => self.allocate_all(),
            }
        }
        info!("allocator engine stopped");
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::AddTenant { id, info } => self.add_tenant(&id, info),
            Message::RemoveTenant { id } => self.remove_tenant(&id),
            Message::ActivateTenant { id } => self.activate_tenant(&id),
            Message::DeactivateTenant { id } => self.deactivate_tenant(&id),
            Message::AddAgent {
                id,
                total,
                attributes,
            } => self.add_agent(&id, total, attributes),
            Message::RemoveAgent { id } => self.remove_agent(&id),
            Message::ResourcesUnused {
                tenant,
                agent,
                resources,
                filter_duration,
            } => self.resources_unused(&tenant, &agent, &resources, filter_duration),
            Message::ResourcesRecovered {
                tenant,
                agent,
                resources,
            } => self.resources_recovered(&tenant, &agent, &resources),
            Message::UpdateWhitelist(whitelist) => self.update_whitelist(whitelist),
            Message::Settled(reply) => {
                let _ = reply.send(());
            }
        }
    }

    // ── Tenant lifecycle ────────────────────────────────────────────

    fn add_tenant(&mut self, id: &str, info: TenantInfo) {
        if self.tenants.contains_key(id) {
            warn!(tenant = %id, "duplicate tenant registration ignored");
            return;
        }
        info!(tenant = %id, name = %info.name, user = %info.user, "tenant added");
        self.tenants
            .insert(id.to_string(), TenantRecord { info, active: true });
        self.sorter.add(id);
        self.allocate_all();
    }

    fn remove_tenant(&mut self, id: &str) {
        if self.tenants.remove(id).is_none() {
            warn!(tenant = %id, "removal of unknown tenant ignored");
            return;
        }
        // Release everything the tenant held back to the agents'
        // available pools before it disappears from the sorter.
        for (agent, resources) in self.ledger.allocations_of(id) {
            self.ledger.recover(&agent, id, &resources);
        }
        self.sorter.remove(id);
        self.filters.remove_tenant(id);
        info!(tenant = %id, "tenant removed");
        self.allocate_all();
    }

    fn activate_tenant(&mut self, id: &str) {
        let Some(record) = self.tenants.get_mut(id) else {
            warn!(tenant = %id, "activation of unknown tenant ignored");
            return;
        };
        record.active = true;
        self.sorter.activate(id);
        debug!(tenant = %id, "tenant activated");
        self.allocate_all();
    }

    fn deactivate_tenant(&mut self, id: &str) {
        let Some(record) = self.tenants.get_mut(id) else {
            warn!(tenant = %id, "deactivation of unknown tenant ignored");
            return;
        };
        // Allocation stays: its running work is unaffected; it simply
        // receives no new offers. Its filters are dropped so a
        // failed-over instance starts from a clean slate.
        record.active = false;
        self.sorter.deactivate(id);
        self.filters.remove_tenant(id);
        debug!(tenant = %id, "tenant deactivated");
    }

    // ── Agent lifecycle ─────────────────────────────────────────────

    fn add_agent(&mut self, id: &str, total: ResourceVector, attributes: Attributes) {
        if !self.ledger.add_agent(id, total.clone(), attributes) {
            return;
        }
        info!(agent = %id, %total, "agent added");
        self.sorter.update_total(&self.ledger.cluster_total());
        self.allocate_all();
    }

    fn remove_agent(&mut self, id: &str) {
        let Some(dropped) = self.ledger.remove_agent(id) else {
            return;
        };
        // Every tenant that held resources on this agent gives up that
        // share; the freed amounts must never be offered again.
        for (tenant, resources) in &dropped {
            self.sorter.unallocated(tenant, resources);
        }
        self.filters.remove_agent(id);
        self.sorter.update_total(&self.ledger.cluster_total());
        info!(agent = %id, tenants_reconciled = dropped.len(), "agent removed");
    }

    // ── Resource flow ───────────────────────────────────────────────

    fn resources_unused(
        &mut self,
        tenant: &str,
        agent: &str,
        resources: &ResourceVector,
        filter_duration: std::time::Duration,
    ) {
        if resources.is_empty() {
            return;
        }
        if !self.try_recover(tenant, agent, resources) {
            return;
        }
        debug!(%tenant, %agent, %resources, "unused resources returned");
        if filter_duration.is_zero() {
            // Immediately offerable again.
            self.allocate_all();
        } else {
            self.filters.add_filter(tenant, agent, filter_duration);
        }
    }

    fn resources_recovered(
        &mut self,
        tenant: &str,
        agent: &str,
        resources: &ResourceVector,
    ) {
        if resources.is_empty() {
            return;
        }
        if self.try_recover(tenant, agent, resources) {
            debug!(%tenant, %agent, %resources, "resources recovered");
            self.allocate_all();
        }
    }

    /// Return resources to the ledger and keep the sorter in step.
    ///
    /// Recovery can race with tenant/agent removal, so a pairing the
    /// ledger no longer tracks is a benign no-op (the removal path
    /// already reconciled all bookkeeping).
    fn try_recover(&mut self, tenant: &str, agent: &str, resources: &ResourceVector) -> bool {
        let live = self
            .ledger
            .allocation_on(agent, tenant)
            .is_some_and(|held| held.contains(resources));
        if !live {
            if self.ledger.allocation_on(agent, tenant).is_some() {
                // Both parties exist but the amount doesn't: that's a
                // bookkeeping bug, not a race. Let the ledger assert.
                self.ledger.recover(agent, tenant, resources);
            }
            debug!(%tenant, %agent, "stale resource recovery ignored");
            return false;
        }
        self.ledger.recover(agent, tenant, resources);
        self.sorter.unallocated(tenant, resources);
        true
    }

    fn update_whitelist(&mut self, whitelist: Whitelist) {
        let widened = whitelist.widened_from(&self.whitelist);
        info!(?whitelist, widened, "whitelist updated");
        self.whitelist = whitelist;
        if widened {
            // Previously blocked agents may now be offerable.
            self.allocate_all();
        }
    }

    // ── The allocation pass ─────────────────────────────────────────

    /// One deterministic pass: walk active tenants most-starved first
    /// and hand each one every whitelisted, unfiltered agent whose
    /// availability is worth offering. Ledger state is updated as
    /// assignments are made, so later tenants in the same pass see the
    /// reduced availability; sorter positions only shift for the
    /// *next* pass.
    fn allocate_all(&mut self) {
        let order = self.sorter.order();
        if order.is_empty() {
            return;
        }
        let agents = self.ledger.agent_ids();

        for tenant in order {
            let mut allocations: Vec<AgentOffer> = Vec::new();

            for agent in &agents {
                if !self.whitelist.permits(agent) {
                    continue;
                }
                if self.filters.is_filtered(&tenant, agent) {
                    continue;
                }
                let Some(available) = self.ledger.available_on(agent) else {
                    continue;
                };
                if available.is_empty() || !self.allocatable(available) {
                    continue;
                }

                let resources = available.clone();
                if let Err(e) = self.ledger.allocate(agent, &tenant, &resources) {
                    // Availability was checked just above; reaching
                    // here means the ledger and the pass disagree.
                    error!(%tenant, %agent, error = %e, "allocation failed mid-pass");
                    continue;
                }
                self.sorter.allocated(&tenant, &resources);
                allocations.push(AgentOffer {
                    agent_id: agent.clone(),
                    resources,
                });
            }

            if allocations.is_empty() {
                continue;
            }
            let offer = Offer {
                tenant_id: tenant.clone(),
                allocations,
            };
            info!(
                tenant = %offer.tenant_id,
                agents = offer.allocations.len(),
                resources = %offer.total_resources(),
                "offer emitted"
            );
            if self.offers_tx.send(offer).is_err() {
                debug!("offer receiver dropped, offer discarded");
            }
        }
    }

    /// Worth offering? True when the vector meets or exceeds the
    /// configured minimum in at least one minimum-bearing component.
    fn allocatable(&self, available: &ResourceVector) -> bool {
        if self.config.min_allocatable.is_empty() {
            return true;
        }
        self.config.min_allocatable.iter().any(|(name, min)| {
            let held = available.get(name).map_or(0.0, Quantity::amount);
            held >= min.amount()
        })
    }
}
