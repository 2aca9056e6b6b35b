//! The public, cloneable handle to a running engine.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use fairway_resources::{Attributes, ResourceVector};
use fairway_sorter::{DrfSorter, Sorter};
use fairway_whitelist::Whitelist;

use crate::config::AllocatorConfig;
use crate::engine::Engine;
use crate::message::Message;
use crate::types::{Offer, TenantInfo};

/// Handle to the allocator engine.
///
/// Spawning the engine is the one-time `initialize` step: it happens
/// exactly once per engine, before any operation can be sent, because
/// the operations live on the handle the spawn returns. All operations
/// are asynchronous fire-and-forget messages; the engine applies them
/// strictly in arrival order.
#[derive(Clone)]
pub struct Allocator {
    tx: mpsc::UnboundedSender<Message>,
}

impl Allocator {
    /// Spawn an engine with the default DRF fairness policy. Returns
    /// the handle and the stream of emitted offers.
    pub fn spawn(config: AllocatorConfig) -> (Allocator, mpsc::UnboundedReceiver<Offer>) {
        Self::spawn_with_sorter(config, Box::new(DrfSorter::new()))
    }

    /// Spawn an engine with a caller-chosen fairness policy.
    pub fn spawn_with_sorter(
        config: AllocatorConfig,
        sorter: Box<dyn Sorter>,
    ) -> (Allocator, mpsc::UnboundedReceiver<Offer>) {
        let (tx, mailbox) = mpsc::unbounded_channel();
        let (offers_tx, offers_rx) = mpsc::unbounded_channel();
        tokio::spawn(Engine::new(config, sorter, mailbox, offers_tx).run());
        (Allocator { tx }, offers_rx)
    }

    pub fn add_tenant(&self, id: impl Into<String>, info: TenantInfo) {
        self.send(Message::AddTenant {
            id: id.into(),
            info,
        });
    }

    pub fn remove_tenant(&self, id: impl Into<String>) {
        self.send(Message::RemoveTenant { id: id.into() });
    }

    pub fn activate_tenant(&self, id: impl Into<String>) {
        self.send(Message::ActivateTenant { id: id.into() });
    }

    pub fn deactivate_tenant(&self, id: impl Into<String>) {
        self.send(Message::DeactivateTenant { id: id.into() });
    }

    pub fn add_agent(
        &self,
        id: impl Into<String>,
        total: ResourceVector,
        attributes: Attributes,
    ) {
        self.send(Message::AddAgent {
            id: id.into(),
            total,
            attributes,
        });
    }

    pub fn remove_agent(&self, id: impl Into<String>) {
        self.send(Message::RemoveAgent { id: id.into() });
    }

    /// Report the unused remainder of an offer. A non-zero
    /// `filter_duration` keeps this agent out of the tenant's offers
    /// until it elapses.
    pub fn resources_unused(
        &self,
        tenant: impl Into<String>,
        agent: impl Into<String>,
        resources: ResourceVector,
        filter_duration: Duration,
    ) {
        self.send(Message::ResourcesUnused {
            tenant: tenant.into(),
            agent: agent.into(),
            resources,
            filter_duration,
        });
    }

    /// Report previously allocated resources becoming free (a task
    /// finished, a tenant shut down a workload). Safe to call for a
    /// tenant or agent that no longer exists.
    pub fn resources_recovered(
        &self,
        tenant: impl Into<String>,
        agent: impl Into<String>,
        resources: ResourceVector,
    ) {
        self.send(Message::ResourcesRecovered {
            tenant: tenant.into(),
            agent: agent.into(),
            resources,
        });
    }

    pub fn update_whitelist(&self, whitelist: Whitelist) {
        self.send(Message::UpdateWhitelist(whitelist));
    }

    /// Wait until every message sent before this call has been
    /// processed by the engine. Used by tests and orderly shutdown.
    pub async fn settled(&self) {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Message::Settled(reply_tx));
        let _ = reply_rx.await;
    }

    fn send(&self, message: Message) {
        if self.tx.send(message).is_err() {
            debug!("allocator engine is gone, message dropped");
        }
    }
}
