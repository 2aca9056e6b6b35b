//! Engine mailbox messages.

use std::time::Duration;

use tokio::sync::oneshot;

use fairway_resources::{Attributes, ResourceVector};
use fairway_whitelist::Whitelist;

use crate::types::TenantInfo;

/// Lifecycle events delivered to the engine, processed strictly in
/// arrival order.
pub(crate) enum Message {
    AddTenant {
        id: String,
        info: TenantInfo,
    },
    RemoveTenant {
        id: String,
    },
    ActivateTenant {
        id: String,
    },
    DeactivateTenant {
        id: String,
    },
    AddAgent {
        id: String,
        total: ResourceVector,
        attributes: Attributes,
    },
    RemoveAgent {
        id: String,
    },
    ResourcesUnused {
        tenant: String,
        agent: String,
        resources: ResourceVector,
        filter_duration: Duration,
    },
    ResourcesRecovered {
        tenant: String,
        agent: String,
        resources: ResourceVector,
    },
    UpdateWhitelist(Whitelist),
    /// Barrier: replies once every earlier message has been processed.
    Settled(oneshot::Sender<()>),
}
