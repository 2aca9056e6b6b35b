//! fairway-allocator — the allocation decision engine.
//!
//! The engine decides which agent resources to offer to which tenant,
//! and when. It owns the resource ledger, the fairness sorter, and the
//! offer filter table, and reacts to lifecycle events from the
//! embedding cluster manager. It never talks to agents and never
//! executes anything; its only output is a stream of [`Offer`]s.
//!
//! # Architecture
//!
//! ```text
//! Allocator (handle, cloneable)
//!   └── mailbox (mpsc, processed strictly FIFO)
//!        └── Engine task
//!             ├── ResourceLedger   (authoritative availability)
//!             ├── dyn Sorter       (DRF ranking, pluggable)
//!             ├── OfferFilterTable (decline holds)
//!             ├── Whitelist        (agent eligibility)
//!             └── offers channel ──► embedding manager
//! ```
//!
//! The engine is a single logical actor: every lifecycle call and every
//! allocation pass is serialized through its mailbox, so no internal
//! locking exists and no two mutations ever race. Senders may be
//! concurrent and arbitrarily delayed relative to each other, which is
//! why recovery for an already-removed tenant or agent is a defined
//! no-op rather than an error.

pub mod config;
pub mod engine;
pub mod handle;
pub mod types;

pub(crate) mod message;

pub use config::AllocatorConfig;
pub use handle::Allocator;
pub use types::{AgentOffer, Offer, TenantInfo};
