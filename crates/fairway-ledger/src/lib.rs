//! fairway-ledger — the source of truth for agent resources.
//!
//! The [`ResourceLedger`] tracks, per agent, the total resource vector,
//! the portion allocated to each tenant, and the remaining availability.
//! The allocator engine is its only caller; the ledger itself never
//! decides who gets what, it only enforces that bookkeeping stays
//! consistent (`allocated <= total`, component-wise, at all times).
//!
//! Stale recoveries (resources coming back for an agent or pairing the
//! ledger no longer tracks) are benign no-ops, because removal and
//! recovery notifications can race (delivery is asynchronous and
//! unordered between senders).

pub mod error;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use ledger::ResourceLedger;
