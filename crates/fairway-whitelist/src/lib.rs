//! fairway-whitelist — which agents may have resources offered.
//!
//! A [`Whitelist`] is either "allow all" (no list configured) or an
//! explicit set of agent hostnames. The [`WhitelistWatcher`] polls a
//! file source (one hostname per line) off the allocator's critical
//! path and delivers each *changed* list to an async callback; the
//! engine then recomputes agent eligibility.

pub mod watcher;
pub mod whitelist;

pub use watcher::{WatcherHandle, WhitelistCallback, WhitelistWatcher};
pub use whitelist::{Whitelist, WhitelistError};
