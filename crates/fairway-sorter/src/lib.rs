//! fairway-sorter — fairness ranking for the allocation pass.
//!
//! A [`Sorter`] tracks a set of clients (tenants), each with a running
//! resource allocation, and produces the order in which the allocator
//! engine should consider them. The shipped implementation is
//! [`DrfSorter`], which ranks clients ascending by dominant resource
//! share. The engine depends only on the trait, so alternative fairness
//! policies can be swapped in at construction time.

pub mod drf;

pub use drf::DrfSorter;

use fairway_resources::ResourceVector;

/// Ranking policy over allocation clients.
///
/// All mutations are synchronous and infallible; feeding a client the
/// sorter does not know is a caller bug for `allocated`/`unallocated`
/// and a no-op for the lifecycle toggles.
pub trait Sorter: Send {
    /// Register a client. Starts active with an empty allocation.
    fn add(&mut self, client: &str);

    /// Unregister a client, clearing its allocation contribution.
    fn remove(&mut self, client: &str);

    /// Make a client eligible for `order()` again.
    fn activate(&mut self, client: &str);

    /// Hide a client from `order()` without touching its allocation.
    fn deactivate(&mut self, client: &str);

    /// Record resources newly allocated to a client.
    fn allocated(&mut self, client: &str, delta: &ResourceVector);

    /// Record resources returned by a client. Subtracting more than the
    /// client holds is a bookkeeping bug and asserts.
    fn unallocated(&mut self, client: &str, delta: &ResourceVector);

    /// Replace the cluster-wide totals used as the share denominator.
    fn update_total(&mut self, total: &ResourceVector);

    /// The client's current tracked allocation, if registered.
    fn allocation(&self, client: &str) -> Option<&ResourceVector>;

    fn contains(&self, client: &str) -> bool;

    /// Active clients in allocation order (most starved first).
    fn order(&self) -> Vec<String>;
}
