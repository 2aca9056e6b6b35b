//! fairway-resources — the resource model shared across Fairway crates.
//!
//! A [`ResourceVector`] is a named collection of typed quantities
//! (`cpus:2;mem:1024;ports:[31000-32000]`). The textual form is the
//! boundary representation used in configuration and logs; internally
//! everything is a map from resource name to [`Quantity`].
//!
//! Arithmetic is component-wise: vectors can be added, subtracted
//! (checked, never allowed to go negative), and compared for
//! containment. [`Attributes`] carry opaque agent metadata in the same
//! `name:value;...` textual form.

pub mod attributes;
pub mod error;
pub mod quantity;
pub mod vector;

pub use attributes::Attributes;
pub use error::{ResourceError, ResourceResult};
pub use quantity::Quantity;
pub use vector::ResourceVector;
