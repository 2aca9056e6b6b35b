//! Typed resource quantities.
//!
//! Three kinds mirror what agents advertise: scalars (cpus, mem),
//! integer ranges (ports), and discrete sets. Scalar comparisons use a
//! small epsilon so repeated add/subtract round trips stay stable.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Tolerance for scalar comparisons.
pub const EPSILON: f64 = 1e-9;

/// A single typed resource quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Quantity {
    /// A fractional amount, e.g. `cpus:2.5`.
    Scalar(f64),
    /// Inclusive integer ranges, sorted and coalesced, e.g.
    /// `ports:[31000-32000]`.
    Ranges(Vec<(u64, u64)>),
    /// A set of discrete items, e.g. `disk:{sda1,sda2}`.
    Set(BTreeSet<String>),
}

impl Quantity {
    /// True if the quantity holds nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Quantity::Scalar(v) => *v < EPSILON,
            Quantity::Ranges(r) => r.is_empty(),
            Quantity::Set(s) => s.is_empty(),
        }
    }

    /// The magnitude of the quantity as a single number: the scalar
    /// value, the total count of integers covered by the ranges, or the
    /// set cardinality. Used for dominant-share computation.
    pub fn amount(&self) -> f64 {
        match self {
            Quantity::Scalar(v) => *v,
            Quantity::Ranges(r) => {
                r.iter().map(|(b, e)| e - b + 1).sum::<u64>() as f64
            }
            Quantity::Set(s) => s.len() as f64,
        }
    }

    /// Merge another quantity of the same kind into this one.
    ///
    /// Mixing kinds under one resource name is a bookkeeping bug.
    pub fn merge(&mut self, other: &Quantity) {
        match (self, other) {
            (Quantity::Scalar(a), Quantity::Scalar(b)) => *a += b,
            (Quantity::Ranges(a), Quantity::Ranges(b)) => {
                a.extend_from_slice(b);
                *a = coalesce(a);
            }
            (Quantity::Set(a), Quantity::Set(b)) => {
                a.extend(b.iter().cloned());
            }
            (a, b) => panic!("mismatched resource kinds: {a:?} vs {b:?}"),
        }
    }

    /// Subtract `other`, returning `None` if any part of `other` is not
    /// held here (a quantity never goes negative).
    pub fn checked_sub(&self, other: &Quantity) -> Option<Quantity> {
        match (self, other) {
            (Quantity::Scalar(a), Quantity::Scalar(b)) => {
                if a + EPSILON < *b {
                    None
                } else {
                    Some(Quantity::Scalar((a - b).max(0.0)))
                }
            }
            (Quantity::Ranges(a), Quantity::Ranges(b)) => {
                if !ranges_contain(a, b) {
                    return None;
                }
                Some(Quantity::Ranges(ranges_sub(a, b)))
            }
            (Quantity::Set(a), Quantity::Set(b)) => {
                if !b.is_subset(a) {
                    return None;
                }
                Some(Quantity::Set(a.difference(b).cloned().collect()))
            }
            _ => None,
        }
    }

    /// Component containment: does this quantity cover all of `other`?
    pub fn contains(&self, other: &Quantity) -> bool {
        match (self, other) {
            (Quantity::Scalar(a), Quantity::Scalar(b)) => a + EPSILON >= *b,
            (Quantity::Ranges(a), Quantity::Ranges(b)) => ranges_contain(a, b),
            (Quantity::Set(a), Quantity::Set(b)) => b.is_subset(a),
            _ => false,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Scalar(v) => write!(f, "{v}"),
            Quantity::Ranges(ranges) => {
                write!(f, "[")?;
                for (i, (b, e)) in ranges.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{b}-{e}")?;
                }
                write!(f, "]")
            }
            Quantity::Set(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// Sort and merge overlapping or adjacent inclusive ranges.
pub(crate) fn coalesce(ranges: &[(u64, u64)]) -> Vec<(u64, u64)> {
    let mut sorted: Vec<(u64, u64)> = ranges.to_vec();
    sorted.sort_unstable();

    let mut out: Vec<(u64, u64)> = Vec::with_capacity(sorted.len());
    for (begin, end) in sorted {
        match out.last_mut() {
            Some((_, last_end)) if begin <= last_end.saturating_add(1) => {
                *last_end = (*last_end).max(end);
            }
            _ => out.push((begin, end)),
        }
    }
    out
}

/// Do the (coalesced) ranges in `a` cover every integer in `b`?
fn ranges_contain(a: &[(u64, u64)], b: &[(u64, u64)]) -> bool {
    b.iter().all(|(bb, be)| {
        a.iter().any(|(ab, ae)| ab <= bb && be <= ae)
    })
}

/// Subtract the integers covered by `b` from `a`. Assumes containment
/// was checked by the caller.
fn ranges_sub(a: &[(u64, u64)], b: &[(u64, u64)]) -> Vec<(u64, u64)> {
    let mut out: Vec<(u64, u64)> = a.to_vec();
    for &(bb, be) in b {
        let mut next: Vec<(u64, u64)> = Vec::with_capacity(out.len() + 1);
        for (ab, ae) in out {
            if be < ab || ae < bb {
                // Disjoint.
                next.push((ab, ae));
                continue;
            }
            if ab < bb {
                next.push((ab, bb - 1));
            }
            if be < ae {
                next.push((be + 1, ae));
            }
        }
        out = next;
    }
    out
}
