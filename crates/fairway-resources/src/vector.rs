//! Resource vectors — named collections of typed quantities.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, ResourceResult};
use crate::quantity::Quantity;

/// Resource names the boundary parser accepts. The internal model is
/// open-ended; rejection of unknown names happens only at the textual
/// boundary (configuration, operator input).
const KNOWN_NAMES: &[&str] = &["cpus", "gpus", "mem", "disk", "ports"];

/// A vector of named resource quantities.
///
/// The map is ordered so that iteration, display, and hashing-free
/// comparisons are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceVector {
    entries: BTreeMap<String, Quantity>,
}

impl ResourceVector {
    /// An empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the boundary form `name:quantity;name:quantity`, e.g.
    /// `cpus:2;mem:1024;ports:[31000-32000]`.
    pub fn parse(input: &str) -> ResourceResult<Self> {
        let mut vector = ResourceVector::new();
        for segment in input.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (name, raw) = segment
                .split_once(':')
                .ok_or_else(|| ResourceError::Malformed(segment.to_string()))?;
            let name = name.trim();
            if !KNOWN_NAMES.contains(&name) {
                return Err(ResourceError::UnknownName(name.to_string()));
            }
            let quantity = parse_quantity(name, raw.trim())?;
            vector.insert(name, quantity);
        }
        Ok(vector)
    }

    /// Insert (merging with any existing quantity under the same name).
    /// Empty quantities are dropped so that vectors stay canonical and
    /// `cpus:2` compares equal to `cpus:2;mem:0`.
    pub fn insert(&mut self, name: &str, quantity: Quantity) {
        if quantity.is_empty() {
            return;
        }
        match self.entries.get_mut(name) {
            Some(existing) => existing.merge(&quantity),
            None => {
                self.entries.insert(name.to_string(), quantity);
            }
        }
    }

    /// Builder-style insert, handy in tests and defaults.
    pub fn with(mut self, name: &str, quantity: Quantity) -> Self {
        self.insert(name, quantity);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Quantity> {
        self.entries.get(name)
    }

    /// The scalar amount under `name`, or 0 if absent or non-scalar.
    pub fn scalar(&self, name: &str) -> f64 {
        match self.entries.get(name) {
            Some(Quantity::Scalar(v)) => *v,
            _ => 0.0,
        }
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Quantity)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The names present in this vector.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// True if every component is empty (or there are none).
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Quantity::is_empty)
    }

    /// Component-wise merge of `other` into this vector.
    pub fn add(&mut self, other: &ResourceVector) {
        for (name, quantity) in &other.entries {
            self.insert(name, quantity.clone());
        }
    }

    /// Component-wise subtraction. Returns `None` if any component of
    /// `other` is not fully held here; a vector never goes negative.
    pub fn checked_sub(&self, other: &ResourceVector) -> Option<ResourceVector> {
        let mut out = self.clone();
        for (name, quantity) in &other.entries {
            if quantity.is_empty() {
                continue;
            }
            let held = out.entries.get(name)?;
            let rest = held.checked_sub(quantity)?;
            if rest.is_empty() {
                out.entries.remove(name);
            } else {
                out.entries.insert(name.clone(), rest);
            }
        }
        Some(out)
    }

    /// Does this vector cover all of `other`, component-wise?
    pub fn contains(&self, other: &ResourceVector) -> bool {
        other.entries.iter().all(|(name, quantity)| {
            quantity.is_empty()
                || self
                    .entries
                    .get(name)
                    .is_some_and(|held| held.contains(quantity))
        })
    }
}

fn parse_quantity(name: &str, raw: &str) -> ResourceResult<Quantity> {
    if let Some(inner) = raw.strip_prefix('[') {
        let inner = inner
            .strip_suffix(']')
            .ok_or_else(|| ResourceError::MalformedRange(raw.to_string()))?;
        let mut ranges = Vec::new();
        for part in inner.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (begin, end) = part
                .split_once('-')
                .ok_or_else(|| ResourceError::MalformedRange(part.to_string()))?;
            let begin: u64 = begin
                .trim()
                .parse()
                .map_err(|_| ResourceError::MalformedRange(part.to_string()))?;
            let end: u64 = end
                .trim()
                .parse()
                .map_err(|_| ResourceError::MalformedRange(part.to_string()))?;
            if end < begin {
                return Err(ResourceError::MalformedRange(part.to_string()));
            }
            ranges.push((begin, end));
        }
        return Ok(Quantity::Ranges(crate::quantity::coalesce(&ranges)));
    }

    if let Some(inner) = raw.strip_prefix('{') {
        let inner = inner
            .strip_suffix('}')
            .ok_or_else(|| ResourceError::Malformed(raw.to_string()))?;
        let items: BTreeSet<String> = inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        return Ok(Quantity::Set(items));
    }

    let value: f64 = raw
        .parse()
        .map_err(|_| ResourceError::Malformed(raw.to_string()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ResourceError::Negative(name.to_string()));
    }
    Ok(Quantity::Scalar(value))
}

impl FromStr for ResourceVector {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceVector::parse(s)
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, quantity)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{name}:{quantity}")?;
        }
        Ok(())
    }
}
