//! Agent attribute metadata.
//!
//! Attributes are opaque `name:value` pairs attached to an agent
//! (rack, zone, OS flavor). The allocator carries them through to
//! offers without interpreting them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ResourceError;

/// Ordered `name -> value` agent metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    entries: BTreeMap<String, String>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the `name:value;name:value` textual form.
    pub fn parse(input: &str) -> Result<Self, ResourceError> {
        let mut attrs = Attributes::new();
        for segment in input.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            let (name, value) = segment
                .split_once(':')
                .ok_or_else(|| ResourceError::Malformed(segment.to_string()))?;
            attrs
                .entries
                .insert(name.trim().to_string(), value.trim().to_string());
        }
        Ok(attrs)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromStr for Attributes {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attributes::parse(s)
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, "{name}:{value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_lookup() {
        let attrs = Attributes::parse("rack:r1;os:linux").unwrap();
        assert_eq!(attrs.get("rack"), Some("r1"));
        assert_eq!(attrs.get("os"), Some("linux"));
        assert_eq!(attrs.get("zone"), None);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(Attributes::parse("").unwrap().is_empty());
        assert!(Attributes::parse(" ; ").unwrap().is_empty());
    }

    #[test]
    fn malformed_segment_is_rejected() {
        assert!(Attributes::parse("rack").is_err());
    }

    #[test]
    fn display_round_trip() {
        let attrs = Attributes::parse("os:linux;rack:r1").unwrap();
        assert_eq!(attrs.to_string(), "os:linux;rack:r1");
    }
}
