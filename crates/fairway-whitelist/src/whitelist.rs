//! The whitelist value type.

use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;

/// Errors loading a whitelist source.
#[derive(Debug, Error)]
pub enum WhitelistError {
    #[error("failed to read whitelist {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The set of agents currently eligible to have resources offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Whitelist {
    /// No list configured: every agent is eligible.
    AllowAll,
    /// Only the named hosts are eligible.
    Hosts(BTreeSet<String>),
}

impl Whitelist {
    /// Load from a hosts file: one hostname per line, blank lines and
    /// `#` comments ignored.
    pub fn load(path: &Path) -> Result<Whitelist, WhitelistError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            WhitelistError::Unreadable {
                path: path.display().to_string(),
                source,
            }
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse hosts-file content.
    pub fn parse(content: &str) -> Whitelist {
        let hosts: BTreeSet<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Whitelist::Hosts(hosts)
    }

    /// Is this agent eligible for offers?
    pub fn permits(&self, host: &str) -> bool {
        match self {
            Whitelist::AllowAll => true,
            Whitelist::Hosts(hosts) => hosts.contains(host),
        }
    }

    /// Hosts permitted by `self` but not by `before`. Used to decide
    /// whether a whitelist change can create newly offerable capacity.
    pub fn widened_from(&self, before: &Whitelist) -> bool {
        match (before, self) {
            (Whitelist::AllowAll, Whitelist::AllowAll) => false,
            (Whitelist::Hosts(_), Whitelist::AllowAll) => true,
            (Whitelist::AllowAll, Whitelist::Hosts(_)) => false,
            (Whitelist::Hosts(old), Whitelist::Hosts(new)) => {
                new.iter().any(|host| !old.contains(host))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_permits_everything() {
        assert!(Whitelist::AllowAll.permits("anything"));
    }

    #[test]
    fn parse_skips_blanks_and_comments() {
        let wl = Whitelist::parse("agent1\n\n# a comment\n  agent2  \n");
        assert!(wl.permits("agent1"));
        assert!(wl.permits("agent2"));
        assert!(!wl.permits("# a comment"));
        assert!(!wl.permits("agent3"));
    }

    #[test]
    fn empty_file_permits_nothing() {
        let wl = Whitelist::parse("");
        assert!(!wl.permits("agent1"));
    }

    #[test]
    fn widening_detection() {
        let narrow = Whitelist::parse("agent1");
        let wide = Whitelist::parse("agent1\nagent2");

        assert!(wide.widened_from(&narrow));
        assert!(!narrow.widened_from(&wide));
        assert!(Whitelist::AllowAll.widened_from(&narrow));
        assert!(!narrow.widened_from(&Whitelist::AllowAll));
        assert!(!wide.widened_from(&wide.clone()));
    }
}
