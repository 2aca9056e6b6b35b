//! fairway.toml configuration parser.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FairwaydConfig {
    pub allocation: Option<AllocationSection>,
    pub whitelist: Option<WhitelistSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSection {
    /// Milliseconds between periodic allocation passes.
    pub interval_ms: Option<u64>,
    /// Floor below which an agent is not worth offering, in the
    /// textual resource form, e.g. "cpus:0.01;mem:32".
    pub min_allocatable: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhitelistSection {
    /// Hosts file with one agent hostname per line. Absent means every
    /// agent is eligible.
    pub path: Option<PathBuf>,
    /// Seconds between polls of the hosts file.
    pub poll_interval_secs: Option<u64>,
}

impl FairwaydConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FairwaydConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let toml = r#"
            [allocation]
            interval_ms = 500
            min_allocatable = "cpus:0.1;mem:64"

            [whitelist]
            path = "/etc/fairway/whitelist"
            poll_interval_secs = 10
        "#;
        let config: FairwaydConfig = toml::from_str(toml).unwrap();
        let allocation = config.allocation.unwrap();
        assert_eq!(allocation.interval_ms, Some(500));
        assert_eq!(allocation.min_allocatable.as_deref(), Some("cpus:0.1;mem:64"));
        let whitelist = config.whitelist.unwrap();
        assert_eq!(whitelist.path.unwrap(), PathBuf::from("/etc/fairway/whitelist"));
        assert_eq!(whitelist.poll_interval_secs, Some(10));
    }

    #[test]
    fn empty_config_is_valid() {
        let config: FairwaydConfig = toml::from_str("").unwrap();
        assert!(config.allocation.is_none());
        assert!(config.whitelist.is_none());
    }
}
