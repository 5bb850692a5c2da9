//! nodepool.toml configuration parser.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::NodeGroupOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// How often node groups are re-evaluated (e.g., "60s", "5m").
    #[serde(default = "default_scan_interval")]
    pub scan_interval: String,
    /// Global simulation switch, applied on top of the per-group flag.
    #[serde(default)]
    pub dry_mode: bool,
    #[serde(default)]
    pub node_groups: Vec<NodeGroupConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeGroupConfig {
    pub name: String,
    pub min_nodes: usize,
    pub max_nodes: usize,
    #[serde(default)]
    pub dry_mode: bool,
}

fn default_scan_interval() -> String {
    "60s".to_string()
}

impl ControllerConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Self::parse(content, "<inline>")
    }

    fn parse(content: &str, origin: &str) -> ConfigResult<Self> {
        let config: ControllerConfig =
            toml::from_str(content).map_err(|source| ConfigError::Parse {
                origin: origin.to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.node_groups.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[node_groups]] entry is required".to_string(),
            ));
        }

        parse_interval(&self.scan_interval)?;

        let mut seen = HashSet::new();
        for group in &self.node_groups {
            if group.name.trim().is_empty() {
                return Err(ConfigError::Invalid("node group name must not be empty".to_string()));
            }
            if !seen.insert(group.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate node group name: {}",
                    group.name
                )));
            }
            if group.min_nodes > group.max_nodes {
                return Err(ConfigError::Invalid(format!(
                    "node group {}: min_nodes ({}) exceeds max_nodes ({})",
                    group.name, group.min_nodes, group.max_nodes
                )));
            }
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> ConfigResult<Duration> {
        parse_interval(&self.scan_interval)
    }

    /// Resolve the options for every group, folding in the global dry-run switch.
    pub fn group_options(&self) -> Vec<NodeGroupOptions> {
        self.node_groups
            .iter()
            .map(|g| NodeGroupOptions {
                name: g.name.clone(),
                min_nodes: g.min_nodes,
                max_nodes: g.max_nodes,
                dry_mode: self.dry_mode || g.dry_mode,
            })
            .collect()
    }
}

/// Parse an interval like "30s", "5m", or bare seconds.
fn parse_interval(s: &str) -> ConfigResult<Duration> {
    let s = s.trim();
    let (digits, scale) = if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else if let Some(mins) = s.strip_suffix('m') {
        (mins, 60)
    } else {
        (s, 1)
    };

    match digits.parse::<u64>() {
        Ok(n) if n > 0 => Ok(Duration::from_secs(n * scale)),
        _ => Err(ConfigError::Invalid(format!("invalid scan_interval: {s:?}"))),
    }
}
