//! Cluster configuration loading and validation
//!
//! The configuration file is plain JSON with three sections:
//! - `vsphere`: vCenter endpoint, credentials, and placement defaults
//! - `vm`: template image, node count, name prefix, administrative user
//! - `ip`: interface-name -> address pool mapping
//!
//! SBIO pattern: parsing and validation are pure functions; file I/O is
//! a thin wrapper at the bottom of the module.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that make a provisioning run unstartable.
///
/// Every variant is fatal: validation runs before any external command
/// is issued, so a bad configuration never produces side effects.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("Node count must be at least 1")]
    NoNodes,

    #[error("No address pool tagged '{0}' in the ip section")]
    MissingPool(&'static str),

    #[error("More than one address pool tagged '{0}'; exactly one is allowed")]
    DuplicatePool(&'static str),

    #[error("Pool for interface '{interface}' has {have} addresses but {need} nodes are requested")]
    PoolTooSmall {
        interface: String,
        have: usize,
        need: usize,
    },
}

/// The complete cluster configuration file structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterConfig {
    pub vsphere: VsphereConfig,
    pub vm: VmConfig,
    /// Interface name -> address pool. BTreeMap keeps per-interface
    /// iteration order deterministic across runs.
    pub ip: BTreeMap<String, PoolConfig>,
}

/// vCenter connection and placement settings for the govc gateway
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VsphereConfig {
    /// vCenter URL (e.g. "https://vcenter.example.com/sdk")
    pub vcenter: String,
    pub user: String,
    pub password: String,
    /// "true" to skip TLS verification; passed through to govc verbatim
    pub insecure: String,
    pub datacenter: String,
    pub datastore: String,
    /// Resource pool for cloned VMs
    pub respool: String,
    /// Guest OS credentials in "user:password" form, used by guest.* commands
    pub guestcredential: String,
}

/// Template and naming settings for the cluster nodes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VmConfig {
    /// Name of the base template VM to clone from
    pub base: String,
    /// Node name prefix; node i gets the name `{nameprefix}{i+1}`
    pub nameprefix: String,
    /// Number of nodes to provision
    pub num: usize,
    /// Administrative user recorded in the cluster descriptor
    pub user: String,
}

/// One named address pool bound to a guest network interface
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub usage: PoolUsage,
    /// Ordered CIDR-form addresses; node i takes position i
    pub pool: Vec<String>,
    pub gateway: String,
}

/// How a pool participates in cluster topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolUsage {
    /// Carries hostnames and the default route
    Public,
    /// Carries cluster-internal traffic
    Internal,
    /// Configured on the interface but ignored for topology
    #[default]
    Ignored,
}

impl<'de> Deserialize<'de> for PoolUsage {
    // Any tag other than public/internal means the pool is configured on
    // its interface but takes no part in topology.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "public" => PoolUsage::Public,
            "internal" => PoolUsage::Internal,
            _ => PoolUsage::Ignored,
        })
    }
}

// ============================================================================
// SBIO: Pure parsing and validation functions (no I/O)
// ============================================================================

/// Parse a JSON string into a ClusterConfig.
pub fn parse_config(content: &str) -> Result<ClusterConfig, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
}

/// Validate a configuration for provisioning.
///
/// Checks every precondition up front so that a run which starts can
/// build all of its node records: node count >= 1, exactly one public
/// and one internal pool, and every pool long enough to cover every
/// node index positionally.
pub fn validate_config(config: &ClusterConfig) -> Result<(), ConfigError> {
    if config.vm.num == 0 {
        return Err(ConfigError::NoNodes);
    }

    for usage in [PoolUsage::Public, PoolUsage::Internal] {
        let tag = usage_tag(usage);
        let count = config.ip.values().filter(|p| p.usage == usage).count();
        match count {
            0 => return Err(ConfigError::MissingPool(tag)),
            1 => {}
            _ => return Err(ConfigError::DuplicatePool(tag)),
        }
    }

    for (interface, pool) in &config.ip {
        if pool.pool.len() < config.vm.num {
            return Err(ConfigError::PoolTooSmall {
                interface: interface.clone(),
                have: pool.pool.len(),
                need: config.vm.num,
            });
        }
    }

    Ok(())
}

fn usage_tag(usage: PoolUsage) -> &'static str {
    match usage {
        PoolUsage::Public => "public",
        PoolUsage::Internal => "internal",
        PoolUsage::Ignored => "ignored",
    }
}

// ============================================================================
// SBIO: I/O wrapper - thin layer over pure functions
// ============================================================================

/// Load, parse, and validate a configuration file from disk.
pub fn load_config_file(path: &Path) -> Result<ClusterConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "vsphere": {
            "vcenter": "https://vcenter.example.com/sdk",
            "user": "administrator@vsphere.local",
            "password": "secret",
            "insecure": "true",
            "datacenter": "dc1",
            "datastore": "ds1",
            "respool": "*/Resources",
            "guestcredential": "root:secret"
        },
        "vm": {
            "base": "template-rocky9",
            "nameprefix": "node",
            "num": 4,
            "user": "rke"
        },
        "ip": {
            "ens192": {
                "usage": "public",
                "pool": ["10.0.0.11/24", "10.0.0.12/24", "10.0.0.13/24", "10.0.0.14/24"],
                "gateway": "10.0.0.1"
            },
            "ens224": {
                "usage": "internal",
                "pool": ["10.1.0.11/24", "10.1.0.12/24", "10.1.0.13/24", "10.1.0.14/24"],
                "gateway": "10.1.0.1"
            }
        }
    }"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.vm.num, 4);
        assert_eq!(config.vm.nameprefix, "node");
        assert_eq!(config.ip.len(), 2);
        assert_eq!(config.ip["ens192"].usage, PoolUsage::Public);
        assert_eq!(config.ip["ens224"].usage, PoolUsage::Internal);
    }

    #[test]
    fn test_unknown_usage_is_ignored() {
        let mut config = parse_config(SAMPLE).unwrap();
        let mut pool = config.ip["ens192"].clone();
        pool.usage = PoolUsage::Ignored;
        config.ip.insert("ens256".to_string(), pool);
        // An extra untagged pool does not break validation
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_sample() {
        let config = parse_config(SAMPLE).unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let mut config = parse_config(SAMPLE).unwrap();
        config.vm.num = 0;
        assert!(matches!(validate_config(&config), Err(ConfigError::NoNodes)));
    }

    #[test]
    fn test_missing_internal_pool_rejected() {
        let mut config = parse_config(SAMPLE).unwrap();
        config.ip.remove("ens224");
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingPool("internal"))
        ));
    }

    #[test]
    fn test_duplicate_public_pool_rejected() {
        let mut config = parse_config(SAMPLE).unwrap();
        let dup = config.ip["ens192"].clone();
        config.ip.insert("ens256".to_string(), dup);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::DuplicatePool("public"))
        ));
    }

    #[test]
    fn test_short_pool_rejected() {
        let mut config = parse_config(SAMPLE).unwrap();
        config.ip.get_mut("ens192").unwrap().pool.pop();
        match validate_config(&config) {
            Err(ConfigError::PoolTooSmall {
                interface,
                have,
                need,
            }) => {
                assert_eq!(interface, "ens192");
                assert_eq!(have, 3);
                assert_eq!(need, 4);
            }
            other => panic!("expected PoolTooSmall, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_load_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = load_config_file(file.path()).unwrap();
        assert_eq!(config.vm.base, "template-rocky9");
    }

    #[test]
    fn test_load_config_file_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        assert!(matches!(
            load_config_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
