//! Address pool resolution
//!
//! Classifies the configured interface pools by usage tag. The public
//! and internal pools carry the cluster topology (hostnames, default
//! route, descriptor addresses); pools with any other tag are still
//! configured on their interfaces but ignored here.

use std::collections::BTreeMap;

use crate::config::{ConfigError, PoolConfig, PoolUsage};

/// The two topology-bearing pools, with their interface names
#[derive(Debug, Clone, Copy)]
pub struct ResolvedPools<'a> {
    pub public_interface: &'a str,
    pub public: &'a PoolConfig,
    pub internal_interface: &'a str,
    pub internal: &'a PoolConfig,
}

/// Find the pools tagged `public` and `internal`.
///
/// Both must exist: the public pool carries hostnames and the default
/// route, the internal pool carries cluster traffic, and neither has a
/// substitute. Validation has already rejected duplicate tags.
pub fn resolve(interfaces: &BTreeMap<String, PoolConfig>) -> Result<ResolvedPools<'_>, ConfigError> {
    let find = |usage: PoolUsage| {
        interfaces
            .iter()
            .find(|(_, pool)| pool.usage == usage)
            .map(|(name, pool)| (name.as_str(), pool))
    };

    let (public_interface, public) =
        find(PoolUsage::Public).ok_or(ConfigError::MissingPool("public"))?;
    let (internal_interface, internal) =
        find(PoolUsage::Internal).ok_or(ConfigError::MissingPool("internal"))?;

    Ok(ResolvedPools {
        public_interface,
        public,
        internal_interface,
        internal,
    })
}

/// Strip the prefix length from a CIDR-form address: "10.0.0.11/24" -> "10.0.0.11".
pub fn strip_cidr(address: &str) -> &str {
    address.split('/').next().unwrap_or(address)
}
