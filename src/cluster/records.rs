//! Node record assembly
//!
//! Merges a topology plan with the configured address pools into the
//! complete per-node records consumed by the provisioning sequencer and
//! the descriptor renderer. Side-effect-free; records are never mutated
//! after construction.

use std::collections::BTreeMap;

use crate::config::{ConfigError, PoolConfig, PoolUsage};

use super::pools::{self, strip_cidr};
use super::roles::RoleSet;
use super::topology::PlannedNode;

/// Static IP configuration for one guest interface of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkBinding {
    /// Interface identifier, the pool's key in the configuration
    pub interface: String,
    /// Resolved address with the CIDR prefix length stripped
    pub address: String,
    pub gateway: String,
    /// Only the public pool's interface may claim the default route
    pub default_route: bool,
}

/// Everything known about one node after planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub index: usize,
    pub name: String,
    pub roles: RoleSet,
    /// Administrative user for the cluster descriptor
    pub user: String,
    /// Resolved address on the public pool
    pub public_address: String,
    /// Resolved address on the internal pool
    pub internal_address: String,
    /// One binding per configured interface, in interface order
    pub bindings: Vec<NetworkBinding>,
}

/// Build one record per planned node, in plan order.
///
/// Addresses pair positionally: the node at index `i` takes position
/// `i` of every pool. Pool lengths are re-checked here so a short pool
/// fails before any record is handed out, not mid-iteration.
pub fn build_records(
    plan: &[PlannedNode],
    interfaces: &BTreeMap<String, PoolConfig>,
    user: &str,
) -> Result<Vec<NodeRecord>, ConfigError> {
    for (interface, pool) in interfaces {
        if pool.pool.len() < plan.len() {
            return Err(ConfigError::PoolTooSmall {
                interface: interface.clone(),
                have: pool.pool.len(),
                need: plan.len(),
            });
        }
    }

    let resolved = pools::resolve(interfaces)?;

    let records = plan
        .iter()
        .map(|node| {
            let bindings = interfaces
                .iter()
                .map(|(interface, pool)| NetworkBinding {
                    interface: interface.clone(),
                    address: strip_cidr(&pool.pool[node.index]).to_string(),
                    gateway: pool.gateway.clone(),
                    default_route: pool.usage == PoolUsage::Public,
                })
                .collect();

            NodeRecord {
                index: node.index,
                name: node.name.clone(),
                roles: node.roles,
                user: user.to_string(),
                public_address: strip_cidr(&resolved.public.pool[node.index]).to_string(),
                internal_address: strip_cidr(&resolved.internal.pool[node.index]).to_string(),
                bindings,
            }
        })
        .collect();

    Ok(records)
}
