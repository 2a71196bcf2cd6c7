//! Cluster descriptor rendering
//!
//! Maps the planned node records to the `cluster.yml` consumed by the
//! cluster-bring-up tool. Typed structs serialized with serde_yaml,
//! one entry per node in plan order.

use serde::Serialize;

use crate::cluster::NodeRecord;

/// Top-level structure of the rendered descriptor
#[derive(Debug, Clone, Serialize)]
pub struct ClusterDescriptor {
    pub nodes: Vec<DescriptorNode>,
}

/// One node entry in the descriptor
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorNode {
    /// Public address, used by the bring-up tool to reach the node
    pub address: String,
    pub internal_address: String,
    pub hostname_override: String,
    pub user: String,
    pub role: Vec<&'static str>,
}

/// Build the descriptor from node records.
pub fn descriptor(records: &[NodeRecord]) -> ClusterDescriptor {
    ClusterDescriptor {
        nodes: records
            .iter()
            .map(|record| DescriptorNode {
                address: record.public_address.clone(),
                internal_address: record.internal_address.clone(),
                hostname_override: record.name.clone(),
                user: record.user.clone(),
                role: record.roles.names(),
            })
            .collect(),
    }
}

/// Render the descriptor as YAML.
pub fn render_yaml(records: &[NodeRecord]) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(&descriptor(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{build_records, plan};
    use crate::config::{PoolConfig, PoolUsage};
    use std::collections::BTreeMap;

    fn sample_records(count: usize) -> Vec<NodeRecord> {
        let mut interfaces = BTreeMap::new();
        interfaces.insert(
            "ens192".to_string(),
            PoolConfig {
                usage: PoolUsage::Public,
                pool: (0..count).map(|i| format!("10.0.0.{}/24", i + 11)).collect(),
                gateway: "10.0.0.1".to_string(),
            },
        );
        interfaces.insert(
            "ens224".to_string(),
            PoolConfig {
                usage: PoolUsage::Internal,
                pool: (0..count).map(|i| format!("10.1.0.{}/24", i + 11)).collect(),
                gateway: "10.1.0.1".to_string(),
            },
        );
        build_records(&plan(count, "node"), &interfaces, "rke").unwrap()
    }

    #[test]
    fn test_descriptor_entries() {
        let desc = descriptor(&sample_records(4));
        assert_eq!(desc.nodes.len(), 4);

        let first = &desc.nodes[0];
        assert_eq!(first.address, "10.0.0.11");
        assert_eq!(first.internal_address, "10.1.0.11");
        assert_eq!(first.hostname_override, "node1");
        assert_eq!(first.user, "rke");
        assert_eq!(first.role, vec!["controlplane", "etcd"]);

        assert_eq!(desc.nodes[2].role, vec!["controlplane", "etcd"]);
        assert_eq!(desc.nodes[3].role, vec!["worker"]);
    }

    #[test]
    fn test_yaml_round() {
        let yaml = render_yaml(&sample_records(2)).unwrap();
        assert!(yaml.contains("address: 10.0.0.11"));
        assert!(yaml.contains("hostname_override: node2"));
        assert!(yaml.contains("- worker"));

        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed["nodes"].as_sequence().unwrap().len(), 2);
    }
}
