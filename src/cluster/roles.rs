//! Role assignment policy
//!
//! A node is either part of the control set (controller + etcd, always
//! together) or a plain worker, never both. The policy keeps a 3-node
//! control set once the cluster grows past 3 nodes, and a single
//! control node below that, so any cluster of N >= 1 has at least one
//! controller and large clusters get an etcd quorum.

use serde::{Deserialize, Serialize};

/// Size of the control set for clusters larger than the threshold
pub const CONTROL_SET_SIZE: usize = 3;

/// A node's membership in the cluster roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    pub controller: bool,
    pub etcd: bool,
    pub worker: bool,
}

impl RoleSet {
    /// Controller + etcd, the roles always co-occur
    pub fn control_plane() -> Self {
        Self {
            controller: true,
            etcd: true,
            worker: false,
        }
    }

    /// Worker only, exclusive with the control roles
    pub fn worker() -> Self {
        Self {
            controller: false,
            etcd: false,
            worker: true,
        }
    }

    /// Role names as they appear in the cluster descriptor
    pub fn names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.controller {
            names.push("controlplane");
        }
        if self.etcd {
            names.push("etcd");
        }
        if self.worker {
            names.push("worker");
        }
        names
    }
}

/// Assign roles to the node at `index` in a cluster of `total` nodes.
///
/// Clusters of more than [`CONTROL_SET_SIZE`] nodes dedicate the first
/// [`CONTROL_SET_SIZE`] indices to controller + etcd; smaller clusters
/// dedicate only index 0. Everything else is a worker.
pub fn assign_roles(index: usize, total: usize) -> RoleSet {
    let control_nodes = if total > CONTROL_SET_SIZE {
        CONTROL_SET_SIZE
    } else {
        1
    };

    if index < control_nodes {
        RoleSet::control_plane()
    } else {
        RoleSet::worker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_roles_co_occur() {
        let roles = RoleSet::control_plane();
        assert!(roles.controller);
        assert!(roles.etcd);
        assert!(!roles.worker);
    }

    #[test]
    fn test_worker_is_exclusive() {
        let roles = RoleSet::worker();
        assert!(!roles.controller);
        assert!(!roles.etcd);
        assert!(roles.worker);
    }

    #[test]
    fn test_small_cluster_single_controller() {
        for total in 1..=3 {
            assert_eq!(assign_roles(0, total), RoleSet::control_plane());
            for index in 1..total {
                assert_eq!(assign_roles(index, total), RoleSet::worker());
            }
        }
    }

    #[test]
    fn test_large_cluster_three_controllers() {
        for total in 4..=8 {
            for index in 0..total {
                let expected = if index < 3 {
                    RoleSet::control_plane()
                } else {
                    RoleSet::worker()
                };
                assert_eq!(assign_roles(index, total), expected, "index {index} of {total}");
            }
        }
    }

    #[test]
    fn test_threshold_boundary() {
        // N=3 keeps a single controller; N=4 jumps to three
        assert_eq!(assign_roles(1, 3), RoleSet::worker());
        assert_eq!(assign_roles(1, 4), RoleSet::control_plane());
        assert_eq!(assign_roles(2, 4), RoleSet::control_plane());
        assert_eq!(assign_roles(3, 4), RoleSet::worker());
    }

    #[test]
    fn test_no_node_is_both() {
        for total in 1..=10 {
            for index in 0..total {
                let roles = assign_roles(index, total);
                assert!(roles.worker != (roles.controller || roles.etcd));
            }
        }
    }

    #[test]
    fn test_descriptor_names() {
        assert_eq!(RoleSet::control_plane().names(), vec!["controlplane", "etcd"]);
        assert_eq!(RoleSet::worker().names(), vec!["worker"]);
    }
}
