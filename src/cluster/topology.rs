//! Topology planning - derive node identities and roles
//!
//! Pure functions of the cluster size and name prefix; no I/O. The
//! ordinal index of a node decides both its role and which address it
//! takes from every pool, so plan order is significant and stable.

use super::roles::{assign_roles, RoleSet};

/// One planned node: identity plus assigned roles, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedNode {
    /// Ordinal index in `[0, N)`
    pub index: usize,
    /// Derived name, `{prefix}{index + 1}`
    pub name: String,
    pub roles: RoleSet,
}

/// Plan a cluster of `count` nodes named `{prefix}1 .. {prefix}{count}`.
///
/// `count == 0` yields an empty plan; rejecting that is the caller's
/// job (configuration validation), not the planner's.
pub fn plan(count: usize, prefix: &str) -> Vec<PlannedNode> {
    (0..count)
        .map(|index| PlannedNode {
            index,
            name: format!("{}{}", prefix, index + 1),
            roles: assign_roles(index, count),
        })
        .collect()
}
