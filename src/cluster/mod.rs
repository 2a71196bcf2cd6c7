//! # Cluster planning and provisioning
//!
//! The pipeline runs one way, with no feedback edges:
//!
//! ```text
//! configuration
//!      │
//!      ▼
//! Topology Planner ──► Node Record Builder ──► Provisioning Sequencer ──► govc
//!      (roles)              (addresses)                  │
//!                               │                        ▼
//!                               ▼                  per-node outcomes
//!                       descriptor renderer
//! ```
//!
//! - **roles / topology**: pure derivation of node names and role sets
//!   from the cluster size. Index order is load-bearing: it selects
//!   both the role and the address taken from every pool.
//! - **pools**: classifies configured address pools as public/internal.
//! - **records**: merges plan + pools + user into immutable
//!   [`NodeRecord`]s, the single input for both the sequencer and the
//!   descriptor renderer.
//! - **sequencer**: drives govc through clone, power, and guest
//!   configuration with per-node failure containment.

pub mod pools;
pub mod records;
pub mod roles;
pub mod sequencer;
pub mod topology;

pub use pools::{resolve, strip_cidr, ResolvedPools};
pub use records::{build_records, NetworkBinding, NodeRecord};
pub use roles::{assign_roles, RoleSet, CONTROL_SET_SIZE};
pub use sequencer::{
    hosts_payload, initiator_name, NodeOutcome, NodeState, ProvisionStep, Sequencer,
    SequencerConfig, DEFAULT_SETTLE_SECS, INITIATOR_PREFIX,
};
pub use topology::{plan, PlannedNode};
