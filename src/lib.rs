//! vmfleet - provision a VM cluster from a template image
//!
//! Given a JSON configuration (node count, name prefix, address pools,
//! vCenter credentials), vmfleet plans a deterministic cluster topology
//! (which nodes are controller/etcd, which are workers, which address
//! each interface takes), drives the govc CLI through clone, power-on,
//! and guest configuration for every node, and renders the RKE-style
//! descriptor the bring-up tool consumes.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod govc;
pub mod render;
