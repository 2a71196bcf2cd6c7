//! Provisioning sequencer - drives govc through the node lifecycle
//!
//! Three macro-phases, each finished for all nodes before the next
//! starts:
//!
//! 1. Bring-up: clone every node from the base template and power it
//!    on (breadth-first, so the platform settles after the bulk power
//!    operation as a whole).
//! 2. Per-node configuration, after a settling barrier: hostname,
//!    storage-initiator identity, hosts file, static IPs.
//! 3. Reboot pass: power-cycle every node so hostname and network come
//!    up clean on a fresh boot. Advisory only; completion is confirmed
//!    out-of-band by the operator.
//!
//! Failures are contained per node and per step: everything is logged,
//! nothing is retried or rolled back, and no node's failure stops its
//! siblings. Each node comes back as a structured outcome so callers
//! can report degraded nodes without scraping logs.

use std::fmt;
use std::io::Write;
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::govc::{parse_power_state, Gateway, PowerState};

use super::records::NodeRecord;

/// Default settling interval between bring-up and guest configuration.
/// Guest-level commands fail outright until the guest agent is up, and
/// there is no readiness polling, only this fixed wait.
pub const DEFAULT_SETTLE_SECS: u64 = 180;

/// Fixed namespace prefix for storage-initiator identities
pub const INITIATOR_PREFIX: &str = "iqn.1994-05.com.redhat:";

const HOSTS_LOCALHOST_LINE: &str =
    "127.0.0.1 localhost localhost.localdomain localhost4 localhost4.localdomain4";

const INITIATOR_PATH: &str = "/etc/iscsi/initiatorname.iscsi";
const HOSTS_PATH: &str = "/etc/hosts";

/// One step of the per-node lifecycle, named for degraded-node reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionStep {
    Clone,
    PowerOn,
    Hostname,
    StorageInitiator,
    Hosts,
    /// Static IP configuration of the named interface
    Network(String),
    Reboot,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionStep::Clone => write!(f, "clone"),
            ProvisionStep::PowerOn => write!(f, "power-on"),
            ProvisionStep::Hostname => write!(f, "hostname"),
            ProvisionStep::StorageInitiator => write!(f, "storage-initiator"),
            ProvisionStep::Hosts => write!(f, "hosts"),
            ProvisionStep::Network(interface) => write!(f, "network({interface})"),
            ProvisionStep::Reboot => write!(f, "reboot"),
        }
    }
}

/// Terminal state of a node after the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Every step succeeded
    Provisioned,
    /// At least one step failed; holds the first failing step. Later
    /// steps were still attempted, so the node may be partially
    /// configured.
    Degraded(ProvisionStep),
}

/// Per-node result of a provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeOutcome {
    pub name: String,
    pub state: NodeState,
}

impl NodeOutcome {
    pub fn is_provisioned(&self) -> bool {
        self.state == NodeState::Provisioned
    }
}

/// Runtime knobs for the sequencer
#[derive(Debug, Clone)]
pub struct SequencerConfig {
    /// Name of the base template VM to clone from
    pub base_template: String,
    /// Duration of the settling barrier between phases 1 and 2
    pub settle: Duration,
}

impl SequencerConfig {
    pub fn new(base_template: impl Into<String>) -> Self {
        Self {
            base_template: base_template.into(),
            settle: Duration::from_secs(DEFAULT_SETTLE_SECS),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

/// Drives the external platform through the provisioning lifecycle.
///
/// Single-threaded and synchronous: every gateway call blocks until
/// the subprocess exits, and the settling barrier blocks the whole
/// sequencer.
pub struct Sequencer<'a, G: Gateway> {
    gateway: &'a G,
    config: SequencerConfig,
}

impl<'a, G: Gateway> Sequencer<'a, G> {
    pub fn new(gateway: &'a G, config: SequencerConfig) -> Self {
        Self { gateway, config }
    }

    /// Run all three phases over `records`, in record order.
    pub fn provision(&self, records: &[NodeRecord]) -> Vec<NodeOutcome> {
        let mut failures: Vec<Option<ProvisionStep>> = vec![None; records.len()];

        // Phase 1: bring-up, breadth-first across nodes
        for (slot, record) in failures.iter_mut().zip(records) {
            if let Some(e) = self.clone_vm(&record.name) {
                error!("Fail to clone VM {} due to {}", record.name, e);
                mark(slot, ProvisionStep::Clone);
            } else {
                info!("Successfully cloned VM {}", record.name);
            }
            if let Some(e) = self.power_on(&record.name) {
                error!("Fail to power on VM {} due to {}", record.name, e);
                mark(slot, ProvisionStep::PowerOn);
            }
        }

        self.settling_barrier();

        // Phase 2: per-node configuration, each node fully configured
        // before the next
        let hosts = hosts_payload(records);
        let hosts_file = match write_payload(&hosts) {
            Ok(file) => Some(file),
            Err(e) => {
                error!("Fail to stage hosts payload: {e}");
                None
            }
        };

        for (slot, record) in failures.iter_mut().zip(records) {
            self.configure_node(record, hosts_file.as_ref(), slot);
        }

        // Phase 3: power-cycle everything so the configuration is
        // clean on a fresh boot
        for (slot, record) in failures.iter_mut().zip(records) {
            if let Some(e) = self.reboot(&record.name) {
                error!("Fail to reboot VM {} due to {}", record.name, e);
                mark(slot, ProvisionStep::Reboot);
            }
        }

        info!("Please wait until all VMs come back online before the next step");

        records
            .iter()
            .zip(failures)
            .map(|(record, failure)| NodeOutcome {
                name: record.name.clone(),
                state: match failure {
                    None => NodeState::Provisioned,
                    Some(step) => NodeState::Degraded(step),
                },
            })
            .collect()
    }

    fn settling_barrier(&self) {
        info!(
            "Waiting {}s for all VMs to come online before guest configuration",
            self.config.settle.as_secs()
        );
        thread::sleep(self.config.settle);
    }

    fn clone_vm(&self, name: &str) -> Option<String> {
        info!("Clone VM {} based on {}", name, self.config.base_template);
        self.gateway
            .run(&["vm.clone", "-vm", &self.config.base_template, name], true)
    }

    /// Power on a node, skipping the command entirely if the platform
    /// already reports it powered on. An unreadable status reads as
    /// "not powered on" and triggers the attempt.
    fn power_on(&self, name: &str) -> Option<String> {
        match self.gateway.output(&["vm.info", "-g", "-json", name]) {
            Ok(output) if parse_power_state(&output) == PowerState::PoweredOn => {
                info!("VM {name} is already powered on");
                return None;
            }
            Ok(_) => {}
            Err(e) => error!("Fail to check the power status of {name} due to {e}"),
        }

        match self.gateway.run(&["vm.power", "-on", name], true) {
            None => {
                info!("VM {name} is successfully powered on");
                None
            }
            failure => failure,
        }
    }

    fn configure_node(
        &self,
        record: &NodeRecord,
        hosts_file: Option<&NamedTempFile>,
        slot: &mut Option<ProvisionStep>,
    ) {
        let name = record.name.as_str();

        info!("Configure {name} with hostname {name}");
        if self
            .gateway
            .run(
                &["guest.run", "-vm", name, "hostnamectl", "set-hostname", name],
                false,
            )
            .is_some()
        {
            error!("Fail to set hostname for VM {name}");
            mark(slot, ProvisionStep::Hostname);
        }

        if let Some(e) = self.update_initiator(name) {
            error!("Fail to update storage initiator on VM {name} due to {e}");
            mark(slot, ProvisionStep::StorageInitiator);
        }

        match hosts_file {
            Some(file) => {
                if let Some(e) = self.upload(name, file, HOSTS_PATH) {
                    error!("Fail to upload {HOSTS_PATH} onto VM {name} due to {e}");
                    mark(slot, ProvisionStep::Hosts);
                }
            }
            None => mark(slot, ProvisionStep::Hosts),
        }

        for binding in &record.bindings {
            if let Some(e) = self.configure_interface(name, binding) {
                error!(
                    "Fail to configure VM {} on NIC {} with IP {} due to {}",
                    name, binding.interface, binding.address, e
                );
                mark(slot, ProvisionStep::Network(binding.interface.clone()));
            }
        }
    }

    fn update_initiator(&self, name: &str) -> Option<String> {
        let identity = initiator_name(name);
        info!("Create initiator identity {identity}");

        let file = match write_payload(&identity) {
            Ok(file) => file,
            Err(e) => return Some(e.to_string()),
        };
        if let Some(e) = self.upload(name, &file, INITIATOR_PATH) {
            return Some(e);
        }

        info!("Restart iscsid on {name} to make changes take effect");
        self.gateway.run(
            &["guest.run", "-vm", name, "systemctl", "restart", "iscsid"],
            false,
        )
    }

    fn upload(&self, name: &str, file: &NamedTempFile, destination: &str) -> Option<String> {
        info!("Upload file {destination} onto VM {name}");
        let vm_flag = format!("-vm={name}");
        let source = file.path().to_string_lossy();
        self.gateway.run(
            &["guest.upload", "-f", &vm_flag, &source, destination],
            false,
        )
    }

    /// Push one interface's static configuration and reconnect it so
    /// the address takes effect now instead of at next boot.
    fn configure_interface(
        &self,
        name: &str,
        binding: &super::records::NetworkBinding,
    ) -> Option<String> {
        // nmcli's never-default is the inverse of holding the default route
        let never_default = if binding.default_route { "false" } else { "true" };

        info!(
            "Configure NIC {} on VM {} with IP {} and gateway {}",
            binding.interface, name, binding.address, binding.gateway
        );
        if let Some(e) = self.gateway.run(
            &[
                "guest.run",
                "-vm",
                name,
                "nmcli",
                "con",
                "mod",
                &binding.interface,
                "ipv4.method",
                "static",
                "ipv4.addresses",
                &binding.address,
                "ipv4.gateway",
                &binding.gateway,
                "ipv4.never-default",
                never_default,
            ],
            true,
        ) {
            return Some(e);
        }

        info!(
            "Reconnect NIC {} on VM {} to activate the configured IP {}",
            binding.interface, name, binding.address
        );
        self.gateway.run(
            &["guest.run", "-vm", name, "nmcli", "con", "up", &binding.interface],
            true,
        )
    }

    fn reboot(&self, name: &str) -> Option<String> {
        info!("Poweroff VM {name}");
        if let Some(e) = self.gateway.run(&["vm.power", "-off", "-force", name], false) {
            return Some(e);
        }
        self.power_on(name)
    }
}

fn mark(slot: &mut Option<ProvisionStep>, step: ProvisionStep) {
    if slot.is_none() {
        *slot = Some(step);
    }
}

/// The cluster-wide hosts payload: one `<public address> <name>` line
/// per node in plan order, then the fixed localhost line.
pub fn hosts_payload(records: &[NodeRecord]) -> String {
    let mut payload = String::new();
    for record in records {
        payload.push_str(&record.public_address);
        payload.push(' ');
        payload.push_str(&record.name);
        payload.push('\n');
    }
    payload.push_str(HOSTS_LOCALHOST_LINE);
    payload.push('\n');
    payload
}

/// Storage-initiator identity for a node, derived from the fixed
/// namespace prefix and the node name.
pub fn initiator_name(name: &str) -> String {
    format!("InitiatorName={INITIATOR_PREFIX}{name}")
}

fn write_payload(contents: &str) -> std::io::Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::roles::RoleSet;

    fn record(index: usize, name: &str, public: &str) -> NodeRecord {
        NodeRecord {
            index,
            name: name.to_string(),
            roles: RoleSet::worker(),
            user: "rke".to_string(),
            public_address: public.to_string(),
            internal_address: format!("10.1.0.{}", index + 11),
            bindings: vec![],
        }
    }

    #[test]
    fn test_hosts_payload() {
        let records = vec![
            record(0, "node1", "10.0.0.11"),
            record(1, "node2", "10.0.0.12"),
        ];
        let payload = hosts_payload(&records);
        let lines: Vec<&str> = payload.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "10.0.0.11 node1");
        assert_eq!(lines[1], "10.0.0.12 node2");
        assert_eq!(lines[2], HOSTS_LOCALHOST_LINE);
        assert!(payload.ends_with('\n'));
    }

    #[test]
    fn test_initiator_name() {
        assert_eq!(
            initiator_name("node2"),
            "InitiatorName=iqn.1994-05.com.redhat:node2"
        );
    }

    #[test]
    fn test_step_display() {
        assert_eq!(ProvisionStep::Clone.to_string(), "clone");
        assert_eq!(ProvisionStep::Network("ens192".to_string()).to_string(), "network(ens192)");
    }

    #[test]
    fn test_mark_keeps_first_failure() {
        let mut slot = None;
        mark(&mut slot, ProvisionStep::Clone);
        mark(&mut slot, ProvisionStep::Hostname);
        assert_eq!(slot, Some(ProvisionStep::Clone));
    }

    #[test]
    fn test_outcome_state() {
        let ok = NodeOutcome {
            name: "node1".to_string(),
            state: NodeState::Provisioned,
        };
        let bad = NodeOutcome {
            name: "node2".to_string(),
            state: NodeState::Degraded(ProvisionStep::PowerOn),
        };
        assert!(ok.is_provisioned());
        assert!(!bad.is_provisioned());
    }
}
