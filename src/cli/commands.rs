//! Command implementations for the CLI
//!
//! Planning and rendering are pure given a loaded configuration;
//! provisioning is the one command with side effects.

use std::time::Duration;

use thiserror::Error;

use crate::cluster::{self, NodeOutcome, NodeRecord, Sequencer, SequencerConfig};
use crate::config::{ClusterConfig, ConfigError};
use crate::govc::{GovcContext, GovcGateway};
use crate::render;

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

/// Plan the topology and build the node records. No side effects.
pub fn plan_cluster(config: &ClusterConfig) -> CommandResult<Vec<NodeRecord>> {
    let plan = cluster::plan(config.vm.num, &config.vm.nameprefix);
    let records = cluster::build_records(&plan, &config.ip, &config.vm.user)?;
    Ok(records)
}

/// Run the full provisioning sequence against the configured vCenter.
pub fn provision_cluster(
    config: &ClusterConfig,
    settle: Duration,
) -> CommandResult<Vec<NodeOutcome>> {
    let records = plan_cluster(config)?;

    let gateway = GovcGateway::new(GovcContext::from_config(&config.vsphere));
    let sequencer = Sequencer::new(
        &gateway,
        SequencerConfig::new(config.vm.base.as_str()).with_settle(settle),
    );

    Ok(sequencer.provision(&records))
}

/// Render the cluster descriptor YAML.
pub fn render_descriptor(config: &ClusterConfig) -> CommandResult<String> {
    let records = plan_cluster(config)?;
    Ok(render::render_yaml(&records)?)
}
