//! CLI module for vmfleet
//!
//! Subcommands:
//! - `vmfleet validate` - load and validate the configuration
//! - `vmfleet plan` - print the planned topology, no side effects
//! - `vmfleet provision` - drive govc through the provisioning phases
//! - `vmfleet render` - write the cluster descriptor

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "vmfleet")]
#[command(about = "Provision a VM cluster from a template and emit its topology descriptor")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load and validate the cluster configuration
    Validate(ConfigArgs),

    /// Print the planned topology without touching the platform
    Plan(ConfigArgs),

    /// Clone, power on, and configure every node
    Provision(ProvisionArgs),

    /// Render the cluster descriptor for the bring-up tool
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Path to the cluster configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Settling interval between power-on and guest configuration
    #[arg(long, value_name = "SECONDS")]
    pub settle_secs: Option<u64>,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output path for the descriptor ("-" for stdout)
    #[arg(short, long, default_value = "cluster.yml")]
    pub output: PathBuf,
}
