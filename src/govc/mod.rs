//! External command gateway for the govc CLI
//!
//! All platform interaction goes through the [`Gateway`] trait so the
//! sequencer can be driven against a test double. The real
//! implementation shells out to govc with the connection context
//! applied as per-invocation environment; nothing mutates the ambient
//! process environment.

use std::process::Command;

use serde_json::Value;
use tracing::info;

use crate::config::VsphereConfig;

/// Path of the govc executable
pub const GOVC_EXE: &str = "/usr/local/bin/govc";

/// Result of a power-state query against the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    /// The query failed or its output could not be parsed. Treated as
    /// "not yet powered on" so a power-on is attempted rather than
    /// skipped.
    Unknown,
}

/// Uniform invocation of the virtualization CLI.
///
/// `run` returns `None` on success and the failure text otherwise;
/// callers are expected to log it and continue. A hung subprocess
/// blocks the caller: no timeout is applied beyond what the external
/// tool enforces itself.
pub trait Gateway {
    /// Invoke govc with `args`. With `capture_output` the subprocess
    /// output is captured and its stderr is returned on failure (or a
    /// generic message if stderr is empty); without it the output is
    /// passed through and only the generic message comes back.
    fn run(&self, args: &[&str], capture_output: bool) -> Option<String>;

    /// Invoke govc with `args` and return captured stdout, or the
    /// failure text.
    fn output(&self, args: &[&str]) -> Result<String, String>;
}

/// Connection context for one provisioning run.
///
/// Constructed once from the configuration and applied to every govc
/// invocation as environment variables, replacing the global GOVC_*
/// exports a shell user would set.
#[derive(Debug, Clone)]
pub struct GovcContext {
    pub url: String,
    pub username: String,
    pub password: String,
    pub insecure: String,
    pub datacenter: String,
    pub datastore: String,
    pub resource_pool: String,
    pub guest_login: String,
}

impl GovcContext {
    pub fn from_config(config: &VsphereConfig) -> Self {
        Self {
            url: config.vcenter.clone(),
            username: config.user.clone(),
            password: config.password.clone(),
            insecure: config.insecure.clone(),
            datacenter: config.datacenter.clone(),
            datastore: config.datastore.clone(),
            resource_pool: config.respool.clone(),
            guest_login: config.guestcredential.clone(),
        }
    }

    fn env(&self) -> [(&'static str, &str); 8] {
        [
            ("GOVC_URL", &self.url),
            ("GOVC_USERNAME", &self.username),
            ("GOVC_PASSWORD", &self.password),
            ("GOVC_INSECURE", &self.insecure),
            ("GOVC_DATACENTER", &self.datacenter),
            ("GOVC_DATASTORE", &self.datastore),
            ("GOVC_RESOURCE_POOL", &self.resource_pool),
            ("GOVC_GUEST_LOGIN", &self.guest_login),
        ]
    }
}

/// The real gateway: synchronous govc subprocess invocations
pub struct GovcGateway {
    context: GovcContext,
}

impl GovcGateway {
    pub fn new(context: GovcContext) -> Self {
        Self { context }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(GOVC_EXE);
        command.args(args);
        for (key, value) in self.context.env() {
            command.env(key, value);
        }
        command
    }
}

impl Gateway for GovcGateway {
    fn run(&self, args: &[&str], capture_output: bool) -> Option<String> {
        info!("Run command govc {}", args.join(" "));
        let generic = format!("Fail to execute govc {}", args.join(" "));

        if capture_output {
            match self.command(args).output() {
                Ok(output) if output.status.success() => None,
                Ok(output) => {
                    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                    if stderr.is_empty() {
                        Some(generic)
                    } else {
                        Some(stderr)
                    }
                }
                Err(e) => Some(format!("{generic}: {e}")),
            }
        } else {
            match self.command(args).status() {
                Ok(status) if status.success() => None,
                Ok(_) => Some(generic),
                Err(e) => Some(format!("{generic}: {e}")),
            }
        }
    }

    fn output(&self, args: &[&str]) -> Result<String, String> {
        info!("Run command govc {}", args.join(" "));
        match self.command(args).output() {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if stderr.is_empty() {
                    Err(format!("Fail to execute govc {}", args.join(" ")))
                } else {
                    Err(stderr)
                }
            }
            Err(e) => Err(format!("Fail to execute govc {}: {e}", args.join(" "))),
        }
    }
}

/// Parse the JSON output of `vm.info -g -json` into a power state.
///
/// Anything that does not clearly read "poweredOn" or "poweredOff" is
/// [`PowerState::Unknown`].
pub fn parse_power_state(json: &str) -> PowerState {
    let Ok(value) = serde_json::from_str::<Value>(json) else {
        return PowerState::Unknown;
    };
    match value["VirtualMachines"][0]["Runtime"]["PowerState"].as_str() {
        Some("poweredOn") => PowerState::PoweredOn,
        Some("poweredOff") => PowerState::PoweredOff,
        _ => PowerState::Unknown,
    }
}
