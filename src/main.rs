use std::path::Path;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vmfleet::cli::{
    format_outcomes, format_plan, plan_cluster, provision_cluster, render_descriptor, Cli,
    Commands,
};
use vmfleet::cluster::DEFAULT_SETTLE_SECS;
use vmfleet::config::{load_config_file, ClusterConfig};

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .init();

    match cli.command {
        Commands::Validate(args) => {
            let config = load_or_exit(&args.config);
            println!(
                "Configuration OK: {} nodes ({}1..{}{}), {} interfaces",
                config.vm.num,
                config.vm.nameprefix,
                config.vm.nameprefix,
                config.vm.num,
                config.ip.len()
            );
        }

        Commands::Plan(args) => {
            let config = load_or_exit(&args.config);
            match plan_cluster(&config) {
                Ok(records) => print!("{}", format_plan(&records)),
                Err(e) => {
                    error!("Failed to plan cluster: {e}");
                    process::exit(1);
                }
            }
        }

        Commands::Provision(args) => {
            let config = load_or_exit(&args.config.config);
            let settle = Duration::from_secs(args.settle_secs.unwrap_or(DEFAULT_SETTLE_SECS));

            match provision_cluster(&config, settle) {
                Ok(outcomes) => {
                    print!("{}", format_outcomes(&outcomes));
                    let degraded = outcomes.iter().filter(|o| !o.is_provisioned()).count();
                    if degraded > 0 {
                        error!("{degraded} node(s) degraded, please check them manually");
                    }
                    info!("Verify all nodes are back online before running the bring-up tool");
                }
                Err(e) => {
                    error!("Provisioning failed to start: {e}");
                    process::exit(1);
                }
            }
        }

        Commands::Render(args) => {
            let config = load_or_exit(&args.config.config);
            let yaml = match render_descriptor(&config) {
                Ok(yaml) => yaml,
                Err(e) => {
                    error!("Failed to render descriptor: {e}");
                    process::exit(1);
                }
            };

            if args.output == Path::new("-") {
                print!("{yaml}");
            } else if let Err(e) = std::fs::write(&args.output, &yaml) {
                error!("Failed to write {}: {e}", args.output.display());
                process::exit(1);
            } else {
                info!("Wrote cluster descriptor to {}", args.output.display());
            }
        }
    }
}

fn load_or_exit(path: &Path) -> ClusterConfig {
    match load_config_file(path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file {}: {e}", path.display());
            process::exit(1);
        }
    }
}
