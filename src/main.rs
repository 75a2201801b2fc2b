//! Balancer inspection tool.
//!
//! Compiles balancer config strings and exercises the endpoint directory
//! against a driver config file without touching the network.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;

use endpoint_balancer::config::loader::load_config;
use endpoint_balancer::config::watcher::{ClusterUpdate, ConfigWatcher};
use endpoint_balancer::observability::logging;
use endpoint_balancer::{create_from_config, CallContext, ClusterHandle, EndpointInfo, Policy};

#[derive(Parser)]
#[command(name = "balancer")]
#[command(about = "Inspect endpoint balancing policies", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a balancer config string and print the policy
    Compile {
        /// Balancer identifier or JSON document
        config: String,
    },
    /// Run selections against the endpoints of a driver config file
    Simulate {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value_t = 1000)]
        calls: usize,

        /// Pin every call to this node id
        #[arg(short, long)]
        node_id: Option<u32>,
    },
    /// Keep a published cluster in sync with a driver config file
    Watch {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    match cli.command {
        Commands::Compile { config } => match create_from_config(&config) {
            Ok(policy) => println!("{}", serde_json::to_string_pretty(&policy)?),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Simulate { file, calls, node_id } => {
            let config = load_config(&file)?;
            let handle = ClusterHandle::new();
            let policy = publish(&handle, ClusterUpdate::compile(&config));

            let mut ctx = CallContext::background();
            if let Some(node_id) = node_id {
                ctx = ctx.with_node_id(node_id);
            }

            let mut counts: BTreeMap<String, usize> = BTreeMap::new();
            for _ in 0..calls {
                let endpoint = handle.next(&ctx)?;
                *counts.entry(endpoint.address.clone()).or_default() += 1;
            }

            let report = json!({
                "policy": policy,
                "calls": calls,
                "selected": counts,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Watch { file } => {
            let config = load_config(&file)?;
            let handle = ClusterHandle::new();
            publish(&handle, ClusterUpdate::compile(&config));

            let (watcher, mut updates) = ConfigWatcher::new(&file, &config);
            let _watcher = watcher.run()?;

            loop {
                tokio::select! {
                    Some(update) = updates.recv() => {
                        publish(&handle, update);
                    }
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Interrupted, exiting");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Build the cluster described by `update` and swap it into `handle`.
///
/// Returns the policy the published cluster follows.
fn publish(handle: &ClusterHandle<EndpointInfo>, update: ClusterUpdate) -> Policy {
    let cluster = update.build_cluster();

    tracing::info!(
        strategy = %update.policy.strategy,
        allow_fallback = update.policy.allow_fallback,
        prefer = cluster.prefer().len(),
        fallback = cluster.fallback().len(),
        "Publishing cluster"
    );
    handle.publish(cluster);
    update.policy
}
