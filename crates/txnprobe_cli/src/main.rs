//! txnprobe CLI
//!
//! Command-line front end for the transaction probe.
//!
//! # Commands
//!
//! - `run` - Provision a replica-set container (or target an existing
//!   deployment with `--uri`) and run the probe
//! - `version` - Show version information

use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use txnprobe_core::{provision, Deployment, ProbeConfig, TransactionProbe};
use txnprobe_mongo::{MongoDriver, MongoReplica, DEFAULT_IMAGE_TAG};

/// Replica-set transaction probe.
#[derive(Parser)]
#[command(name = "txnprobe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a replica set and run the probe
    Run {
        /// MongoDB image tag to launch
        #[arg(long, default_value = DEFAULT_IMAGE_TAG)]
        image_tag: String,

        /// Probe an existing deployment instead of launching a container
        #[arg(long)]
        uri: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Leave the container running after the probe
        #[arg(long)]
        keep: bool,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            image_tag,
            uri,
            format,
            keep,
        } => run(image_tag, uri, &format, keep).await?,
        Commands::Version => {
            println!("txnprobe CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

async fn run(
    image_tag: String,
    uri: Option<String>,
    format: &str,
    keep: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ProbeConfig::default();

    let mut deployment = None;
    let endpoint = match uri {
        Some(uri) => uri,
        None => {
            let mut replica = MongoReplica::new().with_tag(image_tag);
            let endpoint = provision(&mut replica).await?;
            deployment = Some(replica);
            endpoint
        }
    };

    let outcome = match MongoDriver::connect(Some(&endpoint), &config).await {
        Ok(driver) => TransactionProbe::new(config, driver).run().await,
        Err(err) => Err(err),
    };

    if let Some(replica) = deployment.as_mut() {
        if keep {
            info!(%endpoint, "leaving the container running");
        } else if let Err(err) = replica.stop().await {
            warn!(error = %err, "container teardown failed");
        }
    }

    let report = outcome?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        _ => {
            println!("probe passed in {:?}", report.elapsed);
            println!("  endpoint: {}", report.endpoint);
            println!("  receipt:  {}", report.receipt);
            for (target, count) in &report.committed {
                println!("  committed {count} document(s) in {target}");
            }
        }
    }

    Ok(())
}
