//! Request admission gateway.
//!
//! Sits in front of the marketplace API and decides, per request, whether it
//! may reach the application.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                 ADMISSION GATEWAY                      │
//!  Client Request    │  ┌──────────┐   ┌───────────────────────────────────┐ │
//!  ──────────────────┼─▶│  http    │──▶│        admission pipeline         │ │
//!                    │  │ request  │   │ identity → rate limit → method →  │ │
//!                    │  │ id/body  │   │ headers → preflight → type →      │ │
//!                    │  └──────────┘   │ size → inspection                 │ │
//!                    │                 └─────────────┬─────────────────────┘ │
//!                    │           Reject / Preflight  │  Admit                │
//!  Client Response   │  ┌──────────┐                 ▼                       │
//!  ◀─────────────────┼──│ response │◀──────── upstream handler ◀────────────┼──── App
//!                    │  └──────────┘                                         │
//!                    │  config · observability · lifecycle (sweeper, signals)│
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use admission_gateway::config::{load_config, GatewayConfig};
use admission_gateway::lifecycle::startup;

#[derive(Parser)]
#[command(name = "admission-gateway")]
#[command(about = "Rate limiting and request validation in front of the marketplace API", long_about = None)]
struct Args {
    /// TOML configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload admission settings when the config file changes.
    #[arg(long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    let watch_path = if args.watch { args.config } else { None };
    startup::run(config, watch_path).await?;
    Ok(())
}
