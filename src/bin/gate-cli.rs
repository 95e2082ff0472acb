use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;

use admission_gateway::config::{load_config, ConfigError};
use admission_gateway::security::PayloadInspector;

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Management CLI for the admission gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration file
    Validate { path: PathBuf },
    /// Run the payload inspector over a JSON file
    Inspect { path: PathBuf },
    /// Query a running gateway's health endpoint
    Health {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => match load_config(&path) {
            Ok(config) => {
                println!("{} is valid", path.display());
                println!("{}", toml::to_string_pretty(&config)?);
                Ok(ExitCode::SUCCESS)
            }
            Err(ConfigError::Validation(errors)) => {
                eprintln!("{} has {} error(s):", path.display(), errors.len());
                for err in errors {
                    eprintln!("  - {}", err);
                }
                Ok(ExitCode::FAILURE)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Inspect { path } => {
            let content = std::fs::read_to_string(&path)?;
            let body: Value = serde_json::from_str(&content)?;
            let serialized = body.to_string();
            println!("serialized size: {} bytes", serialized.len());
            match PayloadInspector::new().first_match_in(&serialized) {
                Some(rule) => {
                    println!("suspicious: matched rule '{}'", rule);
                    Ok(ExitCode::FAILURE)
                }
                None => {
                    println!("clean");
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
        Commands::Health { url } => {
            let res = reqwest::Client::new()
                .get(format!("{}/healthz", url.trim_end_matches('/')))
                .send()
                .await?;
            print_response(res).await
        }
    }
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(ExitCode::FAILURE);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(ExitCode::SUCCESS)
}
