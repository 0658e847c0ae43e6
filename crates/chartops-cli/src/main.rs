//! chartops - recover chart commands and resolve analytics queries
//!
//! # Usage
//! ```bash
//! chartops recover completion.txt
//! chartops resolve daily_throughput_analysis
//! chartops ask "pie chart of GrossQuantity by BayCode" --existing flow_rate_chart,bay_usage
//! chartops --json insight "Which bays are busiest?"
//! ```

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chartops_agent::{AgentConfig, CommandService, OllamaClient, ServiceError};
use chartops_core::{recover, QueryCatalog, ResolvedQuery};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// chartops - validated chart commands from LLM output
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Agent configuration file (TOML)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Recover a command from a raw completion (FILE or stdin)
    Recover {
        file: Option<PathBuf>,
    },

    /// Resolve a query identifier against the catalog
    Resolve {
        token: String,
    },

    /// List the query catalog
    Queries,

    /// Generate a chart command from a natural-language request
    Ask {
        query: String,

        /// Names of charts that already exist
        #[arg(long, value_delimiter = ',')]
        existing: Vec<String>,
    },

    /// Map an analytics question to a catalog query
    Insight {
        question: String,
    },

    /// List the models the generation service offers
    Models,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Recover { .. } => "recover",
            Commands::Resolve { .. } => "resolve",
            Commands::Queries => "queries",
            Commands::Ask { .. } => "ask",
            Commands::Insight { .. } => "insight",
            Commands::Models => "models",
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli).await {
        report_failure(&err, cli.json);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    tracing::debug!(
        command = cli.command.name(),
        config = ?cli.config,
        json = cli.json,
        "Starting chartops"
    );

    match &cli.command {
        Commands::Recover { file } => {
            let raw = read_input(file.as_deref())?;
            let recovery = recover(&raw)?;

            if cli.json {
                print_json(&recovery)?;
            } else {
                println!("{}", serde_json::to_string_pretty(&recovery.command)?);
                println!("stage: {}", recovery.stage);
            }
        }
        Commands::Resolve { token } => {
            let catalog = load_config(cli.config.as_deref())?.load_catalog()?;
            let resolved = catalog.resolve(token)?;

            if cli.json {
                print_json(&resolved)?;
            } else {
                print_query(&resolved);
            }
        }
        Commands::Queries => {
            let catalog = load_config(cli.config.as_deref())?.load_catalog()?;
            print_catalog(&catalog, cli.json)?;
        }
        Commands::Ask { query, existing } => {
            let service = CommandService::from_config(load_config(cli.config.as_deref())?)?;
            let outcome = service.generate_command(query, existing).await?;

            if cli.json {
                print_json(&outcome)?;
            } else {
                println!("{}", serde_json::to_string_pretty(&outcome.command)?);
                match outcome.stage {
                    Some(stage) => println!("stage: {}", stage),
                    None => println!("source: fallback"),
                }
            }
        }
        Commands::Insight { question } => {
            let service = CommandService::from_config(load_config(cli.config.as_deref())?)?;
            let outcome = service.resolve_insight(question).await?;

            if cli.json {
                print_json(&outcome)?;
            } else {
                println!("{}", outcome.identifier);
                println!("  {}", outcome.description);
                println!();
                println!("{}", outcome.template.trim());
            }
        }
        Commands::Models => {
            let config = load_config(cli.config.as_deref())?;
            let client = OllamaClient::from_config(&config);
            let models = client
                .list_models()
                .await
                .with_context(|| format!("Failed to list models from {}", config.base_url))?;

            if cli.json {
                print_json(&serde_json::json!({
                    "models": models,
                    "current_model": client.model(),
                }))?;
            } else {
                for model in &models {
                    let marker = if model == client.model() { "*" } else { " " };
                    println!("{} {}", marker, model);
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    let config = match path {
        Some(path) => AgentConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AgentConfig::default(),
    };
    let config = config.with_env_overrides()?;
    tracing::debug!(
        base_url = %config.base_url,
        model = %config.model,
        timeout_secs = config.timeout_secs,
        "Resolved agent config"
    );
    Ok(config)
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            Ok(raw)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_query(query: &ResolvedQuery<'_>) {
    println!("{}", query.identifier);
    println!("  {}", query.description);
    println!();
    println!("{}", query.template.trim());
}

fn print_catalog(catalog: &QueryCatalog, json: bool) -> Result<()> {
    if json {
        return print_json(&catalog.iter().collect::<Vec<_>>());
    }
    for entry in catalog.iter() {
        println!("{:<32} {}", entry.identifier.as_str(), entry.description);
    }
    Ok(())
}

fn report_failure(err: &anyhow::Error, json: bool) {
    let raw_response = err
        .downcast_ref::<ServiceError>()
        .and_then(ServiceError::raw_response);

    if json {
        let body = serde_json::json!({
            "error": format!("{:#}", err),
            "raw_response": raw_response,
        });
        println!("{}", body);
    } else {
        eprintln!("Error: {:#}", err);
        if let Some(raw) = raw_response {
            eprintln!("raw response:\n{}", raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chartops",
            "ask",
            "delete trend",
            "--existing",
            "trend,flow_rate_chart",
            "--json",
            "-v",
        ])
        .unwrap();

        assert!(cli.json && cli.verbose);
        assert_eq!(cli.command.name(), "ask");
        match cli.command {
            Commands::Ask { query, existing } => {
                assert_eq!(query, "delete trend");
                assert_eq!(existing, vec!["trend", "flow_rate_chart"]);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_recover_reads_optional_file() {
        let cli = Cli::try_parse_from(["chartops", "recover"]).unwrap();
        assert!(matches!(cli.command, Commands::Recover { file: None }));
        assert_eq!(cli.command.name(), "recover");
    }
}
