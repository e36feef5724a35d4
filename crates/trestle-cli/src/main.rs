//! `trestle`: command-line client for a Trestle knowledge-graph server.
//!
//! # Usage
//!
//! ```text
//! trestle login alice
//! trestle graph 'http://trestle.nickrobison.com/data#Cidade:2013'
//! trestle --url https://example.org/trestle search Cidade --limit 5
//! ```

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{commands::App, config::CliConfig};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "trestle", version, about = "Client for the Trestle knowledge graph")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "trestle.toml")]
  config: PathBuf,

  /// Base URL of the Trestle API; overrides the config file.
  #[arg(long)]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Log in and save the session for later commands.
  Login {
    username: String,
    /// Read from stdin when omitted.
    #[arg(long, env = "TRESTLE_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },
  /// Log out and forget the saved session.
  Logout,
  /// Show the logged-in user.
  Whoami,
  /// Print an individual as JSON.
  Individual { id: String },
  /// Print the lifecycle event graph of an individual as JSON.
  Graph { id: String },
  /// Print the GeoJSON feature collection for one or more individuals.
  Geometry {
    #[arg(required = true)]
    ids: Vec<String>,
  },
  /// Search individuals by name.
  Search {
    name:    String,
    #[arg(long)]
    dataset: Option<String>,
    #[arg(long)]
    limit:   Option<u32>,
  },
  /// List available datasets.
  Datasets,
  /// Run a query against a repository and print the raw result.
  Query { repository: String, query: String },
  /// Break an individual identifier into its parts.
  Id { id: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  // Identifier parsing needs no server.
  if let Command::Id { id } = &cli.command {
    commands::print_id(id);
    return Ok(());
  }

  let mut config = CliConfig::load(&cli.config)?;
  if let Some(url) = cli.url {
    config.base_url = url;
  }
  let app = App::open(config).await?;

  match cli.command {
    Command::Login { username, password } => app.login(&username, password).await,
    Command::Logout => app.logout().await,
    Command::Whoami => app.whoami().await,
    Command::Individual { id } => app.individual(&id).await,
    Command::Graph { id } => app.graph(&id).await,
    Command::Geometry { ids } => app.geometry(&ids).await,
    Command::Search {
      name,
      dataset,
      limit,
    } => app.search(&name, dataset.as_deref(), limit).await,
    Command::Datasets => app.datasets().await,
    Command::Query { repository, query } => app.query(&repository, &query).await,
    Command::Id { .. } => Ok(()),
  }
}
