//! Subcommand implementations.

use std::{
  io::{self, BufRead, Write},
  path::PathBuf,
};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{info, warn};
use trestle_client::{CachedSource, GeometryWorker, Session, TrestleClient};
use trestle_core::{IndividualSource, id};
use trestle_graph::build_event_graph;

use crate::config::CliConfig;

/// A configured client plus the session file it was restored from.
pub struct App {
  client:       TrestleClient,
  config:       CliConfig,
  session_path: PathBuf,
}

impl App {
  /// Build the client and restore a saved session if it is still valid.
  pub async fn open(config: CliConfig) -> Result<Self> {
    let client =
      TrestleClient::new(config.client_config()).context("failed to build HTTP client")?;
    let session_path = config.session_path();

    let saved = Session::load(&session_path)
      .await
      .with_context(|| format!("failed to read session {}", session_path.display()))?;
    if let Some(session) = saved {
      if session.is_expired(Utc::now()) {
        warn!(user = %session.user.username, "saved session has expired, log in again");
      } else {
        client.set_token(Some(session.token));
      }
    }

    Ok(Self {
      client,
      config,
      session_path,
    })
  }

  // ── Session ───────────────────────────────────────────────────────────────

  pub async fn login(&self, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
      Some(password) => password,
      None => read_password()?,
    };
    let session = self
      .client
      .login(username, &password)
      .await
      .context("login failed")?;
    session
      .save(&self.session_path)
      .await
      .context("failed to save session")?;
    info!(
      user = %session.user.username,
      expires_at = %session.expires_at,
      "logged in"
    );
    Ok(())
  }

  pub async fn logout(&self) -> Result<()> {
    let result = self.client.logout().await;
    Session::clear(&self.session_path)
      .await
      .context("failed to remove session")?;
    result.context("logout failed")
  }

  pub async fn whoami(&self) -> Result<()> {
    let Some(session) = Session::load(&self.session_path).await? else {
      bail!("not logged in");
    };
    let user = &session.user;
    println!("{} {} <{}>", user.first_name, user.last_name, user.email);
    println!("username:   {}", user.username);
    println!("privileges: {:?}", user.privilege_list());
    println!("expires:    {}", session.expires_at);
    if session.is_expired(Utc::now()) {
      println!("(expired)");
    }
    Ok(())
  }

  // ── Individuals ───────────────────────────────────────────────────────────

  pub async fn individual(&self, id: &str) -> Result<()> {
    let individual = self
      .client
      .retrieve_individual(id)
      .await
      .with_context(|| format!("failed to retrieve {id}"))?;
    print_json(&individual)
  }

  pub async fn graph(&self, id: &str) -> Result<()> {
    let source = CachedSource::new(self.client.clone(), self.config.cache_config());
    let focal = source
      .individual(id)
      .await
      .with_context(|| format!("failed to retrieve {id}"))?;
    let graph = build_event_graph(&source, &focal)
      .await
      .with_context(|| format!("failed to build event graph for {id}"))?;
    print_json(&graph)
  }

  pub async fn geometry(&self, ids: &[String]) -> Result<()> {
    let records = try_join_all(ids.iter().map(|id| self.client.retrieve_record(id)))
      .await
      .context("failed to retrieve individuals")?;
    let worker = GeometryWorker::spawn().context("failed to start geometry worker")?;
    let features = worker
      .features(records)
      .await
      .context("geometry conversion failed")?;
    print_json(&features)
  }

  pub async fn search(
    &self,
    name: &str,
    dataset: Option<&str>,
    limit: Option<u32>,
  ) -> Result<()> {
    let hits = self
      .client
      .search(name, dataset, limit)
      .await
      .context("search failed")?;
    for hit in hits {
      println!("{hit}");
    }
    Ok(())
  }

  // ── Datasets and queries ──────────────────────────────────────────────────

  pub async fn datasets(&self) -> Result<()> {
    for dataset in self.client.datasets().await.context("failed to list datasets")? {
      println!("{dataset}");
    }
    Ok(())
  }

  pub async fn query(&self, repository: &str, query: &str) -> Result<()> {
    let result = self
      .client
      .query(repository, query)
      .await
      .context("query failed")?;
    print_json(&result)
  }
}

pub fn print_id(individual: &str) {
  println!("hostname: {}", id::extract_hostname(individual));
  println!("prefix:   {}", id::extract_prefix(individual));
  println!("suffix:   {}", id::extract_suffix(individual));
  println!("filtered: {}", id::filter_id(individual));
  println!("hash:     {}", id::hash_id(individual));
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  let stdout = io::stdout();
  let mut out = stdout.lock();
  serde_json::to_writer_pretty(&mut out, value).context("failed to write JSON")?;
  writeln!(out)?;
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> Result<String> {
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
