//! Settings file and environment layering.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use serde::Deserialize;
use trestle_cache::{CacheConfig, ExpiryMode};
use trestle_client::ClientConfig;

/// Shape of `trestle.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CliConfig {
  pub base_url:     String,
  pub timeout_secs: u64,
  /// Where the login session is kept between runs. `~` is expanded.
  pub session_path: PathBuf,
  pub cache:        CacheSettings,
}

impl Default for CliConfig {
  fn default() -> Self {
    Self {
      base_url:     ClientConfig::default().base_url,
      timeout_secs: 30,
      session_path: PathBuf::from("~/.config/trestle/session.json"),
      cache:        CacheSettings::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
  pub max_age_secs: u64,
  pub mode:         ExpiryMode,
  pub max_entries:  Option<usize>,
}

impl Default for CacheSettings {
  fn default() -> Self {
    Self {
      max_age_secs: 30,
      mode:         ExpiryMode::SinceWrite,
      max_entries:  None,
    }
  }
}

impl CliConfig {
  /// Read `path` (if it exists) layered under `TRESTLE_*` variables, e.g.
  /// `TRESTLE_BASE_URL` or `TRESTLE_CACHE__MAX_AGE_SECS`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("TRESTLE")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise CliConfig")
  }

  pub fn client_config(&self) -> ClientConfig {
    ClientConfig {
      base_url: self.base_url.clone(),
      timeout:  Duration::from_secs(self.timeout_secs),
    }
  }

  pub fn cache_config(&self) -> CacheConfig {
    let config = CacheConfig::default()
      .with_max_age(Duration::from_secs(self.cache.max_age_secs))
      .with_mode(self.cache.mode);
    match self.cache.max_entries {
      Some(max) => config.with_max_entries(max),
      None => config,
    }
  }

  pub fn session_path(&self) -> PathBuf { expand_tilde(&self.session_path) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
