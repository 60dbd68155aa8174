//! Configuration management
//!
//! Settings come from a JSON file when one can be found, falling back to
//! built-in defaults for anything the file leaves out.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PatentError, Result};
use crate::normalize::EnrichmentRule;
use crate::predict::{DEFAULT_MAX_ABSTRACT_CHARS, DEFAULT_SIMILAR_PATENTS};
use crate::source::DEFAULT_RECORD_SOFT_LIMIT;
use crate::theme::Theme;

pub const CONFIG_ENV: &str = "PATENTS_CONFIG";
pub const SOURCE_ENV: &str = "PATENTS_SOURCE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
  /// Path or http(s) URL of the patent dataset
  #[serde(default = "default_source")]
  pub source: String,
  #[serde(default = "default_request_timeout_secs")]
  pub request_timeout_secs: u64,
  #[serde(default)]
  pub enrichment: EnrichmentRule,
  /// Keywords shown on the dashboard
  #[serde(default = "default_top_keywords")]
  pub top_keywords: usize,
  #[serde(default = "default_similar_patents")]
  pub similar_patents: usize,
  #[serde(default = "default_max_abstract_chars")]
  pub max_abstract_chars: usize,
  /// Record count beyond which a load is flagged in the logs
  #[serde(default = "default_record_soft_limit")]
  pub record_soft_limit: usize,
  #[serde(default)]
  pub theme: Theme,
}

fn default_source() -> String {
  "patents_output.json".to_string()
}
fn default_request_timeout_secs() -> u64 {
  30
}
fn default_top_keywords() -> usize {
  5
}
fn default_similar_patents() -> usize {
  DEFAULT_SIMILAR_PATENTS
}
fn default_max_abstract_chars() -> usize {
  DEFAULT_MAX_ABSTRACT_CHARS
}
fn default_record_soft_limit() -> usize {
  DEFAULT_RECORD_SOFT_LIMIT
}

impl Default for Config {
  fn default() -> Self {
    Self {
      source: default_source(),
      request_timeout_secs: default_request_timeout_secs(),
      enrichment: EnrichmentRule::default(),
      top_keywords: default_top_keywords(),
      similar_patents: default_similar_patents(),
      max_abstract_chars: default_max_abstract_chars(),
      record_soft_limit: default_record_soft_limit(),
      theme: Theme::default(),
    }
  }
}

impl Config {
  /// Load configuration from a file
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
      .map_err(|e| PatentError::config(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&content).map_err(|e| PatentError::config(format!("{}: {e}", path.display())))
  }

  /// Load from `explicit`, the environment, the working directory or the
  /// user config dir, in that order; defaults when none exist
  pub fn load(explicit: Option<&Path>) -> Result<Self> {
    let mut config = match Self::locate(explicit) {
      Some(path) => {
        debug!("Loading configuration - path={}", path.display());
        Self::load_from_file(&path)?
      }
      None => Config::default(),
    };

    if let Ok(source) = std::env::var(SOURCE_ENV) {
      if !source.trim().is_empty() {
        config.source = source;
      }
    }

    Ok(config)
  }

  /// Path of the configuration file that [`Config::load`] would read
  pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
      return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
      return Some(PathBuf::from(path));
    }

    let local = ["patents.json", ".patents.json"].iter().map(PathBuf::from).find(|p| p.exists());
    if local.is_some() {
      return local;
    }

    dirs::config_dir().map(|dir| dir.join("patents").join("config.json")).filter(|p| p.exists())
  }

  /// Save configuration to a file
  pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
    let content = serde_json::to_string_pretty(self)?;
    std::fs::write(path.as_ref(), content)
      .map_err(|e| PatentError::config(format!("cannot write {}: {e}", path.as_ref().display())))
  }
}
