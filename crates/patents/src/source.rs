//! Loading the static patent dataset
//!
//! The dataset is a single JSON array of records, reachable either over HTTP
//! or on the local filesystem. Every view calls [`load_dataset`] itself and
//! owns the records it gets back.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{PatentError, Result};
use crate::normalize::{normalize, EnrichmentRule};
use crate::record::{RawRecord, Record};

/// Record counts above this are outside what the views are built for
pub const DEFAULT_RECORD_SOFT_LIMIT: usize = 500;

/// Somewhere the raw dataset document can be fetched from
#[async_trait]
pub trait PatentSource: Send + Sync {
  /// Fetch the raw document body
  async fn fetch(&self) -> Result<String>;

  /// Human-readable location, used in error messages and logs
  fn location(&self) -> String;
}

/// Dataset served over HTTP(S)
pub struct HttpSource {
  client: Client,
  url: Url,
  timeout_secs: u64,
}

impl HttpSource {
  pub fn new(url: Url, timeout_secs: u64) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .build()
      .map_err(|e| PatentError::fetch(url.as_str(), e.to_string()))?;

    Ok(Self { client, url, timeout_secs })
  }
}

#[async_trait]
impl PatentSource for HttpSource {
  async fn fetch(&self) -> Result<String> {
    debug!("Fetching patent data over HTTP - url={}", self.url);

    let response = timeout(Duration::from_secs(self.timeout_secs), self.client.get(self.url.clone()).send())
      .await
      .map_err(|_| PatentError::fetch(self.location(), "request timed out"))?
      .map_err(|e| PatentError::fetch(self.location(), e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      return Err(PatentError::fetch(self.location(), format!("HTTP error: {status}")));
    }

    response.text().await.map_err(|e| PatentError::fetch(self.location(), e.to_string()))
  }

  fn location(&self) -> String {
    self.url.to_string()
  }
}

/// Dataset stored on the local filesystem
pub struct FileSource {
  path: PathBuf,
}

impl FileSource {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

#[async_trait]
impl PatentSource for FileSource {
  async fn fetch(&self) -> Result<String> {
    debug!("Reading patent data from file - path={}", self.path.display());
    tokio::fs::read_to_string(&self.path).await.map_err(|e| PatentError::fetch(self.location(), e.to_string()))
  }

  fn location(&self) -> String {
    self.path.display().to_string()
  }
}

/// Dataset held in memory
pub struct StaticSource {
  body: String,
}

impl StaticSource {
  pub fn new(body: impl Into<String>) -> Self {
    Self { body: body.into() }
  }
}

#[async_trait]
impl PatentSource for StaticSource {
  async fn fetch(&self) -> Result<String> {
    Ok(self.body.clone())
  }

  fn location(&self) -> String {
    "<memory>".to_string()
  }
}

/// Pick a source for `location`: http(s) URLs go over the network, anything else is a file path
pub fn source_for(location: &str, timeout_secs: u64) -> Result<Box<dyn PatentSource>> {
  match Url::parse(location) {
    Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Box::new(HttpSource::new(url, timeout_secs)?)),
    _ => Ok(Box::new(FileSource::new(location))),
  }
}

/// Parse the dataset document into raw records.
///
/// The document must be a JSON array. Elements that are not objects are
/// skipped rather than failing the whole load.
pub fn parse_records(body: &str) -> Result<Vec<RawRecord>> {
  let document: Value = serde_json::from_str(body)?;
  let Value::Array(items) = document else {
    return Err(PatentError::parse("expected a JSON array of patent records"));
  };

  let mut records = Vec::with_capacity(items.len());
  for (position, item) in items.into_iter().enumerate() {
    if !item.is_object() {
      warn!("Skipping malformed patent record - position={}", position);
      continue;
    }
    let record: RawRecord = serde_json::from_value(item)?;
    if record.keywords.is_none() {
      debug!("Patent record has no keywords - position={}", position);
    }
    records.push(record);
  }

  Ok(records)
}

/// Fetch, parse and normalize the dataset
pub async fn load_dataset(source: &dyn PatentSource, rule: &EnrichmentRule) -> Result<Vec<Record>> {
  load_dataset_with_limit(source, rule, DEFAULT_RECORD_SOFT_LIMIT).await
}

pub async fn load_dataset_with_limit(
  source: &dyn PatentSource,
  rule: &EnrichmentRule,
  soft_limit: usize,
) -> Result<Vec<Record>> {
  let body = source.fetch().await?;
  let raw = parse_records(&body)?;

  if raw.len() > soft_limit {
    warn!(
      "Dataset exceeds the supported size; views recompute everything on each change - records={}, soft_limit={}",
      raw.len(),
      soft_limit
    );
  }

  let records = normalize(raw, rule);
  info!("Loaded patent data - source={}, records={}", source.location(), records.len());
  Ok(records)
}
