//! Per-view data loading
//!
//! Each view fetches its own copy of the dataset and computes its projection
//! in a background task. Tearing the view down cancels the task, and a
//! result that arrives after cancellation is thrown away instead of being
//! applied to a view that no longer exists.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Result;
use crate::normalize::EnrichmentRule;
use crate::record::Record;
use crate::source::{load_dataset_with_limit, PatentSource, DEFAULT_RECORD_SOFT_LIMIT};

/// Terminal state of a view load
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
  Ready(T),
  /// User-facing error message; views never retry
  Failed(String),
}

impl<T> ViewState<T> {
  pub fn from_result(result: Result<T>) -> Self {
    match result {
      Ok(value) => ViewState::Ready(value),
      Err(err) => ViewState::Failed(err.to_string()),
    }
  }
}

/// An in-flight load-then-compute operation owned by one view
pub struct ViewTask<T> {
  token: CancellationToken,
  handle: Option<JoinHandle<Option<Result<T>>>>,
}

impl<T: Send + 'static> ViewTask<T> {
  /// Start loading the dataset from `source` and run `build` over the records
  pub fn spawn<F>(source: Arc<dyn PatentSource>, rule: EnrichmentRule, build: F) -> Self
  where
    F: FnOnce(Vec<Record>) -> T + Send + 'static,
  {
    Self::spawn_with_limit(source, rule, DEFAULT_RECORD_SOFT_LIMIT, build)
  }

  pub fn spawn_with_limit<F>(source: Arc<dyn PatentSource>, rule: EnrichmentRule, soft_limit: usize, build: F) -> Self
  where
    F: FnOnce(Vec<Record>) -> T + Send + 'static,
  {
    let token = CancellationToken::new();
    let guard = token.clone();

    let handle = tokio::spawn(async move {
      let loaded = tokio::select! {
        _ = guard.cancelled() => None,
        loaded = load_dataset_with_limit(source.as_ref(), &rule, soft_limit) => Some(loaded),
      };

      match loaded {
        Some(records) if !guard.is_cancelled() => Some(records.map(build)),
        _ => {
          debug!("View load cancelled - discarding result");
          None
        }
      }
    });

    Self { token, handle: Some(handle) }
  }

  /// Tear the view down; any pending result is discarded
  pub fn cancel(&self) {
    self.token.cancel();
  }

  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }

  /// Wait for the load to finish. `None` means the result was discarded.
  pub async fn settle(mut self) -> Option<ViewState<T>> {
    let handle = self.handle.take()?;
    let outcome = handle.await.ok().flatten()?;

    if self.token.is_cancelled() {
      return None;
    }
    Some(ViewState::from_result(outcome))
  }
}

impl<T> Drop for ViewTask<T> {
  fn drop(&mut self) {
    self.token.cancel();
  }
}
