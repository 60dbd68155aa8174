use anyhow::{anyhow, Result};
use colored::*;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::aggregate::{
  cluster_year_trend, group_by_cluster, keyword_counts_in_cluster, rank_keywords, records_with_keyword, DashboardSummary,
  FacetSets,
};
use crate::cli::display;
use crate::config::Config;
use crate::filter::{apply_filters, Criterion, FilterState};
use crate::predict::{AbstractInput, Predictor};
use crate::record::Record;
use crate::similarity::nearest_records;
use crate::source::{source_for, PatentSource};
use crate::theme::ThemeContext;
use crate::view::{ViewState, ViewTask};

/// Everything a command needs, resolved once at startup
pub struct Session {
  pub config: Config,
  pub theme: ThemeContext,
  /// Print machine-readable JSON instead of the terminal views
  pub json: bool,
}

impl Session {
  pub fn new(config: Config, json: bool) -> Self {
    let theme = ThemeContext::new(config.theme);
    Self { config, theme, json }
  }

  fn source(&self) -> Result<Arc<dyn PatentSource>> {
    Ok(Arc::from(source_for(&self.config.source, self.config.request_timeout_secs)?))
  }

  /// Load the dataset for one view and project it with `build`.
  ///
  /// Ctrl-C tears the view down and the pending result is dropped.
  async fn load_view<T, F>(&self, build: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(Vec<Record>) -> T + Send + 'static,
  {
    let task = ViewTask::spawn_with_limit(
      self.source()?,
      self.config.enrichment.clone(),
      self.config.record_soft_limit,
      build,
    );

    let state = tokio::select! {
      state = task.settle() => state,
      _ = tokio::signal::ctrl_c() => {
        debug!("Interrupted - tearing down view");
        None
      }
    };

    match state {
      Some(ViewState::Ready(value)) => Ok(value),
      Some(ViewState::Failed(message)) => Err(anyhow!(message)),
      None => Err(anyhow!("Cancelled")),
    }
  }

  fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
  }
}

/// Headline numbers and the top keyword chart
pub async fn dashboard(session: &Session) -> Result<()> {
  let top_n = session.config.top_keywords;
  let summary = session.load_view(move |records| DashboardSummary::compute(&records, top_n)).await?;

  if session.json {
    return session.print_json(&summary);
  }
  display::display_dashboard(&session.theme, &summary);
  Ok(())
}

/// Cluster sizes, the per-year trend and optionally one cluster's members
pub async fn clusters(session: &Session, selected: Option<i64>) -> Result<()> {
  let records = session.load_view(|records| records).await?;
  let clusters = group_by_cluster(&records);
  let trend = cluster_year_trend(&records, &clusters);

  let chosen = match selected {
    Some(id) => Some(
      clusters
        .iter()
        .find(|c| c.cluster_id == Some(id))
        .ok_or_else(|| anyhow!("Cluster {id} not found"))?,
    ),
    None => None,
  };

  if session.json {
    return match chosen {
      Some(cluster) => session.print_json(cluster),
      None => session.print_json(&json!({ "clusters": clusters, "trend": trend })),
    };
  }

  display::display_clusters(&session.theme, &clusters, &trend);
  if let Some(cluster) = chosen {
    display::display_cluster_members(&session.theme, cluster);
  }
  Ok(())
}

/// Combine a `--filter-json` document with individual flags; flags win
pub fn resolve_filters(flags: FilterState, filter_json: Option<&str>) -> Result<FilterState> {
  let mut filters = match filter_json {
    Some(text) => serde_json::from_str::<FilterState>(text).map_err(|e| anyhow!("Invalid filter JSON: {e}"))?,
    None => FilterState::default(),
  };

  let merge = |target: &mut Criterion, flag: Criterion| {
    if flag.is_active() {
      *target = flag;
    }
  };
  merge(&mut filters.cluster, flags.cluster);
  merge(&mut filters.year, flags.year);
  merge(&mut filters.country, flags.country);
  merge(&mut filters.keyword, flags.keyword);
  merge(&mut filters.search, flags.search);

  Ok(filters)
}

/// Filtered patent list, with the available facet values on request
pub async fn list(session: &Session, filters: FilterState, show_facets: bool, compact: bool) -> Result<()> {
  debug!("Listing patents - filters={:?}", filters);
  let view_filters = filters.clone();
  let (facets, matching) = session
    .load_view(move |records| (FacetSets::collect(&records), apply_filters(&records, &view_filters)))
    .await?;

  if session.json {
    return if show_facets {
      session.print_json(&json!({ "facets": facets, "patents": matching }))
    } else {
      session.print_json(&matching)
    };
  }

  if show_facets {
    display::display_facets(&session.theme, &facets);
  }
  let terms: Vec<String> = match &filters.search {
    Criterion::Match(term) => vec![term.clone()],
    _ => Vec::new(),
  };
  display::display_patent_list(&session.theme, &matching, &terms, compact);
  Ok(())
}

/// One patent in detail, with its nearest neighbours by similarity vector
pub async fn show(session: &Session, no: i64) -> Result<()> {
  let records = session.load_view(|records| records).await?;
  let record = records
    .iter()
    .find(|r| r.no() == Some(no))
    .ok_or_else(|| anyhow!("Patent {no} not found"))?;
  let similar = nearest_records(record, &records, session.config.similar_patents);

  if session.json {
    return session.print_json(&json!({ "patent": record, "similar": similar }));
  }
  display::display_patent_detail(&session.theme, record, &similar);
  Ok(())
}

/// Keyword frequencies, optionally for one cluster, with a keyword drill-down
pub async fn keywords(
  session: &Session,
  cluster: Option<&str>,
  keyword: Option<&str>,
  limit: Option<usize>,
) -> Result<()> {
  let records = session.load_view(|records| records).await?;

  let mut counts = rank_keywords(keyword_counts_in_cluster(&records, cluster));
  if let Some(limit) = limit {
    counts.truncate(limit);
  }

  let tagged: Option<Vec<&Record>> = keyword.map(|k| {
    records_with_keyword(&records, k)
      .into_iter()
      .filter(|r| cluster.is_none() || r.cluster() == cluster)
      .collect()
  });

  if session.json {
    return match (keyword, &tagged) {
      (Some(keyword), Some(tagged)) => session.print_json(&json!({ "keyword": keyword, "patents": tagged })),
      _ => session.print_json(&counts),
    };
  }

  display::display_keyword_cloud(&session.theme, cluster, &counts);
  if let (Some(keyword), Some(tagged)) = (keyword, &tagged) {
    display::display_keyword_patents(&session.theme, keyword, tagged);
  }
  Ok(())
}

/// Mock cluster prediction for a typed or uploaded abstract
pub async fn predict(session: &Session, text: Option<&str>, file: Option<&Path>) -> Result<()> {
  let input = match file {
    Some(path) => AbstractInput::from_file(path)?,
    None => AbstractInput::Typed(text.unwrap_or_default().to_string()),
  };

  let source = source_for(&session.config.source, session.config.request_timeout_secs)?;
  let predictor = Predictor::new(source, session.config.enrichment.clone())
    .with_limits(session.config.max_abstract_chars, session.config.similar_patents);

  if !session.json {
    println!("{}", "Analyzing abstract...".color(session.theme.palette().muted));
  }
  let result = predictor.predict(&input).await?;

  if session.json {
    return session.print_json(&result);
  }
  display::display_prediction(&session.theme, &result);
  Ok(())
}

pub fn about(session: &Session) -> Result<()> {
  if session.json {
    return session.print_json(&json!({
      "name": env!("CARGO_PKG_NAME"),
      "version": env!("CARGO_PKG_VERSION"),
      "description": env!("CARGO_PKG_DESCRIPTION"),
    }));
  }
  display::display_about(&session.theme);
  Ok(())
}

/// Show the active theme, or flip it and persist the choice
pub fn theme(session: &Session, explicit_config: Option<&Path>, toggle: bool) -> Result<()> {
  let mut ctx = session.theme;

  if toggle {
    ctx.toggle();
    let path = Config::locate(explicit_config).unwrap_or_else(|| PathBuf::from("patents.json"));
    // Re-read the file so command-line overrides are not persisted
    let mut stored = if path.exists() { Config::load_from_file(&path)? } else { Config::default() };
    stored.theme = ctx.theme();
    stored.save_to_file(&path)?;
    debug!("Saved theme - path={}", path.display());
  }

  if session.json {
    return session.print_json(&json!({ "theme": ctx.theme() }));
  }
  let name = format!("{:?}", ctx.theme()).to_lowercase();
  println!("Theme: {}", name.color(ctx.palette().accent).bold());
  Ok(())
}
