//! Display formatting for the terminal views

use colored::*;

use crate::aggregate::{
  ClusterAggregate, DashboardSummary, FacetSets, FacetValue, KeywordCount, KeywordTier, YearTrend,
};
use crate::predict::PredictionResult;
use crate::record::Record;
use crate::similarity::ScoredRecord;
use crate::theme::ThemeContext;

/// Shown wherever an aggregate has nothing to report
pub const NO_DATA: &str = "No data available";

const BAR_WIDTH: usize = 40;
const PREVIEW_CHARS: usize = 100;

/// Highlight search terms in text
pub fn highlight_keywords(text: &str, terms: &[String]) -> String {
  let mut result = text.to_string();

  let mut sorted = terms.to_vec();
  sorted.sort_by_key(|b| std::cmp::Reverse(b.len()));

  for term in sorted {
    if term.is_empty() {
      continue;
    }

    let term_lower = term.to_lowercase();
    let result_lower = result.to_lowercase();
    // Lowercasing can shift byte offsets for some scripts
    if result_lower.len() != result.len() || term_lower.len() != term.len() {
      continue;
    }

    let mut highlighted = String::new();
    let mut end = 0;
    let mut start = 0;

    while let Some(pos) = result_lower[start..].find(&term_lower) {
      let abs_pos = start + pos;

      highlighted.push_str(&result[end..abs_pos]);

      let match_text = &result[abs_pos..abs_pos + term.len()];
      highlighted.push_str(&match_text.yellow().bold().to_string());

      end = abs_pos + term.len();
      start = end;
    }

    highlighted.push_str(&result[end..]);
    result = highlighted;
  }

  result
}

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    if paragraph.trim().is_empty() {
      lines.push(String::new());
      continue;
    }

    let words: Vec<&str> = paragraph.split_whitespace().collect();
    let mut current_line = String::new();

    for word in words {
      if current_line.is_empty() {
        current_line = word.to_string();
      } else if current_line.len() + 1 + word.len() <= width {
        current_line.push(' ');
        current_line.push_str(word);
      } else {
        lines.push(current_line);
        current_line = word.to_string();
      }
    }

    if !current_line.is_empty() {
      lines.push(current_line);
    }
  }

  lines
}

/// First `max_chars` characters of `text`, with an ellipsis when cut
pub fn preview(text: &str, max_chars: usize) -> String {
  if text.chars().count() <= max_chars {
    text.to_string()
  } else {
    format!("{}...", text.chars().take(max_chars).collect::<String>())
  }
}

/// Horizontal bar scaled against `max`
pub fn bar(value: usize, max: usize) -> String {
  if max == 0 {
    return String::new();
  }
  let filled = (value * BAR_WIDTH).div_ceil(max);
  "█".repeat(filled)
}

fn heading(ctx: &ThemeContext, title: &str) {
  println!("{}", title.color(ctx.palette().accent).bold());
  println!();
}

fn or_na(value: Option<&str>) -> &str {
  value.unwrap_or("N/A")
}

fn year_or_na(record: &Record) -> String {
  record.year().map(|y| y.to_string()).unwrap_or_else(|| "N/A".to_string())
}

/// Terminal error state for a view that failed to load
pub fn display_error(ctx: &ThemeContext, message: &str) {
  eprintln!("{} {}", "Error:".color(ctx.palette().error).bold(), message);
}

pub fn display_dashboard(ctx: &ThemeContext, summary: &DashboardSummary) {
  let palette = ctx.palette();
  heading(ctx, "Patent Clustering & Exploration");

  let total = |count: usize| match count {
    0 => NO_DATA.color(palette.muted),
    n => n.to_string().color(palette.accent).bold(),
  };
  println!("  Total patents:  {}", total(summary.total_patents));
  println!("  Total clusters: {}", total(summary.total_clusters));
  println!();
  println!("{}", "Top keywords".bold());
  if summary.top_keywords.is_empty() {
    println!("  {}", NO_DATA.color(palette.muted));
  } else {
    display_keyword_bars(ctx, &summary.top_keywords);
  }
}

fn display_keyword_bars(ctx: &ThemeContext, counts: &[KeywordCount]) {
  let max = counts.iter().map(|k| k.count).max().unwrap_or(0);
  let width = counts.iter().map(|k| k.keyword.len()).max().unwrap_or(0);
  for entry in counts {
    println!(
      "  {:<width$}  {} {}",
      entry.keyword,
      bar(entry.count, max).color(ctx.palette().accent),
      entry.count,
      width = width
    );
  }
}

pub fn display_clusters(ctx: &ThemeContext, clusters: &[ClusterAggregate<'_>], trend: &YearTrend) {
  let palette = ctx.palette();
  heading(ctx, "Cluster Explorer");

  if clusters.is_empty() {
    println!("  {}", NO_DATA.color(palette.muted));
    return;
  }

  println!("{}", "Cluster sizes".bold());
  let max = clusters.iter().map(|c| c.count).max().unwrap_or(0);
  for cluster in clusters {
    let id = cluster.cluster_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    println!(
      "  [{:>3}] {:<28} {} {}",
      id,
      cluster.display_name(),
      bar(cluster.count, max).color(palette.accent),
      cluster.count
    );
    if !cluster.keywords.is_empty() {
      let top: Vec<&str> = cluster.keywords.iter().take(5).map(String::as_str).collect();
      println!("        {}", top.join(", ").color(palette.muted));
    }
  }

  if !trend.years.is_empty() {
    println!();
    println!("{}", "Patents per year".bold());
    let years: Vec<String> = trend.years.iter().map(|y| format!("{y:>6}")).collect();
    println!("  {:<28}{}", "", years.join(""));
    for series in &trend.series {
      let counts: Vec<String> = series.counts.iter().map(|c| format!("{c:>6}")).collect();
      println!("  {:<28}{}", series.name, counts.join(""));
    }
  }
}

pub fn display_cluster_members(ctx: &ThemeContext, cluster: &ClusterAggregate<'_>) {
  let palette = ctx.palette();
  println!();
  println!(
    "{} {} ({} patents)",
    "Cluster".bold(),
    cluster.display_name().color(palette.accent).bold(),
    cluster.count
  );
  if !cluster.keywords.is_empty() {
    println!("  Keywords: {}", cluster.keywords.join(", ").color(palette.secondary));
  }
  for record in &cluster.members {
    println!("  #{:<5} {}", record.no().map(|n| n.to_string()).unwrap_or_default(), record.label());
  }
}

pub fn display_patent_list(ctx: &ThemeContext, records: &[Record], search_terms: &[String], compact: bool) {
  let palette = ctx.palette();
  heading(ctx, "Patent List");

  if records.is_empty() {
    println!("{}", "No patents match the selected filters.".color(palette.muted));
    return;
  }

  for record in records {
    let id = record.no().map(|n| format!("#{n}")).unwrap_or_else(|| "#?".to_string());
    let title = highlight_keywords(record.label(), search_terms);

    if compact {
      println!("{:<6} {}  {}", id.color(palette.muted), title, or_na(record.cluster()).color(palette.secondary));
      continue;
    }

    println!("{} {}", id.color(palette.muted), title.bold());
    let applicants = highlight_keywords(&preview(record.applicants().unwrap_or(""), PREVIEW_CHARS), search_terms);
    if !applicants.is_empty() {
      println!("  {applicants}");
    }
    println!(
      "  {}",
      format!(
        "Cluster: {} | Year: {} | Country: {}",
        or_na(record.cluster()),
        year_or_na(record),
        or_na(record.country())
      )
      .color(palette.muted)
    );
    println!();
  }

  println!("{}", format!("{} patents", records.len()).color(palette.muted));
}

pub fn display_facets(ctx: &ThemeContext, facets: &FacetSets) {
  let palette = ctx.palette();
  let join = |values: &std::collections::BTreeSet<FacetValue>| {
    if values.is_empty() {
      NO_DATA.to_string()
    } else {
      values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
    }
  };

  println!("{}", "Available filters".bold());
  println!("  {} {}", "clusters: ".color(palette.accent), join(&facets.clusters));
  println!("  {} {}", "years:    ".color(palette.accent), join(&facets.years));
  println!("  {} {}", "countries:".color(palette.accent), join(&facets.countries));
  println!("  {} {}", "keywords: ".color(palette.accent), join(&facets.keywords));
  println!();
}

pub fn display_patent_detail(ctx: &ThemeContext, record: &Record, similar: &[ScoredRecord<'_>]) {
  let palette = ctx.palette();
  heading(ctx, record.label());

  for line in wrap_text(record.abstract_text().unwrap_or("No abstract available"), 80) {
    println!("{line}");
  }
  println!();
  println!(
    "{}",
    format!(
      "ID: {} | Cluster: {} | Year: {} | Country: {}",
      record.no().map(|n| n.to_string()).unwrap_or_else(|| "N/A".to_string()),
      or_na(record.cluster()),
      year_or_na(record),
      or_na(record.country())
    )
    .color(palette.muted)
  );
  if let Some(applicants) = record.applicants() {
    println!("{}", format!("Applicants: {applicants}").color(palette.muted));
  }

  println!();
  println!("{}", "Keywords".bold());
  if record.keywords().is_empty() {
    println!("  {}", NO_DATA.color(palette.muted));
  } else {
    println!("  {}", record.keywords().join(", ").color(palette.secondary));
  }

  println!();
  println!("{}", "Similar Patents".bold());
  if similar.is_empty() {
    println!("  {}", NO_DATA.color(palette.muted));
  }
  for scored in similar {
    println!(
      "  #{:<5} {} {}",
      scored.record.no().map(|n| n.to_string()).unwrap_or_default(),
      scored.record.label(),
      format!("({:.3})", scored.similarity).color(palette.muted)
    );
  }
}

pub fn display_keyword_cloud(ctx: &ThemeContext, cluster: Option<&str>, counts: &[KeywordCount]) {
  let palette = ctx.palette();
  heading(ctx, &format!("Keywords: {}", cluster.unwrap_or("All Clusters")));

  if counts.is_empty() {
    println!("  {}", NO_DATA.color(palette.muted));
    return;
  }

  let max = counts.iter().map(|k| k.count).max().unwrap_or(0);
  let words: Vec<(String, String)> = counts
    .iter()
    .map(|entry| {
      let color = match KeywordTier::of(entry.count, max) {
        KeywordTier::High => palette.tiers[0],
        KeywordTier::Medium => palette.tiers[1],
        KeywordTier::Low => palette.tiers[2],
      };
      let plain = format!("{}({})", entry.keyword, entry.count);
      let word = plain.color(color);
      let styled = if entry.count * 3 > max * 2 { word.bold().to_string() } else { word.to_string() };
      (plain, styled)
    })
    .collect();

  for line in wrap_styled(&words, 78) {
    println!("  {line}");
  }
}

/// Lay out `(plain, styled)` words two spaces apart, breaking lines on the
/// visible width of the plain text so escape codes never count
pub fn wrap_styled(words: &[(String, String)], width: usize) -> Vec<String> {
  let mut lines = Vec::new();
  let mut line = String::new();
  let mut used = 0;

  for (plain, styled) in words {
    let len = plain.chars().count();
    if used > 0 && used + 2 + len > width {
      lines.push(std::mem::take(&mut line));
      used = 0;
    }
    if used > 0 {
      line.push_str("  ");
      used += 2;
    }
    line.push_str(styled);
    used += len;
  }

  if used > 0 {
    lines.push(line);
  }
  lines
}

pub fn display_keyword_patents(ctx: &ThemeContext, keyword: &str, records: &[&Record]) {
  let palette = ctx.palette();
  println!();
  println!("{} {} ({} patents)", "Patents tagged".bold(), keyword.color(palette.accent).bold(), records.len());
  for record in records {
    println!("  #{:<5} {}", record.no().map(|n| n.to_string()).unwrap_or_default(), record.label());
  }
}

pub fn display_prediction(ctx: &ThemeContext, result: &PredictionResult) {
  let palette = ctx.palette();
  heading(ctx, "Prediction Result");

  let id = result.cluster_id.map(|id| id.to_string()).unwrap_or_else(|| "N/A".to_string());
  println!(
    "{} {} (ID: {})",
    "Predicted Cluster:".bold(),
    or_na(result.cluster.as_deref()).color(palette.accent).bold(),
    id
  );

  println!();
  println!("{}", "Keywords".bold());
  if result.keywords.is_empty() {
    println!("  {}", NO_DATA.color(palette.muted));
  } else {
    println!("  {}", result.keywords.join(", ").color(palette.secondary));
  }

  println!();
  println!("{}", "Similar Patents".bold());
  for patent in &result.similar_patents {
    println!("  {} {}", patent.record.label().bold(), format!("({:.3})", patent.similarity).color(palette.muted));
    if let Some(text) = patent.record.abstract_text() {
      println!("    {}", preview(text, PREVIEW_CHARS).color(palette.muted));
    }
  }

  println!();
  println!(
    "{}",
    "Note: predictions use a random stand-in vector, so repeated submissions can differ.".color(palette.muted)
  );
}

pub fn display_about(ctx: &ThemeContext) {
  heading(ctx, "About");
  let text = "Patents explores a pre-computed patent clustering dataset. Clusters, keywords and \
              similarity vectors are produced offline by an external pipeline and delivered as a \
              single JSON file; this tool only reads and summarizes it.\n\n\
              Views: dashboard (headline numbers and top keywords), clusters (cluster sizes and \
              yearly trend), list (filterable patent list), show (patent detail with similar \
              patents), keywords (keyword frequencies and drill-down) and predict (mock cluster \
              prediction for a new abstract).";
  for line in wrap_text(text, 80) {
    println!("{line}");
  }
}
