use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use patents::cli::commands::{self, Session};
use patents::cli::display::display_error;
use patents::config::Config;
use patents::filter::{Criterion, FilterState};
use patents::theme::{Theme, ThemeContext};

#[derive(Parser)]
#[command(name = "patents")]
#[command(about = "Patents - Cluster Explorer\nBrowse clusters, keywords and similar patents in a pre-computed dataset")]
#[command(version)]
struct Cli {
  /// Configuration file to use instead of the usual search locations
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Dataset path or http(s) URL, overriding the configuration
  #[arg(long, global = true)]
  source: Option<String>,

  /// Colour theme for this run
  #[arg(long, global = true, value_enum)]
  theme: Option<Theme>,

  /// Enable verbose logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Print JSON instead of formatted output
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

/// Criteria for the patent list; omitted flags match everything
#[derive(Args)]
struct FilterArgs {
  /// Exact cluster name
  #[arg(long)]
  cluster: Option<String>,
  /// Publication year
  #[arg(long)]
  year: Option<String>,
  /// Country code
  #[arg(long)]
  country: Option<String>,
  /// Keyword the patent must carry
  #[arg(long)]
  keyword: Option<String>,
  /// Case-insensitive match against title or applicants
  #[arg(short, long)]
  search: Option<String>,
  /// Filter state as a JSON object; individual flags take precedence
  #[arg(long)]
  filter_json: Option<String>,
}

impl FilterArgs {
  fn flags(&self) -> FilterState {
    FilterState {
      cluster: Criterion::from_text(self.cluster.as_deref()),
      year: Criterion::from_text(self.year.as_deref()),
      country: Criterion::from_text(self.country.as_deref()),
      keyword: Criterion::from_text(self.keyword.as_deref()),
      search: Criterion::from_text(self.search.as_deref()),
    }
  }
}

#[derive(Subcommand)]
enum Command {
  /// Headline numbers and top keywords
  Dashboard,
  /// Cluster sizes and the yearly trend
  Clusters {
    /// Also list the members of this cluster
    #[arg(long)]
    id: Option<i64>,
  },
  /// Filterable list of patents
  List {
    #[command(flatten)]
    filters: FilterArgs,
    /// Show the values available for each filter
    #[arg(long)]
    facets: bool,
    /// One line per patent
    #[arg(short, long)]
    compact: bool,
  },
  /// Details and similar patents for one patent number
  Show {
    no: i64,
  },
  /// Keyword frequencies with optional drill-down
  Keywords {
    /// Restrict counts to one cluster name
    #[arg(long)]
    cluster: Option<String>,
    /// List the patents carrying this keyword
    #[arg(long)]
    keyword: Option<String>,
    /// Maximum number of keywords to show
    #[arg(short, long)]
    limit: Option<usize>,
  },
  /// Predict a cluster for a new abstract
  Predict {
    /// Abstract text
    text: Option<String>,
    /// Read the abstract from a .txt file instead
    #[arg(short, long)]
    file: Option<PathBuf>,
  },
  /// What this tool does
  About,
  /// Show the colour theme, or switch it
  Theme {
    /// Switch between light and dark and save the choice
    #[arg(long)]
    toggle: bool,
  },
}

fn init_logging(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    if verbose {
      EnvFilter::new("patents=debug,warn")
    } else {
      EnvFilter::new("warn")
    }
  });

  tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();
}

async fn handle(cli: Cli) -> Result<()> {
  let mut config = Config::load(cli.config.as_deref())?;
  if let Some(source) = cli.source {
    config.source = source;
  }
  if let Some(theme) = cli.theme {
    config.theme = theme;
  }
  let session = Session::new(config, cli.json);

  match cli.command {
    Command::Dashboard => commands::dashboard(&session).await,
    Command::Clusters { id } => commands::clusters(&session, id).await,
    Command::List { filters, facets, compact } => {
      let state = commands::resolve_filters(filters.flags(), filters.filter_json.as_deref())?;
      commands::list(&session, state, facets, compact).await
    }
    Command::Show { no } => commands::show(&session, no).await,
    Command::Keywords { cluster, keyword, limit } => {
      commands::keywords(&session, cluster.as_deref(), keyword.as_deref(), limit).await
    }
    Command::Predict { text, file } => commands::predict(&session, text.as_deref(), file.as_deref()).await,
    Command::About => commands::about(&session),
    Command::Theme { toggle } => commands::theme(&session, cli.config.as_deref(), toggle),
  }
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();
  init_logging(cli.verbose);
  let ctx = ThemeContext::new(cli.theme.unwrap_or_default());

  if let Err(e) = handle(cli).await {
    display_error(&ctx, &e.to_string());
    std::process::exit(1);
  }
}
