//! `serpwatch` — search ranking tracker.
//!
//! Reads `serpwatch.toml` (or the path given with `--config`), opens the
//! SQLite rank history and runs checks or catalog maintenance commands.
//!
//! # Usage
//!
//! ```
//! serpwatch keywords import keywords.txt --genre tools
//! serpwatch check --genre tools --limit 50
//! serpwatch check --keywords adhoc.txt --json
//! serpwatch status
//! ```

mod output;
mod settings;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serpwatch_check::CheckOrchestrator;
use serpwatch_core::{
  keyword::{NewKeyword, normalize_keywords},
  store::{KeywordCatalog, RankHistoryStore},
};
use serpwatch_provider::DataForSeoClient;
use serpwatch_store_sqlite::SqliteStore;
use settings::{Settings, expand_tilde};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "serpwatch", author, version, about = "Search ranking tracker")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "serpwatch.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Check current rankings and report regressions.
  Check {
    /// Read keywords from this file (one per line) instead of the catalog.
    #[arg(long, value_name = "FILE")]
    keywords: Option<PathBuf>,
    /// Only check catalog keywords of this genre.
    #[arg(long, conflicts_with = "keywords")]
    genre:    Option<String>,
    /// Check at most this many keywords.
    #[arg(long)]
    limit:    Option<usize>,
    /// Print the full report as JSON.
    #[arg(long)]
    json:     bool,
  },
  /// Maintain the keyword catalog.
  Keywords {
    #[command(subcommand)]
    action: KeywordsCommand,
  },
  /// Show catalogued keywords with their last known rank.
  Status {
    #[arg(long)]
    genre: Option<String>,
  },
  /// Show the latest competitor snapshot of a keyword.
  Competitors {
    keyword: String,
    #[arg(long, default_value_t = 10)]
    limit:   usize,
  },
}

#[derive(Subcommand)]
enum KeywordsCommand {
  /// Add a keyword, or update it if it already exists.
  Add {
    phrase:   String,
    #[arg(long)]
    genre:    Option<String>,
    #[arg(long)]
    url:      Option<String>,
    #[arg(long)]
    priority: Option<String>,
    #[arg(long)]
    note:     Option<String>,
  },
  /// Import keywords from a file, one per line.
  Import {
    file:  PathBuf,
    #[arg(long)]
    genre: Option<String>,
  },
  /// List catalogued keywords.
  List {
    #[arg(long)]
    genre: Option<String>,
  },
  /// List known genres.
  Genres,
  /// Remove a keyword together with its ranking history.
  Remove { phrase: String },
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
  let settings = Settings::load(&cli.config)?;

  let db_path = expand_tilde(&settings.db_path);
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open store at {db_path:?}"))?;
  let store = Arc::new(store);

  match cli.command {
    Command::Check { keywords, genre, limit, json } => {
      check(&settings, store, keywords.as_deref(), genre.as_deref(), limit, json).await
    }
    Command::Keywords { action } => manage_keywords(&store, action).await,
    Command::Status { genre } => {
      let rows = store.keywords_with_rankings(genre.as_deref()).await?;
      output::print_status(&rows);
      Ok(())
    }
    Command::Competitors { keyword, limit } => {
      let rows = store.latest_competitors(&keyword, limit).await?;
      output::print_competitors(&keyword, &rows);
      Ok(())
    }
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn check(
  settings: &Settings,
  store: Arc<SqliteStore>,
  file: Option<&Path>,
  genre: Option<&str>,
  limit: Option<usize>,
  json: bool,
) -> anyhow::Result<()> {
  settings.ensure_checkable()?;

  let raw = match file {
    Some(path) => read_lines(path)?,
    None => store
      .list_keywords(genre)
      .await?
      .into_iter()
      .map(|k| k.phrase)
      .collect(),
  };
  let keywords = select_keywords(&raw, limit);
  if keywords.is_empty() {
    warn!("no keywords to check");
    return Ok(());
  }

  let provider = DataForSeoClient::new(settings.provider.clone())
    .context("failed to build provider client")?;
  let orchestrator = Arc::new(CheckOrchestrator::new(
    Arc::new(provider),
    store,
    &settings.target_domain,
    settings.check.clone(),
  ));

  info!(keywords = keywords.len(), domain = %settings.target_domain, "starting check");

  // Run on its own task so Ctrl-C is still handled while polling.
  let task = tokio::spawn({
    let orchestrator = orchestrator.clone();
    async move { orchestrator.run(&keywords).await }
  });

  let report = tokio::select! {
    joined = task => joined.context("check task failed")??,
    _ = tokio::signal::ctrl_c() => {
      anyhow::bail!("interrupted; pending jobs were abandoned and nothing further was committed");
    }
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&report)?);
  } else {
    output::print_report(&report, orchestrator.params());
  }
  Ok(())
}

async fn manage_keywords(store: &SqliteStore, action: KeywordsCommand) -> anyhow::Result<()> {
  match action {
    KeywordsCommand::Add { phrase, genre, url, priority, note } => {
      let keyword = store
        .upsert_keyword(NewKeyword { phrase, genre, url, priority, note })
        .await?;
      println!("saved {:?}", keyword.phrase);
    }
    KeywordsCommand::Import { file, genre } => {
      let inputs = read_lines(&file)?
        .into_iter()
        .map(|phrase| NewKeyword { phrase, genre: genre.clone(), ..NewKeyword::default() })
        .collect();
      let written = store.upsert_keywords(inputs).await?;
      println!("imported {written} keywords from {}", file.display());
    }
    KeywordsCommand::List { genre } => {
      output::print_keywords(&store.list_keywords(genre.as_deref()).await?);
    }
    KeywordsCommand::Genres => {
      for genre in store.list_genres().await? {
        println!("{genre}");
      }
    }
    KeywordsCommand::Remove { phrase } => {
      if store.delete_keyword(&phrase).await? {
        println!("removed {phrase:?}");
      } else {
        println!("no keyword {phrase:?}");
      }
    }
  }
  Ok(())
}

/// Distinct keywords of `raw` in first-seen order, at most `limit` of them.
fn select_keywords(raw: &[String], limit: Option<usize>) -> Vec<String> {
  let mut keywords = normalize_keywords(raw);
  if let Some(limit) = limit {
    keywords.truncate(limit);
  }
  keywords
}

/// Non-empty lines of `path`, trimmed; lines starting with `#` are skipped.
fn read_lines(path: &Path) -> anyhow::Result<Vec<String>> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading keyword file {}", path.display()))?;
  Ok(
    raw
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty() && !line.starts_with('#'))
      .map(str::to_string)
      .collect(),
  )
}
