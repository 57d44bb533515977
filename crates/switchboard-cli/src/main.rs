//! `switchboard`: operator tool for the call-center configuration.
//!
//! # Usage
//!
//! ```
//! switchboard check callcenter.toml
//! switchboard import callcenter.toml --store ~/.local/share/switchboard/store.db
//! ```
//!
//! See [`manifest`] for the file format.

mod import;
mod manifest;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use switchboard_core::phone::Region;
use switchboard_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use manifest::{Manifest, Plan};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "switchboard", about = "Validate and load switchboard call-center configuration")]
struct Args {
  /// Region used to read phone numbers without a country prefix.
  #[arg(long, default_value = "US", global = true)]
  region: String,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Validate a configuration file without touching the store.
  Check {
    file: PathBuf,
  },
  /// Validate a configuration file, then write every entry into the store.
  Import {
    file: PathBuf,

    /// SQLite store to write into; created if missing.
    #[arg(long, default_value = "switchboard.db")]
    store: PathBuf,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let region = Region::new(&args.region).context("invalid --region")?;

  match args.command {
    Command::Check { file } => {
      let plan = load(&file, &region)?;
      println!(
        "{}: {} numbers, {} mailboxes, {} menus, {} items; ok",
        file.display(),
        plan.numbers.len(),
        plan.mailboxes.len(),
        plan.menus.len(),
        plan.item_count(),
      );
    }
    Command::Import { file, store } => {
      let plan = load(&file, &region)?;
      let store_path = expand_tilde(&store);
      let store = SqliteStore::open(&store_path)
        .await
        .with_context(|| format!("failed to open store at {store_path:?}"))?;
      let summary = import::apply(plan, &store).await?;
      tracing::info!(
        numbers = summary.numbers,
        mailboxes = summary.mailboxes,
        menus = summary.menus,
        items = summary.items,
        "import complete"
      );
    }
  }

  Ok(())
}

fn load(path: &Path, region: &Region) -> Result<Plan> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading configuration file {}", path.display()))?;
  Manifest::parse(&raw)?.plan(region)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
