//! `eduvance-seed`: load scraped past-paper links into the Eduvance
//! database.
//!
//! # Usage
//!
//! ```text
//! eduvance-seed                          # pick backend and subject interactively
//! eduvance-seed --backend mysql papers --subject Physics
//! eduvance-seed --backend sqlite subjects
//! eduvance-seed --backend mysql init-schema
//! ```

mod commands;
mod prompt;
mod settings;

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use eduvance_store_mysql::MysqlStore;
use eduvance_store_sqlite::SqliteStore;
use eduvance_store_supabase::SupabaseStore;
use settings::{Backend, LegacyEnv, Overrides, Settings};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Seed Eduvance past-paper metadata from data-import JSON")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "seed.toml")]
  config: PathBuf,

  /// Database backend; prompts when neither this nor the config sets one.
  #[arg(short, long, value_enum, env = "EDUVANCE_BACKEND")]
  backend: Option<Backend>,

  /// Root of the data-import tree.
  #[arg(long, value_name = "DIR")]
  data_dir: Option<PathBuf>,

  /// Papers per upsert statement.
  #[arg(long)]
  batch_size: Option<u32>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
  /// Ingest papers for one subject (the default).
  Papers {
    /// Skip the menu and ingest this subject.
    #[arg(long)]
    subject: Option<String>,
  },
  /// Add subject rows for data-import folders the database does not know.
  Subjects,
  /// Create the subjects, exam_sessions and papers tables.
  InitSchema,
  /// Connect and count subjects.
  Check,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match run(cli).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      tracing::error!("{err:#}");
      println!("❌ {err:#}");
      ExitCode::FAILURE
    }
  }
}

async fn run(cli: Cli) -> Result<()> {
  let overrides = Overrides {
    backend:    cli.backend,
    data_dir:   cli.data_dir,
    batch_size: cli.batch_size,
  };
  let settings = Settings::load(&cli.config, LegacyEnv::from_env(), overrides)?;
  let command = cli.command.unwrap_or(Command::Papers { subject: None });

  let backend = match settings.backend {
    Some(backend) => backend,
    None => match prompt::choose_backend()? {
      Some(backend) => backend,
      None => return Ok(()),
    },
  };
  tracing::info!(backend = backend.as_str(), data_dir = %settings.data_dir.display(), "starting");

  match backend {
    Backend::Sqlite => {
      let path = &settings.sqlite.path;
      let store = SqliteStore::open(path)
        .await
        .with_context(|| format!("failed to open sqlite store at {}", path.display()))?;
      commands::dispatch(&store, &command, &settings).await
    }
    Backend::Mysql => {
      let mut mysql = settings.mysql.clone();
      if mysql.password.is_none() {
        mysql.password = Some(prompt::password("Enter MySQL password: ")?);
      }
      let store = MysqlStore::connect(&mysql)
        .await
        .with_context(|| format!("failed to connect to mysql at {}", mysql.display_target()))?;
      println!("✅ Connected to MySQL ({})", mysql.display_target());
      commands::dispatch(&store, &command, &settings).await
    }
    Backend::Supabase => {
      let config = settings.supabase.require()?;
      let store = SupabaseStore::new(config).context("failed to build the Supabase client")?;
      commands::dispatch(&store, &command, &settings).await
    }
  }
}
