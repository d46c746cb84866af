//! Layered configuration: defaults, `seed.toml`, `EDUVANCE_*` variables, the
//! legacy script variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::ValueEnum;
use config::{Config, Environment, File};
use eduvance_core::ingest::DEFAULT_BATCH_SIZE;
use eduvance_store_mysql::MysqlConfig;
use eduvance_store_supabase::SupabaseConfig;
use serde::Deserialize;

/// Which database the run talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  Supabase,
  Mysql,
  Sqlite,
}

impl Backend {
  pub fn as_str(self) -> &'static str {
    match self {
      Backend::Supabase => "supabase",
      Backend::Mysql => "mysql",
      Backend::Sqlite => "sqlite",
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupabaseSettings {
  pub url:              Option<String>,
  pub service_role_key: Option<String>,
}

impl SupabaseSettings {
  /// Both values are required; there is nothing sensible to prompt for.
  pub fn require(&self) -> Result<SupabaseConfig> {
    let url = non_empty(self.url.clone())
      .context("Supabase URL missing: set NEXT_PUBLIC_SUPABASE_URL or supabase.url")?;
    let service_role_key = non_empty(self.service_role_key.clone()).context(
      "Supabase service-role key missing: set SUPABASE_SERVICE_ROLE_KEY or supabase.service_role_key",
    )?;
    Ok(SupabaseConfig { url, service_role_key })
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqliteSettings {
  pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub backend:    Option<Backend>,
  pub data_dir:   PathBuf,
  pub batch_size: usize,
  pub mysql:      MysqlConfig,
  #[serde(default)]
  pub supabase:   SupabaseSettings,
  pub sqlite:     SqliteSettings,
}

/// Values the command line can override.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub backend:    Option<Backend>,
  pub data_dir:   Option<PathBuf>,
  pub batch_size: Option<u32>,
}

/// Unprefixed variable names shared with the web app's `.env`.
#[derive(Debug, Clone, Default)]
pub struct LegacyEnv {
  pub mysql_host:        Option<String>,
  pub mysql_port:        Option<String>,
  pub mysql_database:    Option<String>,
  pub mysql_user:        Option<String>,
  pub mysql_password:    Option<String>,
  pub supabase_url:      Option<String>,
  pub supabase_role_key: Option<String>,
}

impl LegacyEnv {
  pub fn from_env() -> Self {
    let var = |name: &str| non_empty(std::env::var(name).ok());
    Self {
      mysql_host:        var("MYSQL_HOST"),
      mysql_port:        var("MYSQL_PORT"),
      mysql_database:    var("MYSQL_DATABASE"),
      mysql_user:        var("MYSQL_USER").or_else(|| var("MYSQL_USERNAME")),
      mysql_password:    var("MYSQL_PASSWORD"),
      supabase_url:      var("NEXT_PUBLIC_SUPABASE_URL"),
      supabase_role_key: var("SUPABASE_SERVICE_ROLE_KEY"),
    }
  }
}

impl Settings {
  pub fn load(file: &Path, legacy: LegacyEnv, overrides: Overrides) -> Result<Self> {
    let defaults = MysqlConfig::default();
    let settings = Config::builder()
      .set_default("data_dir", "./data-import")?
      .set_default("batch_size", DEFAULT_BATCH_SIZE as i64)?
      .set_default("mysql.host", defaults.host)?
      .set_default("mysql.port", i64::from(defaults.port))?
      .set_default("mysql.database", defaults.database)?
      .set_default("mysql.user", defaults.user)?
      .set_default("sqlite.path", "eduvance.db")?
      .add_source(File::from(file).required(false))
      .add_source(Environment::with_prefix("EDUVANCE").prefix_separator("_").separator("__"))
      .set_override_option("mysql.host", legacy.mysql_host)?
      .set_override_option("mysql.port", legacy.mysql_port)?
      .set_override_option("mysql.database", legacy.mysql_database)?
      .set_override_option("mysql.user", legacy.mysql_user)?
      .set_override_option("mysql.password", legacy.mysql_password)?
      .set_override_option("supabase.url", legacy.supabase_url)?
      .set_override_option("supabase.service_role_key", legacy.supabase_role_key)?
      .set_override_option("backend", overrides.backend.map(Backend::as_str))?
      .set_override_option(
        "data_dir",
        overrides.data_dir.map(|p| p.to_string_lossy().into_owned()),
      )?
      .set_override_option("batch_size", overrides.batch_size.map(i64::from))?
      .build()
      .with_context(|| format!("failed to read configuration from {}", file.display()))?;

    let settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;

    if settings.batch_size == 0 {
      bail!("batch_size must be at least 1");
    }
    Ok(settings)
  }
}

fn non_empty(value: Option<String>) -> Option<String> { value.filter(|v| !v.trim().is_empty()) }
