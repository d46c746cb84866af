//! Connection settings for [`MysqlStore`](crate::MysqlStore).

use serde::Deserialize;

/// Where and as whom to connect.
///
/// A `None` password means "not configured"; the operator binary prompts for
/// it before connecting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MysqlConfig {
  pub host:     String,
  pub port:     u16,
  pub database: String,
  pub user:     String,
  pub password: Option<String>,
}

impl Default for MysqlConfig {
  fn default() -> Self {
    Self {
      host:     "localhost".into(),
      port:     3306,
      database: "eduvance_db".into(),
      user:     "root".into(),
      password: None,
    }
  }
}

impl MysqlConfig {
  /// `user@host:port/database`, for logs. Never includes the password.
  pub fn display_target(&self) -> String {
    format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_a_local_server() {
    let config = MysqlConfig::default();
    assert_eq!(config.display_target(), "root@localhost:3306/eduvance_db");
    assert_eq!(config.password, None);
  }

  #[test]
  fn partial_tables_fill_in_defaults() {
    let config: MysqlConfig =
      serde_json::from_str(r#"{"host": "db.internal", "password": "hunter2"}"#).unwrap();
    assert_eq!(config.host, "db.internal");
    assert_eq!(config.port, 3306);
    assert_eq!(config.password.as_deref(), Some("hunter2"));
  }
}
