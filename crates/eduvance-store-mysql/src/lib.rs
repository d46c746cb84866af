//! MySQL backend for the Eduvance paper store.
//!
//! Talks to a self-hosted MySQL 8.0.13+ server (expression column defaults)
//! through a single-connection [`sqlx`] pool. The target database is created
//! on connect when missing.

mod schema;
mod store;

pub mod config;
pub mod error;

pub use config::MysqlConfig;
pub use error::{Error, Result};
pub use store::MysqlStore;
