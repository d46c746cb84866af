//! Supabase backend for the Eduvance paper store, over the PostgREST API.
//!
//! Every call authenticates with the service-role key, so row-level security
//! does not apply. Schema creation is out of reach of the REST surface; the
//! tables are expected to exist already.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{SupabaseConfig, SupabaseStore};
