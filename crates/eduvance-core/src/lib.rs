//! Core types and the paper-metadata ingestion pipeline for Eduvance.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! turns a `data-import` directory of scraped JSON link lists into
//! deduplicated paper rows and drives any [`store::PaperStore`] backend to
//! persist them.
//!
//! Pipeline:
//!   data-import/{syllabus}/{subject} ({year})/*.json
//!     └─ catalog::scan()              → Vec<CatalogEntry>
//!          └─ source::load_source_file() → SourceFile (filename → session/year)
//!               └─ aggregate::fold_files()  → Aggregation (classify + unit code)
//!                    └─ ingest::ingest()        → sessions resolved, papers upserted

#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod ingest;
pub mod material;
pub mod paper;
pub mod session;
pub mod skip;
pub mod source;
pub mod store;
pub mod subject;
pub mod unit_code;

pub use error::{Error, Result};
