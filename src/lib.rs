//! Publication sync core library.
//!
//! Fetches a researcher's works from the ORCID public API, normalizes them
//! into [`Publication`] records, tags them with a rule-based classifier and
//! persists the list as a JSON artifact (optionally mirrored into SQLite).
//!
//! # Architecture
//!
//! - [`http`] - Retrying HTTP client with backoff and rate-limit handling
//! - [`orcid`] - ORCID token, works listing and work detail calls
//! - [`normalize`] - Provider records to [`Publication`]
//! - [`tags`] - Tag rules and classifier
//! - [`store`] - JSON artifact with backup-before-write
//! - [`db`] / [`repository`] - Optional SQLite backend
//! - [`pipeline`] - The ingestion run
//! - [`maintenance`] - Re-tagging and JSON to SQLite migration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod maintenance;
pub mod normalize;
pub mod orcid;
pub mod pipeline;
pub mod publication;
pub mod repository;
pub mod store;
pub mod tags;
mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, Credentials, IngestConfig};
pub use db::{Database, DbError};
pub use error::{IngestError, RecordError};
pub use http::{FetchError, RetryClient, RetryPolicy, TokioSleeper};
pub use maintenance::{MigrateReport, RetagReport, migrate, retag};
pub use normalize::normalize;
pub use orcid::{OrcidClient, WorkSource};
pub use pipeline::{IngestReport, Pipeline};
pub use publication::{Catalog, Publication, PublicationStats};
pub use repository::{PublicationRepository, UpsertSummary};
pub use store::{JsonStore, StoreError};
pub use tags::{TagClassifier, TagRules};
