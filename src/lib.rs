//! # PubMed Affiliations
//!
//! Search PubMed for a query, fetch every matching record, classify each
//! author's affiliation as academic or corporate, and flatten the result into
//! one row per paper.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (PaperDetail, ResultRow, etc.)
//! - [`sources`]: Literature sources (PubMed E-utilities) and the record parser
//! - [`classifier`]: Affiliation classifiers (chat-completion service, offline heuristic)
//! - [`pipeline`]: Search, fetch, parse and classify, one identifier at a time
//! - [`output`]: CSV, table, JSON and plain renderings of result rows
//! - [`utils`]: HTTP client
//! - [`config`]: Configuration management

pub mod classifier;
pub mod config;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{PaperDetail, ResultRow};
pub use pipeline::{FetchReport, PaperFetcher};
pub use sources::{PubMedSource, Source};
