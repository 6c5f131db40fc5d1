//! Literature sources.
//!
//! This module defines the [`Source`] trait: search for record identifiers,
//! fetch the raw record for one identifier, and parse that record into a
//! [`ParsedArticle`]. [`PubMedSource`] implements it against the NCBI
//! E-utilities API; [`MockSource`] serves canned documents for tests.

mod mock;
mod pubmed;

pub use mock::{make_article_xml, MockSource};
pub use pubmed::{parse_article, parse_search_response, PubMedSource};

use crate::models::ParsedArticle;
use async_trait::async_trait;

/// The Source trait defines the interface a literature database exposes to
/// the fetch pipeline.
///
/// Calls are made one at a time; implementations must not assume concurrent use.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "pubmed")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Identifiers matching `query`, in the order the source ranks them
    async fn search_ids(&self, query: &str, max_results: usize)
        -> Result<Vec<String>, SourceError>;

    /// Raw record document for one identifier
    async fn fetch_record(&self, id: &str) -> Result<String, SourceError>;

    /// Parse a raw record; `Ok(None)` when the document holds no article
    fn parse_record(&self, raw: &str) -> Result<Option<ParsedArticle>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status from the source API
    #[error("API error: {0}")]
    Api(String),

    /// Parsing error (XML, JSON)
    #[error("Parse error: {0}")]
    Parse(String),

    /// IO error (file system)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<quick_xml::Error> for SourceError {
    fn from(err: quick_xml::Error) -> Self {
        SourceError::Parse(format!("XML: {}", err))
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::InvalidRequest(format!("bad endpoint URL: {}", err))
    }
}
