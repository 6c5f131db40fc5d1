//! Affiliation classifiers.
//!
//! An [`AffiliationClassifier`] labels one free-text affiliation as academic
//! or corporate. [`OpenAiClassifier`] asks an OpenAI-compatible chat
//! completion endpoint; [`KeywordClassifier`] is an offline heuristic;
//! [`CachingClassifier`] memoises any classifier by affiliation text.

mod keyword;
mod openai;

pub use keyword::KeywordClassifier;
pub use openai::OpenAiClassifier;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Label attached to an affiliation
///
/// The service answers in free text. Anything other than "academic" or
/// "corporate" (after trimming and lower-casing) is kept verbatim in
/// [`Classification::Other`] and counts as non-corporate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Academic,
    Corporate,
    #[serde(untagged)]
    Other(String),
}

impl Classification {
    /// Normalise a raw service answer
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "academic" => Classification::Academic,
            "corporate" => Classification::Corporate,
            _ => Classification::Other(label),
        }
    }

    /// The normalised label text
    pub fn label(&self) -> &str {
        match self {
            Classification::Academic => "academic",
            Classification::Corporate => "corporate",
            Classification::Other(s) => s,
        }
    }

    /// Whether the author should be reported as non-academic
    pub fn is_corporate(&self) -> bool {
        matches!(self, Classification::Corporate)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Classifies one affiliation at a time.
#[async_trait]
pub trait AffiliationClassifier: Send + Sync + std::fmt::Debug {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Label one affiliation
    async fn classify(&self, affiliation: &str) -> Result<Classification, ClassifierError>;
}

/// Errors that can occur while classifying an affiliation
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// No credential configured for the classification service
    #[error("Missing API key: set OPENAI_API_KEY or [api_keys] openai in the config file")]
    MissingApiKey,

    /// Invalid endpoint or request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status from the service
    #[error("API error: {0}")]
    Api(String),

    /// Unexpected response body
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClassifierError {
    fn from(err: reqwest::Error) -> Self {
        ClassifierError::Network(err.to_string())
    }
}

/// Memoises labels by exact affiliation text for the life of the value.
///
/// Failed classifications are not cached.
#[derive(Debug)]
pub struct CachingClassifier {
    inner: Arc<dyn AffiliationClassifier>,
    cache: Mutex<HashMap<String, Classification>>,
}

impl CachingClassifier {
    /// Wrap a classifier
    pub fn new(inner: Arc<dyn AffiliationClassifier>) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of distinct affiliations cached so far
    pub fn len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been cached yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AffiliationClassifier for CachingClassifier {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn classify(&self, affiliation: &str) -> Result<Classification, ClassifierError> {
        let cached = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(affiliation)
            .cloned();
        if let Some(label) = cached {
            tracing::trace!(affiliation, label = %label, "classification cache hit");
            return Ok(label);
        }

        let label = self.inner.classify(affiliation).await?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(affiliation.to_string(), label.clone());
        Ok(label)
    }
}
