//! Search, fetch, parse and classify: one identifier at a time.
//!
//! ```rust,no_run
//! use pubmed_affiliations::classifier::KeywordClassifier;
//! use pubmed_affiliations::sources::PubMedSource;
//! use pubmed_affiliations::utils::HttpClient;
//! use pubmed_affiliations::PaperFetcher;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpClient::new()?);
//! let fetcher = PaperFetcher::new(
//!     Arc::new(PubMedSource::new(client)),
//!     Arc::new(KeywordClassifier::new()),
//! );
//! let report = fetcher.run("cancer therapy").await?;
//! for row in &report.rows {
//!     println!("{} {}", row.pubmed_id, row.non_academic_authors);
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::classifier::{AffiliationClassifier, ClassifierError};
use crate::models::{Author, PaperDetail, ParsedArticle, ResultRow};
use crate::sources::{Source, SourceError};

/// Default number of identifiers requested from the search
pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Failure while processing one identifier
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("classification failed: {0}")]
    Classifier(#[from] ClassifierError),
}

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The identifier search failed
    #[error("search failed: {0}")]
    Search(#[source] SourceError),

    /// A record failed while fail-fast was enabled
    #[error("record {pubmed_id} failed: {source}")]
    Record {
        pubmed_id: String,
        #[source]
        source: RecordError,
    },
}

/// An identifier that produced no row, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub pubmed_id: String,
    pub reason: String,
}

/// Outcome of a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchReport {
    /// Number of identifiers the search returned
    pub total_ids: usize,

    /// One row per successfully processed paper, in search order
    pub rows: Vec<ResultRow>,

    /// Identifiers that produced no row
    pub skipped: Vec<SkippedRecord>,
}

/// Drives search, fetch, parse and classification
#[derive(Debug, Clone)]
pub struct PaperFetcher {
    source: Arc<dyn Source>,
    classifier: Arc<dyn AffiliationClassifier>,
    max_results: usize,
    fail_fast: bool,
}

impl PaperFetcher {
    /// Create a fetcher over a source and a classifier
    pub fn new(source: Arc<dyn Source>, classifier: Arc<dyn AffiliationClassifier>) -> Self {
        Self {
            source,
            classifier,
            max_results: DEFAULT_MAX_RESULTS,
            fail_fast: false,
        }
    }

    /// Set maximum number of identifiers requested from the search
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Abort on the first per-record failure instead of skipping the record
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Identifiers matching the query
    pub async fn search(&self, query: &str) -> Result<Vec<String>, SourceError> {
        self.source.search_ids(query, self.max_results).await
    }

    /// Fetch, parse and classify one record
    ///
    /// `Ok(None)` when the fetched document holds no article.
    pub async fn fetch_paper_details(
        &self,
        pubmed_id: &str,
    ) -> Result<Option<PaperDetail>, RecordError> {
        let raw = self.source.fetch_record(pubmed_id).await?;
        let Some(article) = self.source.parse_record(&raw)? else {
            return Ok(None);
        };

        let detail = build_paper_detail(article, self.classifier.as_ref()).await?;
        Ok(Some(detail))
    }

    /// Run the whole query
    pub async fn run(&self, query: &str) -> Result<FetchReport, PipelineError> {
        self.run_with_progress(query, |_, _, _| {}).await
    }

    /// Run the whole query, calling `on_record(position, total, pubmed_id)`
    /// before each identifier is processed
    pub async fn run_with_progress<F>(
        &self,
        query: &str,
        mut on_record: F,
    ) -> Result<FetchReport, PipelineError>
    where
        F: FnMut(usize, usize, &str) + Send,
    {
        let ids = self.search(query).await.map_err(PipelineError::Search)?;
        tracing::info!(source = self.source.id(), query, count = ids.len(), "search finished");

        let mut report = FetchReport {
            total_ids: ids.len(),
            ..Default::default()
        };

        for (index, pubmed_id) in ids.iter().enumerate() {
            on_record(index + 1, ids.len(), pubmed_id);

            match self.fetch_paper_details(pubmed_id).await {
                Ok(Some(detail)) => {
                    tracing::debug!(
                        pubmed_id = %pubmed_id,
                        authors = detail.authors.len(),
                        corporate = detail.corporate_author_names.len(),
                        "record processed"
                    );
                    report.rows.push(ResultRow::from_detail(pubmed_id.as_str(), &detail));
                }
                Ok(None) => {
                    tracing::debug!(pubmed_id = %pubmed_id, "fetched document holds no article");
                    report.skipped.push(SkippedRecord {
                        pubmed_id: pubmed_id.clone(),
                        reason: "no article in fetched document".to_string(),
                    });
                }
                Err(err) if self.fail_fast => {
                    return Err(PipelineError::Record {
                        pubmed_id: pubmed_id.clone(),
                        source: err,
                    });
                }
                Err(err) => {
                    tracing::warn!(pubmed_id = %pubmed_id, error = %err, "skipping record");
                    report.skipped.push(SkippedRecord {
                        pubmed_id: pubmed_id.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

/// Classify every affiliated author of a parsed article
///
/// Authors without an affiliation are dropped; authors labelled corporate are
/// also listed by name.
pub async fn build_paper_detail(
    article: ParsedArticle,
    classifier: &dyn AffiliationClassifier,
) -> Result<PaperDetail, ClassifierError> {
    let corresponding_email = article.corresponding_email();
    let mut authors = Vec::new();
    let mut corporate_author_names = Vec::new();

    for record in article.authors {
        let Some(affiliation) = record.affiliation.filter(|a| !a.is_empty()) else {
            continue;
        };

        let label = classifier.classify(&affiliation).await?;
        tracing::trace!(author = %record.name, label = %label, "author classified");

        if label.is_corporate() {
            corporate_author_names.push(record.name.clone());
        }
        authors.push(Author {
            name: record.name,
            affiliation,
        });
    }

    Ok(PaperDetail {
        title: article.title,
        publication_year: article.publication_year,
        authors,
        corporate_author_names,
        corresponding_email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classification, KeywordClassifier};
    use crate::models::AuthorRecord;
    use crate::sources::{make_article_xml, MockSource};
    use async_trait::async_trait;

    #[derive(Debug)]
    struct FailingClassifier;

    #[async_trait]
    impl AffiliationClassifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        async fn classify(&self, _affiliation: &str) -> Result<Classification, ClassifierError> {
            Err(ClassifierError::Api("quota exceeded".to_string()))
        }
    }

    fn fetcher(source: MockSource) -> PaperFetcher {
        PaperFetcher::new(Arc::new(source), Arc::new(KeywordClassifier::new()))
    }

    #[tokio::test]
    async fn test_build_paper_detail() {
        let article = ParsedArticle {
            title: "Study A".to_string(),
            publication_year: "2023".to_string(),
            authors: vec![
                AuthorRecord {
                    name: "J. Smith".to_string(),
                    affiliation: Some("Acme Corp".to_string()),
                    email: None,
                },
                AuthorRecord {
                    name: "No Affiliation".to_string(),
                    affiliation: None,
                    email: Some("na@example.org".to_string()),
                },
                AuthorRecord {
                    name: "A. Prof".to_string(),
                    affiliation: Some("Stanford University".to_string()),
                    email: None,
                },
            ],
        };

        let detail = build_paper_detail(article, &KeywordClassifier::new())
            .await
            .unwrap();
        assert_eq!(detail.authors.len(), 2);
        assert_eq!(detail.corporate_author_names, vec!["J. Smith"]);
        assert_eq!(detail.corresponding_email, "na@example.org");
    }

    #[tokio::test]
    async fn test_zero_ids_yields_empty_report() {
        let report = fetcher(MockSource::new()).run("nothing").await.unwrap();
        assert_eq!(report.total_ids, 0);
        assert!(report.rows.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_rows_follow_search_order() {
        let source = MockSource::new()
            .with_ids(["222", "111"])
            .with_record(
                "111",
                make_article_xml("Study A", "2023", &[("J.", "Smith", "Acme Corp", "")]),
            )
            .with_record(
                "222",
                make_article_xml("Study B", "2021", &[("K.", "Lee", "Yale University", "")]),
            );

        let report = fetcher(source).run("cancer therapy").await.unwrap();
        let ids: Vec<_> = report.rows.iter().map(|r| r.pubmed_id.as_str()).collect();
        assert_eq!(ids, vec!["222", "111"]);
        assert_eq!(report.rows[1].non_academic_authors, "J. Smith");
        assert_eq!(report.rows[0].non_academic_authors, "");
    }

    #[tokio::test]
    async fn test_failed_record_is_skipped_with_reason() {
        let source = MockSource::new()
            .with_ids(["1", "2", "3"])
            .with_record("1", make_article_xml("One", "2020", &[]))
            .with_failing_record("2", "PubMed API returned status: 500")
            .with_record("3", "<PubmedArticleSet><PubmedArticle></Broken>");

        let report = fetcher(source).run("q").await.unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].pubmed_id, "1");
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].pubmed_id, "2");
        assert!(report.skipped[0].reason.contains("500"));
        assert_eq!(report.skipped[1].pubmed_id, "3");
        assert!(report.skipped[1].reason.starts_with("Parse error"));
    }

    #[tokio::test]
    async fn test_document_without_article_is_skipped() {
        let source = MockSource::new().with_ids(["404"]);
        let report = fetcher(source).run("q").await.unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.skipped[0].reason, "no article in fetched document");
    }

    #[tokio::test]
    async fn test_fail_fast_stops_at_first_error() {
        let source = Arc::new(
            MockSource::new()
                .with_ids(["1", "2", "3"])
                .with_record("1", make_article_xml("One", "2020", &[]))
                .with_failing_record("2", "boom")
                .with_record("3", make_article_xml("Three", "2020", &[])),
        );

        let fetcher =
            PaperFetcher::new(source.clone(), Arc::new(KeywordClassifier::new())).fail_fast(true);
        let err = fetcher.run("q").await.unwrap_err();

        assert!(matches!(err, PipelineError::Record { ref pubmed_id, .. } if pubmed_id == "2"));
        assert_eq!(source.fetched(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_classifier_failure_skips_record() {
        let source = MockSource::new()
            .with_ids(["1"])
            .with_record("1", make_article_xml("One", "2020", &[("A", "B", "Acme Corp", "")]));

        let fetcher = PaperFetcher::new(Arc::new(source), Arc::new(FailingClassifier));
        let report = fetcher.run("q").await.unwrap();
        assert!(report.rows.is_empty());
        assert!(report.skipped[0].reason.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_search_failure_aborts() {
        let source = MockSource::new().with_search_error("PubMed API returned status: 503");
        let err = fetcher(source).run("q").await.unwrap_err();
        assert!(matches!(err, PipelineError::Search(_)));
    }

    #[tokio::test]
    async fn test_progress_callback() {
        let source = MockSource::new()
            .with_ids(["1", "2"])
            .with_record("1", make_article_xml("One", "2020", &[]))
            .with_record("2", make_article_xml("Two", "2020", &[]));

        let mut seen = Vec::new();
        fetcher(source)
            .run_with_progress("q", |pos, total, id| seen.push((pos, total, id.to_string())))
            .await
            .unwrap();
        assert_eq!(
            seen,
            vec![(1, 2, "1".to_string()), (2, 2, "2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_max_results_limits_search() {
        let source = MockSource::new()
            .with_ids(["1", "2", "3"])
            .with_record("1", make_article_xml("One", "2020", &[]));

        let report = fetcher(source).max_results(1).run("q").await.unwrap();
        assert_eq!(report.total_ids, 1);
        assert_eq!(report.rows.len(), 1);
    }
}
