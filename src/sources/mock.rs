//! Mock source for testing purposes.

use async_trait::async_trait;
use quick_xml::escape::escape;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::ParsedArticle;
use crate::sources::{parse_article, Source, SourceError};

/// A mock source for testing that returns predefined identifiers and
/// PubMed-style XML documents.
#[derive(Debug, Default)]
pub struct MockSource {
    ids: Vec<String>,
    search_error: Option<String>,
    records: HashMap<String, Result<String, String>>,
    fetched: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the identifiers returned by every search.
    pub fn with_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Make every search fail with an API error.
    pub fn with_search_error(mut self, message: impl Into<String>) -> Self {
        self.search_error = Some(message.into());
        self
    }

    /// Serve `xml` for `id`.
    pub fn with_record(mut self, id: impl Into<String>, xml: impl Into<String>) -> Self {
        self.records.insert(id.into(), Ok(xml.into()));
        self
    }

    /// Fail the fetch for `id` with an API error.
    pub fn with_failing_record(mut self, id: impl Into<String>, message: impl Into<String>) -> Self {
        self.records.insert(id.into(), Err(message.into()));
        self
    }

    /// Identifiers fetched so far, in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Source for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search_ids(
        &self,
        _query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, SourceError> {
        if let Some(message) = &self.search_error {
            return Err(SourceError::Api(message.clone()));
        }
        Ok(self.ids.iter().take(max_results).cloned().collect())
    }

    async fn fetch_record(&self, id: &str) -> Result<String, SourceError> {
        if let Ok(mut guard) = self.fetched.lock() {
            guard.push(id.to_string());
        }

        match self.records.get(id) {
            Some(Ok(xml)) => Ok(xml.clone()),
            Some(Err(message)) => Err(SourceError::Api(message.clone())),
            None => Ok("<PubmedArticleSet></PubmedArticleSet>".to_string()),
        }
    }

    fn parse_record(&self, raw: &str) -> Result<Option<ParsedArticle>, SourceError> {
        parse_article(raw)
    }
}

/// Helper to build a minimal EFetch document for testing.
///
/// Each author is `(fore name, last name, affiliation, email)`; empty strings
/// leave the element out.
pub fn make_article_xml(title: &str, year: &str, authors: &[(&str, &str, &str, &str)]) -> String {
    let mut author_xml = String::new();
    for (fore, last, affiliation, email) in authors {
        author_xml.push_str("<Author ValidYN=\"Y\">");
        if !last.is_empty() {
            author_xml.push_str(&format!("<LastName>{}</LastName>", escape(*last)));
        }
        if !fore.is_empty() {
            author_xml.push_str(&format!("<ForeName>{}</ForeName>", escape(*fore)));
        }
        if !affiliation.is_empty() || !email.is_empty() {
            author_xml.push_str("<AffiliationInfo>");
            if !affiliation.is_empty() {
                author_xml.push_str(&format!("<Affiliation>{}</Affiliation>", escape(*affiliation)));
            }
            if !email.is_empty() {
                author_xml.push_str(&format!("<Email>{}</Email>", escape(*email)));
            }
            author_xml.push_str("</AffiliationInfo>");
        }
        author_xml.push_str("</Author>");
    }

    format!(
        "<PubmedArticleSet><PubmedArticle><MedlineCitation><Article>\
         <Journal><JournalIssue><PubDate><Year>{}</Year></PubDate></JournalIssue></Journal>\
         <ArticleTitle>{}</ArticleTitle><AuthorList>{}</AuthorList>\
         </Article></MedlineCitation></PubmedArticle></PubmedArticleSet>",
        escape(year),
        escape(title),
        author_xml
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_search_respects_max_results() {
        let source = MockSource::new().with_ids(["1", "2", "3"]);
        assert_eq!(source.search_ids("q", 2).await.unwrap(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn test_mock_records() {
        let xml = make_article_xml("T", "2020", &[("Ann", "Lee", "Uni", "")]);
        let source = MockSource::new()
            .with_record("1", xml)
            .with_failing_record("2", "boom");

        let raw = source.fetch_record("1").await.unwrap();
        let article = source.parse_record(&raw).unwrap().unwrap();
        assert_eq!(article.authors[0].name, "Ann Lee");

        assert!(source.fetch_record("2").await.is_err());
        assert_eq!(source.fetched(), vec!["1", "2"]);
    }

    #[test]
    fn test_make_article_xml_escapes_text() {
        let xml = make_article_xml(
            "Dose <5 mg & beyond",
            "2024",
            &[("Ann", "O'Neil", "Johnson & Johnson, New Brunswick, NJ", "")],
        );
        let article = parse_article(&xml).unwrap().unwrap();
        assert_eq!(article.title, "Dose <5 mg & beyond");
        assert_eq!(
            article.authors[0].affiliation.as_deref(),
            Some("Johnson & Johnson, New Brunswick, NJ")
        );
        assert_eq!(article.authors[0].name, "Ann O'Neil");
    }
}
