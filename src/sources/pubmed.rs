//! PubMed research source implementation using E-utilities API.

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, OnceLock};
use url::Url;

use crate::config::PubMedConfig;
use crate::models::{AuthorRecord, ParsedArticle};
use crate::sources::{Source, SourceError};
use crate::utils::HttpClient;

/// PubMed research source
///
/// Uses NCBI E-utilities: ESearch (JSON) for identifiers, EFetch (XML) for
/// one record at a time.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    esearch_url: String,
    efetch_url: String,
    api_key: Option<String>,
    email: Option<String>,
    tool: Option<String>,
    debug: bool,
}

impl PubMedSource {
    /// Create a PubMed source against the public NCBI endpoints
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self::from_config(client, &PubMedConfig::default())
    }

    /// Create a PubMed source from configuration
    pub fn from_config(client: Arc<HttpClient>, config: &PubMedConfig) -> Self {
        Self {
            client,
            esearch_url: config.esearch_url.clone(),
            efetch_url: config.efetch_url.clone(),
            api_key: config.api_key.clone(),
            email: config.email.clone(),
            tool: config.tool.clone(),
            debug: false,
        }
    }

    /// Echo every raw response body to stderr
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build E-utilities search URL
    fn build_search_url(&self, query: &str, max_results: usize) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.esearch_url)?;
        url.query_pairs_mut()
            .append_pair("db", "pubmed")
            .append_pair("term", query)
            .append_pair("retmode", "json")
            .append_pair("retmax", &max_results.to_string());
        self.append_identity(&mut url);
        Ok(url)
    }

    /// Build E-utilities fetch URL for one PubMed ID
    fn build_fetch_url(&self, id: &str) -> Result<Url, SourceError> {
        let mut url = Url::parse(&self.efetch_url)?;
        url.query_pairs_mut()
            .append_pair("db", "pubmed")
            .append_pair("id", id)
            .append_pair("retmode", "xml");
        self.append_identity(&mut url);
        Ok(url)
    }

    fn append_identity(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        if let Some(key) = &self.api_key {
            pairs.append_pair("api_key", key);
        }
        if let Some(email) = &self.email {
            pairs.append_pair("email", email);
        }
        if let Some(tool) = &self.tool {
            pairs.append_pair("tool", tool);
        }
    }

    async fn get_text(&self, url: Url, debug_label: &str) -> Result<String, SourceError> {
        tracing::debug!(url = %url, "PubMed request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to reach PubMed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Network(format!("Failed to read response: {}", e)))?;

        if self.debug {
            eprintln!("{} {}", debug_label, body);
        }

        if !status.is_success() {
            return Err(SourceError::Api(format!(
                "PubMed API returned status: {}",
                status
            )));
        }

        Ok(body)
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn id(&self) -> &str {
        "pubmed"
    }

    fn name(&self) -> &str {
        "PubMed"
    }

    async fn search_ids(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<String>, SourceError> {
        let url = self.build_search_url(query, max_results)?;
        let body = self.get_text(url, "PubMed API Response:").await?;
        let ids = parse_search_response(&body)?;

        tracing::debug!(query, count = ids.len(), "PubMed search finished");
        Ok(ids)
    }

    async fn fetch_record(&self, id: &str) -> Result<String, SourceError> {
        if id.trim().is_empty() {
            return Err(SourceError::InvalidRequest(
                "PubMed ID must not be empty".to_string(),
            ));
        }

        let url = self.build_fetch_url(id)?;
        self.get_text(url, "Paper Details Response:").await
    }

    fn parse_record(&self, raw: &str) -> Result<Option<ParsedArticle>, SourceError> {
        parse_article(raw)
    }
}

/// Parse an ESearch JSON response into the identifier list
///
/// Missing `esearchresult` or `idlist` keys yield an empty list.
pub fn parse_search_response(json: &str) -> Result<Vec<String>, SourceError> {
    #[derive(Debug, Deserialize)]
    struct ESearchResponse {
        #[serde(default)]
        esearchresult: ESearchResult,
    }

    #[derive(Debug, Default, Deserialize)]
    struct ESearchResult {
        #[serde(default)]
        idlist: Vec<String>,
        #[serde(rename = "ERROR", default)]
        error: Option<String>,
    }

    let response: ESearchResponse = serde_json::from_str(json)
        .map_err(|e| SourceError::Parse(format!("Failed to parse PubMed search JSON: {}", e)))?;

    if let Some(error) = &response.esearchresult.error {
        tracing::warn!(error = %error, "PubMed search reported an error");
    }

    Ok(response.esearchresult.idlist)
}

/// Parse an EFetch XML document into a [`ParsedArticle`]
///
/// Returns `Ok(None)` when the document holds no `PubmedArticle` or
/// `PubmedBookArticle` (EFetch answers unknown IDs with an empty set).
/// Malformed XML is an error.
pub fn parse_article(xml: &str) -> Result<Option<ParsedArticle>, SourceError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<String> = Vec::new();
    let mut state = ArticleState::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                state.enter(&stack);
            }
            Event::End(_) => {
                state.leave(stack.len());
                stack.pop();
            }
            Event::Empty(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                state.enter(&stack);
                state.leave(stack.len());
                stack.pop();
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| SourceError::Parse(format!("XML: {}", err)))?;
                state.text(&text);
            }
            Event::CData(e) => state.text(&String::from_utf8_lossy(&e.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(SourceError::Parse(format!(
            "XML: document ended inside <{}>",
            open
        )));
    }

    Ok(state.finish())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Year,
    MedlineDate,
    ForeName,
    LastName,
    CollectiveName,
    Affiliation,
    Email,
}

#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

#[derive(Debug, Default)]
struct PendingAuthor {
    fore_name: Option<String>,
    last_name: Option<String>,
    collective_name: Option<String>,
    affiliation: Option<String>,
    email: Option<String>,
    embedded_email: Option<String>,
}

impl PendingAuthor {
    fn into_record(self) -> AuthorRecord {
        let name = [self.fore_name, self.last_name]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let name = if name.is_empty() {
            self.collective_name.unwrap_or_default()
        } else {
            name
        };

        let email = self.email.or(self.embedded_email);

        AuthorRecord {
            name,
            affiliation: self.affiliation,
            email,
        }
    }
}

/// Streaming state while walking an EFetch document
#[derive(Debug, Default)]
struct ArticleState {
    seen_article: bool,
    title: Option<String>,
    year: Option<String>,
    medline_date: Option<String>,
    authors: Vec<AuthorRecord>,
    // stack length just inside the open <Author>
    author: Option<(usize, PendingAuthor)>,
    capture: Option<Capture>,
}

impl ArticleState {
    fn enter(&mut self, stack: &[String]) {
        let name = match stack.last() {
            Some(name) => name.as_str(),
            None => return,
        };

        if name == "PubmedArticle" || name == "PubmedBookArticle" {
            self.seen_article = true;
        }

        // inline markup inside a captured field keeps feeding the same capture
        if self.capture.is_some() {
            return;
        }

        if name == "Author" && self.author.is_none() {
            self.author = Some((stack.len(), PendingAuthor::default()));
            return;
        }

        if let Some(field) = self.field_for(stack) {
            self.capture = Some(Capture {
                field,
                depth: stack.len(),
                text: String::new(),
            });
        }
    }

    fn field_for(&self, stack: &[String]) -> Option<Field> {
        if let Some((author_depth, _)) = &self.author {
            let relative: Vec<&str> = stack[*author_depth..].iter().map(String::as_str).collect();
            return match relative.as_slice() {
                ["ForeName"] => Some(Field::ForeName),
                ["LastName"] => Some(Field::LastName),
                ["CollectiveName"] => Some(Field::CollectiveName),
                ["AffiliationInfo", "Affiliation"] => Some(Field::Affiliation),
                ["AffiliationInfo", "Email"] => Some(Field::Email),
                _ => None,
            };
        }

        let name = stack.last()?.as_str();
        let parent = stack.len().checked_sub(2).map(|i| stack[i].as_str());
        match (parent, name) {
            (_, "ArticleTitle") if self.title.is_none() => Some(Field::Title),
            (Some("PubDate"), "Year") if self.year.is_none() => Some(Field::Year),
            (Some("PubDate"), "MedlineDate") if self.medline_date.is_none() => {
                Some(Field::MedlineDate)
            }
            _ => None,
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(capture) = &mut self.capture {
            capture.text.push_str(text);
        }
    }

    fn leave(&mut self, depth: usize) {
        if self.capture.as_ref().is_some_and(|c| c.depth == depth) {
            if let Some(capture) = self.capture.take() {
                self.store(capture);
            }
            return;
        }

        if self.author.as_ref().is_some_and(|(d, _)| *d == depth) {
            if let Some((_, pending)) = self.author.take() {
                self.authors.push(pending.into_record());
            }
        }
    }

    fn store(&mut self, capture: Capture) {
        let text = collapse_whitespace(&capture.text);
        let non_empty = (!text.is_empty()).then(|| text.clone());

        match capture.field {
            Field::Title => self.title = Some(text),
            Field::Year => self.year = non_empty,
            Field::MedlineDate => self.medline_date = non_empty,
            field => {
                let Some((_, author)) = &mut self.author else {
                    return;
                };
                match field {
                    Field::ForeName => author.fore_name = non_empty,
                    Field::LastName => author.last_name = non_empty,
                    Field::CollectiveName => author.collective_name = non_empty,
                    Field::Affiliation => {
                        if let Some(found) = extract_email(&text) {
                            author.embedded_email = Some(found);
                        }
                        if author.affiliation.is_none() {
                            author.affiliation = non_empty;
                        }
                    }
                    Field::Email => {
                        if non_empty.is_some() {
                            author.email = non_empty;
                        }
                    }
                    Field::Title | Field::Year | Field::MedlineDate => {}
                }
            }
        }
    }

    fn finish(self) -> Option<ParsedArticle> {
        if !self.seen_article {
            return None;
        }

        let publication_year = self
            .year
            .or_else(|| self.medline_date.as_deref().and_then(leading_year))
            .unwrap_or_default();

        Some(ParsedArticle {
            title: self.title.unwrap_or_default(),
            publication_year,
            authors: self.authors,
        })
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid email regex")
    })
}

fn year_regex() -> &'static Regex {
    static YEAR: OnceLock<Regex> = OnceLock::new();
    YEAR.get_or_init(|| Regex::new(r"\b(\d{4})\b").expect("valid year regex"))
}

/// First email address embedded in free text
/// ("... Boston, MA, USA. Electronic address: jane@example.org.")
fn extract_email(text: &str) -> Option<String> {
    email_regex().find(text).map(|m| m.as_str().to_string())
}

/// Leading four-digit year of a MedlineDate such as "1998 Dec-1999 Jan"
fn leading_year(text: &str) -> Option<String> {
    year_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
