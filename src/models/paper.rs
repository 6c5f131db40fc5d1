//! Paper models: what the parser extracts and what the classifier step produces.

use serde::{Deserialize, Serialize};

/// Email recorded when no author carries one
pub const NO_EMAIL: &str = "N/A";

/// An author as read from the record, before classification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRecord {
    /// Display name ("ForeName LastName", or the collective name)
    pub name: String,

    /// First affiliation listed for the author
    pub affiliation: Option<String>,

    /// Contact email, explicit or found inside the affiliation text
    pub email: Option<String>,
}

/// Everything the parser pulls out of one PubMed record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedArticle {
    /// Article title
    pub title: String,

    /// Publication year (may be empty)
    pub publication_year: String,

    /// Authors in document order
    pub authors: Vec<AuthorRecord>,
}

impl ParsedArticle {
    /// The last non-empty email across all authors, or `"N/A"`
    pub fn corresponding_email(&self) -> String {
        self.authors
            .iter()
            .filter_map(|a| a.email.as_deref())
            .filter(|e| !e.is_empty())
            .last()
            .unwrap_or(NO_EMAIL)
            .to_string()
    }
}

/// An author with a non-empty affiliation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub affiliation: String,
}

/// A paper after every affiliation has been classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperDetail {
    /// Article title
    pub title: String,

    /// Publication year (may be empty)
    pub publication_year: String,

    /// Authors that carry an affiliation, in document order
    pub authors: Vec<Author>,

    /// Names of authors whose affiliation was classified as corporate
    pub corporate_author_names: Vec<String>,

    /// Corresponding email, `"N/A"` when none was found
    pub corresponding_email: String,
}

impl PaperDetail {
    /// Distinct affiliations in first-seen order
    pub fn distinct_affiliations(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.authors
            .iter()
            .map(|a| a.affiliation.as_str())
            .filter(|aff| !aff.is_empty() && seen.insert(*aff))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author(name: &str, affiliation: Option<&str>, email: Option<&str>) -> AuthorRecord {
        AuthorRecord {
            name: name.to_string(),
            affiliation: affiliation.map(String::from),
            email: email.map(String::from),
        }
    }

    #[test]
    fn test_corresponding_email_defaults_to_na() {
        let article = ParsedArticle {
            title: "T".to_string(),
            publication_year: "2021".to_string(),
            authors: vec![author("A B", Some("Uni"), None)],
        };
        assert_eq!(article.corresponding_email(), "N/A");
    }

    #[test]
    fn test_corresponding_email_last_wins() {
        let article = ParsedArticle {
            authors: vec![
                author("A", None, Some("first@example.org")),
                author("B", None, Some("")),
                author("C", None, Some("last@example.org")),
                author("D", None, None),
            ],
            ..Default::default()
        };
        assert_eq!(article.corresponding_email(), "last@example.org");
    }

    #[test]
    fn test_distinct_affiliations() {
        let detail = PaperDetail {
            title: "T".to_string(),
            publication_year: String::new(),
            authors: vec![
                Author {
                    name: "A".to_string(),
                    affiliation: "Acme Corp".to_string(),
                },
                Author {
                    name: "B".to_string(),
                    affiliation: "MIT".to_string(),
                },
                Author {
                    name: "C".to_string(),
                    affiliation: "Acme Corp".to_string(),
                },
            ],
            corporate_author_names: vec!["A".to_string(), "C".to_string()],
            corresponding_email: NO_EMAIL.to_string(),
        };
        assert_eq!(detail.distinct_affiliations(), vec!["Acme Corp", "MIT"]);
    }
}
