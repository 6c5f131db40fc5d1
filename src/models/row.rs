//! Flattened output row, one per paper.

use serde::{Deserialize, Serialize};

use super::PaperDetail;

/// Separator used when joining names and affiliations into one column
pub const LIST_SEPARATOR: &str = ", ";

/// One output row; field names double as the CSV/JSON column headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "PubmedID")]
    pub pubmed_id: String,

    #[serde(rename = "Title")]
    pub title: String,

    #[serde(rename = "Publication Date")]
    pub publication_date: String,

    #[serde(rename = "Non-academic Author(s)")]
    pub non_academic_authors: String,

    #[serde(rename = "Company Affiliation(s)")]
    pub company_affiliations: String,

    #[serde(rename = "Corresponding Author Email")]
    pub corresponding_author_email: String,
}

impl ResultRow {
    /// Fixed column header, in output order
    pub const HEADERS: [&'static str; 6] = [
        "PubmedID",
        "Title",
        "Publication Date",
        "Non-academic Author(s)",
        "Company Affiliation(s)",
        "Corresponding Author Email",
    ];

    /// Flatten a classified paper into a row
    pub fn from_detail(pubmed_id: impl Into<String>, detail: &PaperDetail) -> Self {
        Self {
            pubmed_id: pubmed_id.into(),
            title: detail.title.clone(),
            publication_date: detail.publication_year.clone(),
            non_academic_authors: detail.corporate_author_names.join(LIST_SEPARATOR),
            company_affiliations: detail.distinct_affiliations().join(LIST_SEPARATOR),
            corresponding_author_email: detail.corresponding_email.clone(),
        }
    }

    /// Column values, in header order
    pub fn values(&self) -> [&str; 6] {
        [
            self.pubmed_id.as_str(),
            self.title.as_str(),
            self.publication_date.as_str(),
            self.non_academic_authors.as_str(),
            self.company_affiliations.as_str(),
            self.corresponding_author_email.as_str(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, NO_EMAIL};

    #[test]
    fn test_from_detail_single_corporate_author() {
        let detail = PaperDetail {
            title: "Study A".to_string(),
            publication_year: "2023".to_string(),
            authors: vec![Author {
                name: "J. Smith".to_string(),
                affiliation: "Acme Corp".to_string(),
            }],
            corporate_author_names: vec!["J. Smith".to_string()],
            corresponding_email: NO_EMAIL.to_string(),
        };

        let row = ResultRow::from_detail("111", &detail);
        assert_eq!(row.pubmed_id, "111");
        assert_eq!(row.title, "Study A");
        assert_eq!(row.publication_date, "2023");
        assert_eq!(row.non_academic_authors, "J. Smith");
        assert_eq!(row.company_affiliations, "Acme Corp");
        assert_eq!(row.corresponding_author_email, "N/A");
    }

    #[test]
    fn test_from_detail_dedups_affiliations() {
        let detail = PaperDetail {
            title: "Study B".to_string(),
            publication_year: "2020".to_string(),
            authors: vec![
                Author {
                    name: "A One".to_string(),
                    affiliation: "Harvard".to_string(),
                },
                Author {
                    name: "B Two".to_string(),
                    affiliation: "Harvard".to_string(),
                },
            ],
            corporate_author_names: Vec::new(),
            corresponding_email: "b@harvard.edu".to_string(),
        };

        let row = ResultRow::from_detail("222", &detail);
        assert_eq!(row.company_affiliations, "Harvard");
        assert_eq!(row.non_academic_authors, "");
        assert_eq!(row.corresponding_author_email, "b@harvard.edu");
    }

    #[test]
    fn test_headers_match_serde_names() {
        let row = ResultRow {
            pubmed_id: "1".to_string(),
            title: "t".to_string(),
            publication_date: "2000".to_string(),
            non_academic_authors: String::new(),
            company_affiliations: String::new(),
            corresponding_author_email: NO_EMAIL.to_string(),
        };
        let value = serde_json::to_value(&row).unwrap();
        let object = value.as_object().unwrap();
        for header in ResultRow::HEADERS {
            assert!(object.contains_key(header), "missing {header}");
        }
        assert_eq!(object.len(), ResultRow::HEADERS.len());
    }
}
