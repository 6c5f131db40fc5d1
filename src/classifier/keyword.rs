//! Offline keyword heuristic.

use async_trait::async_trait;
use regex::Regex;

use super::{AffiliationClassifier, Classification, ClassifierError};

/// Markers that flag an affiliation as corporate, matched as whole words,
/// case-insensitively.
const CORPORATE_MARKERS: &[&str] = &[
    "inc",
    "incorporated",
    "ltd",
    "limited",
    "llc",
    "plc",
    "gmbh",
    "s\\.a",
    "b\\.v",
    "corp",
    "corporation",
    "company",
    "pharma",
    "pharmaceuticals?",
    "therapeutics",
    "biotech",
    "biosciences",
    "biopharma",
    "laboratories",
];

/// Company suffixes matched case-sensitively ("CO" is also the Colorado state code)
const CASED_CORPORATE_PATTERN: &str = r"\bAG\b|\bCo\.|&\s*Co\b";

/// Markers that keep an affiliation academic even when a corporate marker matches
const ACADEMIC_MARKERS: &[&str] = &[
    "universit(y|ies|é|ät|at|ad|à)",
    "college",
    "school",
    "institute",
    "hospital",
    "faculty",
    "department",
    "academy",
    "clinic",
    "centre",
    "center",
];

/// Labels affiliations without any network call.
///
/// Corporate when a corporate marker matches and no academic marker does;
/// academic otherwise.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    corporate: Regex,
    cased_corporate: Regex,
    academic: Regex,
}

impl KeywordClassifier {
    /// Create the heuristic classifier
    pub fn new() -> Self {
        Self {
            corporate: word_set(CORPORATE_MARKERS),
            cased_corporate: Regex::new(CASED_CORPORATE_PATTERN)
                .expect("company suffix pattern is a valid regex"),
            academic: word_set(ACADEMIC_MARKERS),
        }
    }

    /// Classify synchronously
    pub fn label(&self, affiliation: &str) -> Classification {
        let corporate =
            self.corporate.is_match(affiliation) || self.cased_corporate.is_match(affiliation);
        if corporate && !self.academic.is_match(affiliation) {
            Classification::Corporate
        } else {
            Classification::Academic
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn word_set(words: &[&str]) -> Regex {
    let pattern = format!(r"(?i)\b({})\b", words.join("|"));
    Regex::new(&pattern).expect("marker list is a valid regex")
}

#[async_trait]
impl AffiliationClassifier for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, affiliation: &str) -> Result<Classification, ClassifierError> {
        Ok(self.label(affiliation))
    }
}
