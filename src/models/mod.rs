//! Core data models for papers and output rows.

mod paper;
mod row;

pub use paper::{Author, AuthorRecord, PaperDetail, ParsedArticle, NO_EMAIL};
pub use row::{ResultRow, LIST_SEPARATOR};
