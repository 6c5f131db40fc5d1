//! Utility modules shared by sources and classifiers.
//!
//! - [`HttpClient`]: reqwest client with user agent and timeouts applied
//!
//! # HTTP Client
//!
//! ```rust,no_run
//! use pubmed_affiliations::utils::HttpClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let url = url::Url::parse("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/einfo.fcgi")?;
//! let response = client.get(url).send().await?;
//! # Ok(())
//! # }
//! ```

mod http;

pub use http::{HttpClient, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
