//! arXiv paper search client
//!
//! Fetches paper metadata (title, authors, abstract) from the arXiv Atom
//! API, sorted by relevance. The provider is behind the narrow
//! [`PaperSearch`] trait so the pipeline never depends on arXiv directly.

use crate::config::ArxivConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A paper returned by the search provider.
///
/// Immutable once fetched; the pipeline only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Paper title
    pub title: String,
    /// Author names, in publication order
    pub authors: Vec<String>,
    /// Abstract text
    pub summary: String,
    /// Publication date (YYYY-MM-DD)
    pub published: String,
    /// Link to the paper (PDF where available)
    pub source_url: String,
    /// Provider-assigned identifier
    pub id: String,
}

/// Trait for paper search providers
#[async_trait]
pub trait PaperSearch: Send + Sync {
    /// Search for papers matching the query, sorted by provider relevance
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>>;
}

/// arXiv API client
pub struct ArxivClient {
    client: reqwest::Client,
    base_url: String,
}

impl ArxivClient {
    /// Create a new client from configuration
    pub fn new(config: &ArxivConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PaperSearch for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Document>> {
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/query", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("search_query", format!("all:{}", query)),
                ("max_results", max_results.to_string()),
                ("sortBy", "relevance".to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::UpstreamSearch {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamSearch {
                message: format!("arXiv API error {}: {}", status, body),
            });
        }

        let feed = response.text().await.map_err(|e| AppError::UpstreamSearch {
            message: format!("Failed to read response body: {}", e),
        })?;

        let papers = parse_atom_feed(&feed);

        tracing::info!(
            query = %query,
            max_results = max_results,
            papers = papers.len(),
            "arXiv search completed"
        );

        Ok(papers)
    }
}

/// Parse an arXiv Atom feed into documents.
///
/// The feed is a fixed, machine-generated shape, so per-field extraction
/// with regex-lite is sufficient; no XML crate is needed.
pub fn parse_atom_feed(feed: &str) -> Vec<Document> {
    let entry_re = Regex::new(r"(?s)<entry>(.*?)</entry>").unwrap();
    let title_re = Regex::new(r"(?s)<title>(.*?)</title>").unwrap();
    let summary_re = Regex::new(r"(?s)<summary>(.*?)</summary>").unwrap();
    let published_re = Regex::new(r"<published>(.*?)</published>").unwrap();
    let id_re = Regex::new(r"<id>(.*?)</id>").unwrap();
    let author_re = Regex::new(r"(?s)<author>\s*<name>(.*?)</name>").unwrap();
    let pdf_re = Regex::new(r#"<link[^>]*title="pdf"[^>]*href="([^"]*)""#).unwrap();

    let mut papers = Vec::new();

    for entry in entry_re.captures_iter(feed) {
        let body = &entry[1];

        let field = |re: &Regex| {
            re.captures(body)
                .map(|c| normalize_whitespace(&unescape_xml(&c[1])))
                .unwrap_or_default()
        };

        let id = id_re
            .captures(body)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();

        let authors: Vec<String> = author_re
            .captures_iter(body)
            .map(|c| normalize_whitespace(&unescape_xml(&c[1])))
            .collect();

        // Prefer the explicit pdf link, fall back to the abstract page
        let source_url = pdf_re
            .captures(body)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| id.clone());

        // Atom timestamps are RFC 3339; the date prefix is all we keep
        let published = published_re
            .captures(body)
            .map(|c| c[1].chars().take(10).collect())
            .unwrap_or_default();

        papers.push(Document {
            title: field(&title_re),
            authors,
            summary: field(&summary_re),
            published,
            source_url,
            id,
        });
    }

    papers
}

/// Collapse runs of whitespace; arXiv wraps titles and abstracts with
/// hard newlines and leading indentation.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: search_query=all:quantum</title>
  <entry>
    <id>http://arxiv.org/abs/2301.00001v1</id>
    <published>2023-01-02T18:00:00Z</published>
    <title>Quantum Error Correction
      with Surface Codes</title>
    <summary>  We study quantum error correction
      in the surface code regime.
    </summary>
    <author>
      <name>Alice Example</name>
    </author>
    <author>
      <name>Bob Example</name>
    </author>
    <link href="http://arxiv.org/abs/2301.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2301.00001v1" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2301.00002v2</id>
    <published>2023-02-10T12:30:00Z</published>
    <title>Entanglement &amp; Decoherence</title>
    <summary>A review of entanglement.</summary>
    <author>
      <name>Carol Example</name>
    </author>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_atom_feed() {
        let papers = parse_atom_feed(SAMPLE_FEED);
        assert_eq!(papers.len(), 2);

        let first = &papers[0];
        assert_eq!(first.title, "Quantum Error Correction with Surface Codes");
        assert_eq!(first.authors, vec!["Alice Example", "Bob Example"]);
        assert_eq!(first.published, "2023-01-02");
        assert_eq!(first.source_url, "http://arxiv.org/pdf/2301.00001v1");
        assert_eq!(first.id, "http://arxiv.org/abs/2301.00001v1");
        assert!(first.summary.starts_with("We study quantum error correction"));

        let second = &papers[1];
        assert_eq!(second.title, "Entanglement & Decoherence");
        // No pdf link in the entry, fall back to the abstract page
        assert_eq!(second.source_url, "http://arxiv.org/abs/2301.00002v2");
    }

    #[test]
    fn test_parse_empty_feed() {
        let feed = r#"<?xml version="1.0"?><feed></feed>"#;
        assert!(parse_atom_feed(feed).is_empty());
    }

    #[tokio::test]
    async fn test_zero_max_results_skips_request() {
        // base_url is unroutable; the request must never be issued
        let client = ArxivClient::new(&crate::config::ArxivConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 1,
            default_max_results: 5,
        })
        .unwrap();

        let papers = client.search("quantum computing", 0).await.unwrap();
        assert!(papers.is_empty());
    }
}
