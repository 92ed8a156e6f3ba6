//! Recent-headlines news signal
//!
//! Queries a GDELT-compatible article search endpoint using the crisis name
//! and location as the search phrase.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use super::{http_client, read_success_body, SignalError, SignalKind, SignalSource};
use crate::model::Crisis;

const DEFAULT_BASE_URL: &str = "https://api.gdeltproject.org/api/v2/doc/doc";

/// Headlines beyond this count add prompt weight without adding signal
const MAX_HEADLINES: usize = 5;

#[derive(Debug, Deserialize)]
struct ArticleSearchResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: String,
    #[serde(default)]
    domain: String,
}

/// News headline source keyed by crisis name and location
pub struct NewsSource {
    client: Client,
    base_url: String,
}

impl NewsSource {
    pub fn new(base_url: Option<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn summarize(articles: &[Article]) -> Option<String> {
        let lines: Vec<String> = articles
            .iter()
            .filter(|a| !a.title.trim().is_empty())
            .take(MAX_HEADLINES)
            .map(|a| {
                if a.domain.is_empty() {
                    format!("- {}", a.title.trim())
                } else {
                    format!("- {} ({})", a.title.trim(), a.domain)
                }
            })
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(format!("Recent news coverage:\n{}", lines.join("\n")))
        }
    }
}

#[async_trait]
impl SignalSource for NewsSource {
    fn kind(&self) -> SignalKind {
        SignalKind::News
    }

    fn applicable(&self, _crisis: &Crisis) -> bool {
        true
    }

    async fn fetch(&self, crisis: &Crisis) -> Result<String, SignalError> {
        let query = format!("\"{}\" {}", crisis.name, crisis.location);
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SignalError::Parse(format!("news endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("query", &query)
            .append_pair("mode", "artlist")
            .append_pair("maxrecords", &MAX_HEADLINES.to_string())
            .append_pair("format", "json");

        tracing::debug!(crisis = %crisis.id, url = %url, "Fetching news headlines");

        let response = self.client.get(url).send().await?;
        let body = read_success_body(response).await?;

        let search: ArticleSearchResponse = serde_json::from_str(&body)
            .map_err(|e| SignalError::Parse(format!("news payload: {}", e)))?;

        Self::summarize(&search.articles).ok_or(SignalError::EmptyBody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, domain: &str) -> Article {
        Article {
            title: title.to_string(),
            domain: domain.to_string(),
        }
    }

    #[test]
    fn test_summarize_caps_headline_count() {
        let articles: Vec<Article> = (0..8)
            .map(|i| article(&format!("Headline {i}"), "example.com"))
            .collect();

        let snippet = NewsSource::summarize(&articles).unwrap();
        assert_eq!(snippet.lines().count(), 1 + MAX_HEADLINES);
        assert!(snippet.contains("Headline 0 (example.com)"));
        assert!(!snippet.contains("Headline 5"));
    }

    #[test]
    fn test_summarize_skips_blank_titles() {
        let articles = vec![article("  ", "a.com"), article("Real story", "b.com")];
        let snippet = NewsSource::summarize(&articles).unwrap();
        assert!(snippet.contains("Real story"));
        assert_eq!(snippet.lines().count(), 2);
    }

    #[test]
    fn test_summarize_empty_is_none() {
        assert!(NewsSource::summarize(&[]).is_none());
    }

    #[test]
    fn test_query_phrase_is_percent_encoded() {
        let source = NewsSource::new(None, Duration::from_secs(15));
        let mut url = Url::parse(&source.base_url).unwrap();
        url.query_pairs_mut()
            .append_pair("query", r#""Coastal Quake" Port"#);
        assert!(url.as_str().contains("query=%22Coastal+Quake%22+Port"));
    }
}
