//! Encyclopedia Search
//!
//! Title search against the Wikipedia API followed by one REST summary fetch
//! per hit. Every call first draws from the shared [`CallBudget`]; when the
//! budget is spent, or nothing is found, a sentinel string is returned
//! instead of an error.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::CallBudget;
use crate::constants::search::{
    EXTRACT_CHARS, LIMIT_REACHED, NO_RESULTS, NO_SUMMARIES, WIKI_API_URL, WIKI_SUMMARY_URL,
};
use crate::types::{RapportError, Result, json_string, truncate_chars};

pub struct WikiSearch {
    budget: Arc<CallBudget>,
    client: reqwest::Client,
    api_url: String,
    summary_url: String,
}

impl std::fmt::Debug for WikiSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiSearch")
            .field("budget", &self.budget)
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl WikiSearch {
    pub fn new(budget: Arc<CallBudget>, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RapportError::Search(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            budget,
            client,
            api_url: WIKI_API_URL.to_string(),
            summary_url: WIKI_SUMMARY_URL.to_string(),
        })
    }

    /// Point the tool at another MediaWiki deployment
    pub fn with_endpoints(mut self, api_url: &str, summary_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self.summary_url = summary_url.to_string();
        self
    }

    pub fn budget(&self) -> &CallBudget {
        &self.budget
    }

    /// Whether `text` is one of the tool's sentinel answers
    pub fn is_sentinel(text: &str) -> bool {
        matches!(text, LIMIT_REACHED | NO_RESULTS | NO_SUMMARIES)
    }

    /// Compact summaries for the top `max_results` titles matching `query`
    pub async fn search(&self, query: &str, max_results: usize, lang: &str) -> Result<String> {
        if !self.budget.try_acquire() {
            info!("Search budget exhausted ({} calls)", self.budget.limit());
            return Ok(LIMIT_REACHED.to_string());
        }

        let titles = self.search_titles(query, max_results).await?;
        if titles.is_empty() {
            return Ok(NO_RESULTS.to_string());
        }
        debug!("Search '{}' matched {} titles", query, titles.len());

        let summaries = join_all(titles.iter().map(|t| self.fetch_summary(t, lang))).await;
        let results: Vec<String> = summaries.into_iter().flatten().collect();

        if results.is_empty() {
            Ok(NO_SUMMARIES.to_string())
        } else {
            Ok(results.join("\n\n"))
        }
    }

    async fn search_titles(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let limit = max_results.to_string();
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("format", "json"),
                ("srlimit", limit.as_str()),
            ])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RapportError::Search(format!("Search request failed: {}", e)))?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| RapportError::Search(format!("Invalid search response: {}", e)))?;

        Ok(parse_titles(&body, max_results))
    }

    /// One formatted summary, or `None` when the page cannot be fetched
    async fn fetch_summary(&self, title: &str, lang: &str) -> Option<String> {
        let url = summary_url(&self.summary_url, title)?;
        let response = match self
            .client
            .get(url)
            .header("accept-language", lang)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!("Summary for '{}' returned {}", title, r.status());
                return None;
            }
            Err(e) => {
                warn!("Summary for '{}' failed: {}", title, e);
                return None;
            }
        };

        let body: Value = response.json().await.ok()?;
        Some(format_summary(title, &body))
    }
}

fn parse_titles(body: &Value, max_results: usize) -> Vec<String> {
    body.pointer("/query/search")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .take(max_results)
                .filter_map(|hit| json_string(hit, "title"))
                .filter(|title| !title.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn summary_url(base: &str, title: &str) -> Option<Url> {
    let mut url = Url::parse(base).ok()?;
    url.path_segments_mut().ok()?.pop_if_empty().push(title);
    Some(url)
}

fn format_summary(title: &str, body: &Value) -> String {
    let description = json_string(body, "description").unwrap_or_default();
    let extract = json_string(body, "extract").unwrap_or_default();
    format!(
        "{}: {} — {}",
        title,
        description,
        truncate_chars(&extract, EXTRACT_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local MediaWiki stand-in: one search hit, one summary. Counts requests.
    async fn spawn_wiki_stub() -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&head);
                let body = if request.starts_with("GET /summary/") {
                    json!({"description": "State", "extract": "Economy of the state"})
                } else {
                    json!({"query": {"search": [{"title": "Economy"}]}})
                }
                .to_string();
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base, requests)
    }

    #[tokio::test]
    async fn test_budget_runs_out_after_limit_successful_calls() {
        let (base, requests) = spawn_wiki_stub().await;
        let budget = Arc::new(CallBudget::new(2));
        let tool = WikiSearch::new(budget.clone(), 5).unwrap().with_endpoints(
            &format!("{}/api.php", base),
            &format!("{}/summary/", base),
        );

        for _ in 0..2 {
            let out = tool.search("New York", 2, "fr").await.unwrap();
            assert_eq!(out, "Economy: State — Economy of the state");
        }
        // One title search plus one summary per call
        assert_eq!(requests.load(Ordering::SeqCst), 4);

        let out = tool.search("New York", 2, "fr").await.unwrap();
        assert_eq!(out, LIMIT_REACHED);
        assert_eq!(requests.load(Ordering::SeqCst), 4);
        assert_eq!(budget.used(), 2);
        assert_eq!(budget.remaining(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_sentinel_without_request() {
        let budget = Arc::new(CallBudget::new(1));
        assert!(budget.try_acquire());

        // Unroutable endpoint: reaching the network would fail the test
        let tool = WikiSearch::new(budget.clone(), 1)
            .unwrap()
            .with_endpoints("http://127.0.0.1:9/api.php", "http://127.0.0.1:9/summary/");

        let out = tool.search("New York", 2, "en").await.unwrap();
        assert_eq!(out, LIMIT_REACHED);
        assert_eq!(budget.used(), 1);
    }

    #[tokio::test]
    async fn test_failed_request_still_consumes_budget() {
        let budget = Arc::new(CallBudget::new(2));
        let tool = WikiSearch::new(budget.clone(), 1)
            .unwrap()
            .with_endpoints("http://127.0.0.1:9/api.php", "http://127.0.0.1:9/summary/");

        assert!(matches!(
            tool.search("q", 2, "en").await,
            Err(RapportError::Search(_))
        ));
        assert_eq!(budget.remaining(), 1);
    }

    #[test]
    fn test_sentinels() {
        assert!(WikiSearch::is_sentinel("tool_guard: limit reached"));
        assert!(WikiSearch::is_sentinel("no_results"));
        assert!(WikiSearch::is_sentinel("no_summaries"));
        assert!(!WikiSearch::is_sentinel("New York: state — ..."));
    }

    #[test]
    fn test_parse_titles_respects_limit() {
        let body = json!({"query": {"search": [
            {"title": "New York (state)"},
            {"title": ""},
            {"title": "Economy of New York"},
            {"title": "Gross domestic product"}
        ]}});
        assert_eq!(
            parse_titles(&body, 3),
            vec!["New York (state)", "Economy of New York"]
        );
        assert!(parse_titles(&json!({"query": {}}), 3).is_empty());
    }

    #[test]
    fn test_summary_url_encodes_title() {
        let url = summary_url(WIKI_SUMMARY_URL, "New York (state)").unwrap();
        assert_eq!(
            url.as_str(),
            "https://en.wikipedia.org/api/rest_v1/page/summary/New%20York%20(state)"
        );
    }

    #[test]
    fn test_format_summary_truncates_extract() {
        let long = "é".repeat(600);
        let body = json!({"description": "State of the US", "extract": long});
        let line = format_summary("New York", &body);
        assert!(line.starts_with("New York: State of the US — "));
        assert_eq!(line.chars().filter(|c| *c == 'é').count(), 400);

        let bare = format_summary("X", &json!({}));
        assert_eq!(bare, "X:  — ");
    }
}
