use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result cap sent with every request unless overridden.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// One result returned by the search provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Snippet text for the page.
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub search_depth: String,
    pub include_domains: Vec<String>,
    pub max_results: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            search_depth: "advanced".to_string(),
            include_domains: Vec::new(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("http error: {0}")]
    Http(String),
    #[error("search api error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}
