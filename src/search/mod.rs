//! Hosted web search used to enrich scraped listings.

pub mod provider;
pub mod tavily;
pub mod types;

pub use provider::SearchProvider;
pub use tavily::TavilyProvider;
pub use types::{SearchError, SearchHit, SearchRequest, DEFAULT_MAX_RESULTS};
