use async_trait::async_trait;

use super::types::{SearchError, SearchHit, SearchRequest};

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, SearchError>;

    /// Provider name for logging.
    fn name(&self) -> &'static str;
}
