pub mod base;
pub mod events12_html;
pub mod luma_html;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Event;
use base::HtmlFetcher;

#[async_trait]
pub trait EventSource: Send + Sync {
    fn source_id(&self) -> &'static str;
    fn source_name(&self) -> &'static str;
    fn source_url(&self) -> &'static str;
    async fn fetch(&self, fetcher: &dyn HtmlFetcher) -> Result<Vec<Event>>;

    /// Listing for one month. Sources without a month-scoped page serve their
    /// default listing.
    async fn fetch_month(
        &self,
        fetcher: &dyn HtmlFetcher,
        _month: u32,
        _year: i32,
    ) -> Result<Vec<Event>> {
        self.fetch(fetcher).await
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub url: String,
}

impl SourceInfo {
    pub fn of(source: &dyn EventSource) -> Self {
        Self {
            id: source.source_id().to_string(),
            name: source.source_name().to_string(),
            url: source.source_url().to_string(),
        }
    }
}

pub fn default_sources() -> Vec<Arc<dyn EventSource>> {
    vec![
        Arc::new(events12_html::Events12),
        Arc::new(luma_html::Luma),
    ]
}

pub fn list_sources(sources: &[Arc<dyn EventSource>]) -> Vec<SourceInfo> {
    sources
        .iter()
        .map(|source| SourceInfo::of(source.as_ref()))
        .collect()
}
