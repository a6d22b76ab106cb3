use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::models::{Event, Retrieved, SourceFailure};
use crate::scraping::base::HtmlFetcher;
use crate::scraping::{list_sources, EventSource, SourceInfo};

pub struct Aggregator {
    sources: Vec<Arc<dyn EventSource>>,
    fetcher: Arc<dyn HtmlFetcher>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn EventSource>>, fetcher: Arc<dyn HtmlFetcher>) -> Self {
        Self { sources, fetcher }
    }

    pub fn sources(&self) -> Vec<SourceInfo> {
        list_sources(&self.sources)
    }

    /// Default listing of every source, fetched concurrently.
    pub async fn collect(&self) -> Retrieved<Vec<Event>> {
        let fetcher = self.fetcher.as_ref();
        let results = join_all(self.sources.iter().map(|source| async move {
            (source.source_id(), source.fetch(fetcher).await)
        }))
        .await;
        merge(results)
    }

    pub async fn collect_for_month(&self, month: u32, year: i32) -> Retrieved<Vec<Event>> {
        let fetcher = self.fetcher.as_ref();
        let results = join_all(self.sources.iter().map(|source| async move {
            (source.source_id(), source.fetch_month(fetcher, month, year).await)
        }))
        .await;
        merge(results)
    }
}

/// Concatenates per-source results in registration order. A failed source
/// contributes nothing and is reported as a failure.
fn merge(results: Vec<(&'static str, Result<Vec<Event>>)>) -> Retrieved<Vec<Event>> {
    let mut events = Vec::new();
    let mut failures = Vec::new();

    for (source_id, result) in results {
        match result {
            Ok(scraped) => {
                debug!(source = source_id, count = scraped.len(), "source scraped");
                events.extend(scraped.into_iter().map(|event| event.tagged(source_id)));
            }
            Err(err) => {
                warn!(source = source_id, "source fetch failed: {err:#}");
                failures.push(SourceFailure::new(source_id, format!("{err:#}")));
            }
        }
    }

    Retrieved::degraded(dedupe_by_url(events), failures)
}

/// Drops records whose URL was already seen. Records without a URL are kept.
pub fn dedupe_by_url(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|event| match &event.url {
            Some(url) => seen.insert(url.clone()),
            None => true,
        })
        .collect()
}
