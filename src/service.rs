use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::cache::EventCache;
use crate::enrich::{self, Enricher};
use crate::models::{DateEvents, Event, Retrieved};
use crate::query::{self, EventFilter};
use crate::scraping::SourceInfo;

pub struct EventService {
    aggregator: Aggregator,
    enricher: Enricher,
    cache: Arc<EventCache>,
}

impl EventService {
    pub fn new(aggregator: Aggregator, enricher: Enricher, cache: Arc<EventCache>) -> Self {
        Self {
            aggregator,
            enricher,
            cache,
        }
    }

    pub fn cache(&self) -> Arc<EventCache> {
        self.cache.clone()
    }

    pub fn sources(&self) -> Vec<SourceInfo> {
        self.aggregator.sources()
    }

    /// Every source's listing, served from cache while fresh. A cached partial
    /// listing is returned with the failures it was built with. Only one caller
    /// refills an expired cache; the rest wait and read its result.
    pub async fn all_events(&self) -> Retrieved<Vec<Event>> {
        if let Some(cached) = self.cache.fresh_events() {
            debug!("returning cached events");
            return cached;
        }

        let _refill = self.cache.refill_guard().await;
        if let Some(cached) = self.cache.fresh_events() {
            debug!("returning events cached by a concurrent refill");
            return cached;
        }

        info!(last_updated = ?self.cache.last_updated(), "fetching fresh events");
        let gathered = self.aggregator.collect().await;
        let source_count = self.aggregator.sources().len();
        if gathered.failures.len() >= source_count && gathered.value.is_empty() {
            warn!("every source failed, leaving cache empty");
        } else {
            self.cache.store_events(gathered.clone());
        }
        gathered
    }

    /// Listing for the month of `date`, enriched and narrowed to that day.
    pub async fn events_for_date(&self, date: &str) -> Retrieved<DateEvents> {
        if let Some(cached) = self.cache.date_events(date) {
            debug!(date, "returning cached events for date");
            return Retrieved::complete(cached);
        }

        info!(date, "fetching events for date");
        let candidates = match enrich::parse_request_date(date) {
            Some(day) => self.aggregator.collect_for_month(day.month(), day.year()).await,
            None => Retrieved::complete(Vec::new()),
        };

        let mut result = self.enricher.enrich_for_date(date, candidates.value).await;
        let mut failures = candidates.failures;
        failures.append(&mut result.failures);
        result.failures = failures;

        if result.is_degraded() {
            debug!(date, "not caching degraded date result");
        } else {
            self.cache.store_date_events(date, result.value.clone());
        }
        result
    }

    pub async fn search(&self, filter: &EventFilter) -> Retrieved<Vec<Event>> {
        let all = self.all_events().await;
        let mut failures = all.failures;
        let mut events = query::apply_filters(all.value, filter);

        if let Some(date) = filter.date() {
            let mut dated = self.events_for_date(date).await;
            failures.append(&mut dated.failures);
            events = query::restrict_to_date(events, &dated.value.events);
        }

        Retrieved::degraded(events, failures)
    }
}
