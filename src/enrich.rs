//! Correlates scraped listings with search snippets to fill in description,
//! location and a better link.

use std::sync::Arc;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::models::{DateEvents, Event, Retrieved, SourceFailure};
use crate::scraping::base;
use crate::search::{
    SearchError, SearchHit, SearchProvider, SearchRequest, DEFAULT_MAX_RESULTS,
};

pub const DESCRIPTION_BUDGET: usize = 200;
pub const DEFAULT_DOMAINS: [&str; 1] = ["events12.com"];
/// How many records a date lookup falls back to when nothing mentions the date.
pub const DATE_FALLBACK_LIMIT: usize = 10;

static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)at\s+([^,.]+)").expect("valid location regex"));

pub struct Enricher {
    provider: Arc<dyn SearchProvider>,
    include_domains: Vec<String>,
    max_results: usize,
}

impl Enricher {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            include_domains: DEFAULT_DOMAINS.iter().map(|d| d.to_string()).collect(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Events for a `YYYY-MM-DD` date. Invalid dates and failed searches
    /// degrade to `{ date: <input>, events: [] }`.
    pub async fn enrich_for_date(
        &self,
        date: &str,
        candidates: Vec<Event>,
    ) -> Retrieved<DateEvents> {
        let empty = || DateEvents {
            date: date.to_string(),
            events: Vec::new(),
        };

        let Some(day) = parse_request_date(date) else {
            warn!(date, "date enrichment skipped: not a calendar date");
            return Retrieved::degraded(
                empty(),
                vec![SourceFailure::new(
                    self.provider.name(),
                    format!("invalid date: {date}"),
                )],
            );
        };

        let formatted = long_date(day);
        info!("searching for Seattle events on {formatted}");

        match self
            .enrich(&date_query(&formatted), candidates, Some(&formatted))
            .await
        {
            Ok(enhanced) => Retrieved::complete(DateEvents {
                events: select_for_date(enhanced, &formatted),
                date: formatted,
            }),
            Err(err) => {
                warn!(provider = self.provider.name(), date, "date enrichment failed: {err}");
                Retrieved::degraded(empty(), vec![SourceFailure::new(self.provider.name(), err)])
            }
        }
    }

    async fn enrich(
        &self,
        query: &str,
        candidates: Vec<Event>,
        relevant_date: Option<&str>,
    ) -> Result<Vec<Event>, SearchError> {
        let request = SearchRequest::new(query)
            .with_domains(self.include_domains.iter().cloned())
            .with_max_results(self.max_results);
        let hits = self.provider.search(&request).await?;
        Ok(enhance(candidates, &hits, relevant_date))
    }
}

pub fn parse_request_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// `Saturday, March 22, 2025`
pub fn long_date(day: NaiveDate) -> String {
    day.format("%A, %B %-d, %Y").to_string()
}

pub fn date_query(long_date: &str) -> String {
    format!("Seattle events on {long_date} events12.com")
}

/// First hit, in provider order, whose title or snippet overlaps the event title.
pub fn find_match<'a>(event: &Event, hits: &'a [SearchHit]) -> Option<&'a SearchHit> {
    hits.iter().find(|hit| {
        hit.title.contains(&event.title)
            || event.title.contains(&hit.title)
            || hit.content.contains(&event.title)
    })
}

pub fn truncate_description(content: &str) -> String {
    let head: String = content.chars().take(DESCRIPTION_BUDGET).collect();
    format!("{head}...")
}

pub fn extract_location(content: &str) -> Option<String> {
    LOCATION_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|location| !location.is_empty())
}

pub fn merge_hit(event: &Event, hit: &SearchHit, relevant_date: Option<&str>) -> Event {
    let has_content = !hit.content.is_empty();
    Event {
        title: event.title.clone(),
        date: event.date.clone(),
        description: has_content
            .then(|| truncate_description(&hit.content))
            .or_else(|| event.description.clone()),
        location: extract_location(&hit.content),
        is_free: event.is_free || base::mentions_free(&hit.content),
        url: if hit.url.is_empty() {
            event.url.clone()
        } else {
            Some(hit.url.clone())
        },
        source: event.source.clone(),
        relevant_date: relevant_date
            .map(str::to_string)
            .or_else(|| event.relevant_date.clone()),
    }
}

pub fn enhance(candidates: Vec<Event>, hits: &[SearchHit], relevant_date: Option<&str>) -> Vec<Event> {
    candidates
        .into_iter()
        .map(|event| match find_match(&event, hits) {
            Some(hit) => merge_hit(&event, hit, relevant_date),
            None => event,
        })
        .collect()
}

/// Keeps records tied to the date; falls back to the head of the list when
/// none are.
pub fn select_for_date(enhanced: Vec<Event>, long_date: &str) -> Vec<Event> {
    let needle = long_date.to_lowercase();
    let matched: Vec<Event> = enhanced
        .iter()
        .filter(|event| {
            event.relevant_date.is_some()
                || event
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();

    if matched.is_empty() {
        enhanced.into_iter().take(DATE_FALLBACK_LIMIT).collect()
    } else {
        matched
    }
}
