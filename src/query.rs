use serde::Deserialize;

use crate::models::Event;

/// Query-string filters for `/api/events/search`. Every dimension is optional
/// and the provided ones are combined with AND.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EventFilter {
    pub q: Option<String>,
    pub category: Option<String>,
    pub city: Option<String>,
    pub date: Option<String>,
}

impl EventFilter {
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Any whitespace-separated token of `q` appears in title, description or location.
pub fn matches_text(event: &Event, q: &str) -> bool {
    let terms: Vec<String> = q.to_lowercase().split_whitespace().map(str::to_string).collect();
    if terms.is_empty() {
        return true;
    }
    let haystack = format!(
        "{} {} {}",
        event.title,
        event.description.as_deref().unwrap_or_default(),
        event.location.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    terms.iter().any(|term| haystack.contains(term.as_str()))
}

pub fn matches_category(event: &Event, category: &str) -> bool {
    if category.is_empty() || category == "All" {
        return true;
    }
    let haystack = format!(
        "{} {}",
        event.title,
        event.description.as_deref().unwrap_or_default()
    )
    .to_lowercase();
    haystack.contains(&category.to_lowercase())
}

/// Records without a location never match a city.
pub fn matches_city(event: &Event, city: &str) -> bool {
    if city.is_empty() {
        return true;
    }
    event
        .location
        .as_deref()
        .is_some_and(|location| location.to_lowercase().contains(&city.to_lowercase()))
}

/// Text, category and city dimensions of `filter`. The date dimension needs
/// enrichment and is applied with [`restrict_to_date`].
pub fn apply_filters(events: Vec<Event>, filter: &EventFilter) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| filter.q.as_deref().map_or(true, |q| matches_text(event, q)))
        .filter(|event| {
            filter
                .category
                .as_deref()
                .map_or(true, |category| matches_category(event, category))
        })
        .filter(|event| filter.city.as_deref().map_or(true, |city| matches_city(event, city)))
        .collect()
}

/// Keeps events whose (title, source) pair is in `dated`. An empty `dated`
/// leaves the set unchanged.
pub fn restrict_to_date(events: Vec<Event>, dated: &[Event]) -> Vec<Event> {
    if dated.is_empty() {
        return events;
    }
    events
        .into_iter()
        .filter(|event| {
            dated
                .iter()
                .any(|d| d.title == event.title && d.source == event.source)
        })
        .collect()
}
