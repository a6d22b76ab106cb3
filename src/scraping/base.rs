use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::models::Event;

/// Link texts shorter than this are navigation, not events.
pub const MIN_LINK_TEXT: usize = 5;
/// Link texts longer than this are treated as event titles even without a `+`.
pub const CANDIDATE_LINK_TEXT: usize = 10;
pub const TIMEZONE: Tz = chrono_tz::America::Los_Angeles;

const USER_AGENT: &str = "SeattleEvents/0.1 (+https://github.com/seattle-events/seattle-events)";
const REQUEST_TIMEOUT_SECS: u64 = 20;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("link selector"));
static FREE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+FREE\s*$").expect("valid free suffix regex"));

#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    async fn fetch_html(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("unable to build http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HtmlFetcher for HttpFetcher {
    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request failed for {url}"))?;
        let response = response
            .error_for_status()
            .with_context(|| format!("non-success status for {url}"))?;
        response
            .text()
            .await
            .with_context(|| format!("unable to read response body for {url}"))
    }
}

pub fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of `element`. Text nodes are concatenated as rendered, so
/// inline markup inside a word does not split it.
pub fn inner_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

pub fn absolute_url(base: &str, href: Option<String>) -> Option<String> {
    let href = href?;
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base_url = reqwest::Url::parse(base).ok()?;
    base_url.join(href).ok().map(|u| u.to_string())
}

pub fn is_event_candidate(text: &str) -> bool {
    let len = text.chars().count();
    if len < MIN_LINK_TEXT {
        return false;
    }
    text.contains('+') || len > CANDIDATE_LINK_TEXT
}

pub fn mentions_free(text: &str) -> bool {
    text.to_lowercase().contains("free")
}

pub fn strip_free_marker(text: &str) -> String {
    FREE_SUFFIX_RE.replace(text, "").trim().to_string()
}

pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

pub fn month_label(month: u32, year: i32) -> Option<String> {
    month_name(month).map(|name| format!("{name} {year}"))
}

/// Month/year of `now` as seen in Seattle, e.g. `March 2025`.
pub fn processing_label(now: DateTime<Utc>) -> String {
    let local = now.with_timezone(&TIMEZONE);
    month_label(local.month(), local.year()).unwrap_or_else(|| local.year().to_string())
}

/// Walks every link on the page and keeps the ones that read like event titles.
pub fn extract_link_events(html: &str, page_url: &str, date_label: &str) -> Vec<Event> {
    let document = Html::parse_document(html);
    let mut events = Vec::new();

    for link in document.select(&LINK_SELECTOR) {
        let text = inner_text(link);
        if !is_event_candidate(&text) {
            continue;
        }

        let title = strip_free_marker(&text);
        if title.is_empty() {
            continue;
        }

        let url = absolute_url(page_url, link.value().attr("href").map(str::to_string));

        events.push(Event {
            title,
            date: date_label.to_string(),
            description: None,
            location: None,
            is_free: mentions_free(&text),
            url,
            source: String::new(),
            relevant_date: None,
        });
    }

    events
}
