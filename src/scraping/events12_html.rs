use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use super::base::{self, HtmlFetcher};
use super::EventSource;
use crate::models::Event;

const URL: &str = "https://www.events12.com/seattle/";
const SOURCE_ID: &str = "events12";
const SOURCE_NAME: &str = "Events12.com";

pub struct Events12;

#[async_trait]
impl EventSource for Events12 {
    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn source_url(&self) -> &'static str {
        URL
    }

    async fn fetch(&self, fetcher: &dyn HtmlFetcher) -> Result<Vec<Event>> {
        let html = fetcher.fetch_html(URL).await?;
        Ok(self.parse_document(&html, URL, &base::processing_label(Utc::now())))
    }

    async fn fetch_month(
        &self,
        fetcher: &dyn HtmlFetcher,
        month: u32,
        year: i32,
    ) -> Result<Vec<Event>> {
        let url = month_url(month, year).ok_or_else(|| anyhow!("invalid month: {month}"))?;
        let label = base::month_label(month, year).ok_or_else(|| anyhow!("invalid month: {month}"))?;
        let html = fetcher.fetch_html(&url).await?;
        Ok(self.parse_document(&html, &url, &label))
    }
}

impl Events12 {
    pub(crate) fn parse_document(&self, html: &str, page_url: &str, date_label: &str) -> Vec<Event> {
        base::extract_link_events(html, page_url, date_label)
            .into_iter()
            .map(|event| event.tagged(SOURCE_ID))
            .collect()
    }
}

/// Month-scoped listing, e.g. `https://www.events12.com/seattle/march-2025/`.
pub fn month_url(month: u32, year: i32) -> Option<String> {
    base::month_name(month).map(|name| format!("{URL}{}-{year}/", name.to_lowercase()))
}
