use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use super::base::{self, HtmlFetcher};
use super::EventSource;
use crate::models::Event;

const URL: &str = "https://lu.ma/seattle";
const SOURCE_ID: &str = "luma";
const SOURCE_NAME: &str = "Lu.ma";

pub struct Luma;

#[async_trait]
impl EventSource for Luma {
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
        Ok(self.parse_document(&html, &base::processing_label(Utc::now())))
    }
}

impl Luma {
    pub(crate) fn parse_document(&self, html: &str, date_label: &str) -> Vec<Event> {
        base::extract_link_events(html, URL, date_label)
            .into_iter()
            .map(|event| event.tagged(SOURCE_ID))
            .collect()
    }
}
