//! Department of Defence.
//!
//! The start page links to one result page per category; each result page
//! holds a table whose rows are complete requests. Dedup key: reference.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::Selector;
use std::sync::LazyLock;
use tracing::{debug, warn};

use super::{
    collect_documents, first_row, non_empty, parse_row, required_text, row_cells, selector,
    text_of, Candidate, SiteAdapter,
};
use crate::contract::{Fetcher, RecordStore};
use crate::error::{DiscoveryError, ExtractionError, FetchError};
use crate::fetch::Page;
use crate::request::{Organisation, RecordFilter, Request};

pub const HOST: &str = "http://www.defence.gov.au";
const DIR: &str = "/foi";
const LOG_PATH: &str = "/foi/disclosure_log.htm";
const CELLS: usize = 5;

/// Tried in order; the first that parses wins.
const DATE_FORMATS: [&str; 4] = ["%d-%b-%y", "%d-%B-%y", "%d-%b-%Y", "%d-%B-%Y"];

static CATEGORY_LINKS: LazyLock<Selector> = LazyLock::new(|| selector(".homeBtn a"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("#table tbody tr"));
static FOI_TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".foiTitle"));

pub struct DefenceAdapter {
    host: String,
}

impl Default for DefenceAdapter {
    fn default() -> Self {
        Self::with_host(HOST)
    }
}

impl DefenceAdapter {
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn log_url(&self) -> String {
        format!("{}{}", self.host, LOG_PATH)
    }

    /// Absolute links are kept, root-relative links join the host, anything
    /// else is relative to the FOI directory.
    pub fn parse_document_url(&self, url: &str) -> String {
        if url.starts_with("http") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.host, url)
        } else {
            format!("{}{}/{}", self.host, DIR, url)
        }
    }

    fn category_links(&self, page: &Page) -> Vec<String> {
        let document = page.document();
        document
            .select(&CATEGORY_LINKS)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| self.parse_document_url(href))
            .collect()
    }
}

/// Dates look like `05-Jul-13` and may carry trailing text after a space.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ExtractionError> {
    let input = raw.trim().split(' ').next().unwrap_or_default().trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .ok_or_else(|| ExtractionError::Date {
            input: input.to_string(),
        })
}

struct ResultRow {
    reference: String,
    title: String,
    node: String,
}

fn scan_result_rows(page: &Page) -> Vec<ResultRow> {
    let document = page.document();
    document
        .select(&ROWS)
        .filter_map(|row| {
            let cells = row_cells(row);
            if cells.len() != CELLS {
                debug!(cells = cells.len(), url = %page.url, "Skipping malformed row");
                return None;
            }
            let Some(title) = row.select(&FOI_TITLE).next().map(text_of) else {
                warn!(url = %page.url, "Result row without .foiTitle, skipping");
                return None;
            };
            Some(ResultRow {
                reference: text_of(cells[1]),
                title,
                node: row.html(),
            })
        })
        .collect()
}

#[async_trait]
impl SiteAdapter for DefenceAdapter {
    fn organisation(&self) -> Organisation {
        Organisation::Defence
    }

    async fn get_start_page(&self, fetcher: &dyn Fetcher) -> Result<Page, FetchError> {
        fetcher.fetch_page(&self.log_url()).await
    }

    async fn find_new_documents(
        &self,
        fetcher: &dyn Fetcher,
        store: &dyn RecordStore,
        page: Page,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut candidates = Vec::new();
        for url in self.category_links(&page) {
            let subpage = fetcher.fetch_page(&url).await?;
            for row in scan_result_rows(&subpage) {
                if store
                    .find_one(&RecordFilter::by_reference(&row.reference))
                    .await?
                    .is_some()
                {
                    continue;
                }
                candidates.push(Candidate {
                    url: url.clone(),
                    node: Some(row.node),
                    title: row.title,
                });
            }
        }
        Ok(candidates)
    }

    fn generate_metadata(
        &self,
        url: &str,
        node: &str,
        retrieved_at: DateTime<Utc>,
    ) -> Result<Request, ExtractionError> {
        let fragment = parse_row(node);
        let row = first_row(&fragment)?;
        let cells = row_cells(row);
        if cells.len() != CELLS {
            return Err(ExtractionError::MalformedRow(cells.len()));
        }

        let title = non_empty(required_text(row, &FOI_TITLE, "title")?, "title")?;
        let date_released = parse_date(&text_of(cells[0]))?;
        let documents = collect_documents(cells[2], |href| Ok(self.parse_document_url(href)))?;

        Ok(Request {
            organisation: Organisation::Defence,
            title,
            reference: Some(text_of(cells[1])),
            description: None,
            access: Some(text_of(cells[3])),
            exemptions: Some(text_of(cells[4])),
            date_released,
            date_retrieved: retrieved_at,
            original_url: url.to_string(),
            documents,
            archive_name: None,
        })
    }
}
