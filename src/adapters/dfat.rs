//! Department of Foreign Affairs and Trade.
//!
//! One unpaginated table; each five-cell row is a complete request.
//! Dedup key: reference.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::Selector;
use std::sync::LazyLock;
use tracing::debug;

use super::{
    collect_documents, first_row, non_empty, parse_row, row_cells, selector, text_of, Candidate,
    SiteAdapter,
};
use crate::contract::{Fetcher, RecordStore};
use crate::error::{DiscoveryError, ExtractionError, FetchError};
use crate::fetch::Page;
use crate::request::{Organisation, RecordFilter, Request};

pub const BASE_URL: &str = "http://www.dfat.gov.au";
const LOG_PATH: &str = "/foi/disclosure-log.html";
const DATE_FORMAT: &str = "%d %B %Y";
const CELLS: usize = 5;

static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("#requests tbody tr"));

pub struct DfatAdapter {
    base_url: String,
}

impl Default for DfatAdapter {
    fn default() -> Self {
        Self::with_base_url(BASE_URL)
    }
}

impl DfatAdapter {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn log_url(&self) -> String {
        format!("{}{}", self.base_url, LOG_PATH)
    }
}

/// (reference, outer row markup) for every well-formed row.
fn scan_rows(page: &Page) -> Vec<(String, String)> {
    let document = page.document();
    document
        .select(&ROWS)
        .filter_map(|row| {
            let cells = row_cells(row);
            if cells.len() != CELLS {
                debug!(cells = cells.len(), "Skipping malformed row");
                return None;
            }
            Some((text_of(cells[0]), row.html()))
        })
        .collect()
}

#[async_trait]
impl SiteAdapter for DfatAdapter {
    fn organisation(&self) -> Organisation {
        Organisation::Dfat
    }

    async fn get_start_page(&self, fetcher: &dyn Fetcher) -> Result<Page, FetchError> {
        fetcher.fetch_page(&self.log_url()).await
    }

    async fn find_new_documents(
        &self,
        _fetcher: &dyn Fetcher,
        store: &dyn RecordStore,
        page: Page,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut candidates = Vec::new();
        for (reference, node) in scan_rows(&page) {
            if store
                .find_one(&RecordFilter::by_reference(&reference))
                .await?
                .is_some()
            {
                continue;
            }
            candidates.push(Candidate {
                url: page.url.clone(),
                node: Some(node),
                title: reference,
            });
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
        let cells = row_cells(first_row(&fragment)?);
        if cells.len() != CELLS {
            return Err(ExtractionError::MalformedRow(cells.len()));
        }

        let reference = non_empty(text_of(cells[0]), "reference")?;
        let released = text_of(cells[1]);
        let date_released = NaiveDate::parse_from_str(&released, DATE_FORMAT)
            .map_err(|_| ExtractionError::Date { input: released })?;
        let documents =
            collect_documents(cells[3], |href| Ok(format!("{}{}", self.base_url, href)))?;

        Ok(Request {
            organisation: Organisation::Dfat,
            title: reference.clone(),
            reference: Some(reference),
            description: Some(cells[2].html().trim().to_string()),
            access: None,
            exemptions: None,
            date_released,
            date_retrieved: retrieved_at,
            original_url: url.to_string(),
            documents,
            archive_name: None,
        })
    }
}
