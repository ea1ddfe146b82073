//! Attorney-General's Department.
//!
//! The listing is paginated and sorted newest first, with one page per
//! request. Dedup key: (organisation, title).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::Selector;
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

use super::{
    collect_documents, non_empty, required_text, selector, text_of, Candidate, SiteAdapter,
};
use crate::contract::{Fetcher, RecordStore};
use crate::error::{DiscoveryError, ExtractionError, FetchError};
use crate::fetch::Page;
use crate::request::{Organisation, RecordFilter, Request};

pub const BASE_URL: &str = "http://www.ag.gov.au";
const START_PATH: &str = "/RightsAndProtections/FOI/Pages/Freedomofinformationdisclosurelog.aspx";
/// Oldest-first ordering, used to revisit entries a previous run missed.
const FIND_MISSING_QUERY: &str = "?lsf=date&lso=0";
const VIEWER_PAGE: &str = "WordViewer.aspx";
/// Release dates read `Monday, 01 July 2013`; the weekday is not checked.
const DATE_FORMAT: &str = "%d %B %Y";

static LISTING_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| selector(".disclosure-log-list .dl-item-title a"));
static NEXT_PAGE: LazyLock<Selector> = LazyLock::new(|| selector(".paging-next a"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector(".wc-title h1"));
static RELEASE_DATE: LazyLock<Selector> = LazyLock::new(|| selector(".dl-date .dl-value"));
static DESCRIPTION: LazyLock<Selector> = LazyLock::new(|| selector(".dl-abstract .dl-value"));
static DOCUMENTS: LazyLock<Selector> = LazyLock::new(|| selector(".dl-downloads"));

pub struct AgdAdapter {
    base_url: String,
    /// Backfill mode: scan every row of every page instead of stopping at the
    /// first already-captured entry.
    find_missing: bool,
}

impl AgdAdapter {
    pub fn new(find_missing: bool) -> Self {
        Self::with_base_url(BASE_URL, find_missing)
    }

    pub fn with_base_url(base_url: impl Into<String>, find_missing: bool) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            find_missing,
        }
    }

    pub fn start_url(&self) -> String {
        let mut url = format!("{}{}", self.base_url, START_PATH);
        if self.find_missing {
            url.push_str(FIND_MISSING_QUERY);
        }
        url
    }

    /// Unwrap links to the document viewer page into the document they show.
    pub fn parse_doc_url(&self, url: &str) -> Result<String, ExtractionError> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return Ok(url.to_string()),
        };
        if !parsed.path().ends_with(VIEWER_PAGE) {
            return Ok(url.to_string());
        }
        let id = parsed
            .query_pairs()
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| ExtractionError::ViewerWithoutId(url.to_string()))?;
        if id.starts_with('/') {
            Ok(format!("{}{}", self.base_url, id))
        } else {
            Ok(id)
        }
    }
}

/// Release date with any leading weekday dropped, so a mislabelled weekday
/// still parses.
pub fn parse_release_date(raw: &str) -> Result<NaiveDate, ExtractionError> {
    let date = raw.split_once(',').map_or(raw, |(_, rest)| rest).trim();
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|_| ExtractionError::Date {
        input: raw.to_string(),
    })
}

struct ListingEntry {
    url: String,
    title: String,
    dedup_title: String,
}

struct Listing {
    entries: Vec<ListingEntry>,
    next_page: Option<String>,
}

fn scan_listing(page: &Page) -> Listing {
    let document = page.document();
    let entries = document
        .select(&LISTING_ANCHOR)
        .filter_map(|a| {
            let Some(href) = a.value().attr("href") else {
                warn!(anchor = %a.html(), "Listing anchor without href, skipping");
                return None;
            };
            let title = text_of(a);
            let dedup_title = a
                .value()
                .attr("title")
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| title.clone());
            Some(ListingEntry {
                url: page.resolve(href),
                title,
                dedup_title,
            })
        })
        .collect();
    let next_page = document
        .select(&NEXT_PAGE)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| page.resolve(href));
    Listing { entries, next_page }
}

#[async_trait]
impl SiteAdapter for AgdAdapter {
    fn organisation(&self) -> Organisation {
        Organisation::Agd
    }

    async fn get_start_page(&self, fetcher: &dyn Fetcher) -> Result<Page, FetchError> {
        fetcher.fetch_page(&self.start_url()).await
    }

    async fn find_new_documents(
        &self,
        fetcher: &dyn Fetcher,
        store: &dyn RecordStore,
        page: Page,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut page = page;
        let mut candidates = Vec::new();
        loop {
            let listing = scan_listing(&page);
            for entry in listing.entries {
                let filter = RecordFilter::by_title(Organisation::Agd, &entry.dedup_title);
                if store.find_one(&filter).await?.is_none() {
                    debug!(url = %entry.url, "Adding URL");
                    candidates.push(Candidate {
                        url: entry.url,
                        node: None,
                        title: entry.title,
                    });
                } else if !self.find_missing {
                    debug!(title = %entry.dedup_title, "Reached an already captured entry. Done.");
                    return Ok(candidates);
                }
            }

            let Some(next) = listing.next_page else {
                debug!("No next page. Done.");
                return Ok(candidates);
            };
            page = fetcher.fetch_page(&next).await?;
            debug!(url = %next, "Next page downloaded.");
        }
    }

    fn generate_metadata(
        &self,
        url: &str,
        node: &str,
        retrieved_at: DateTime<Utc>,
    ) -> Result<Request, ExtractionError> {
        let document = Page::new(url, node).document();
        let root = document.root_element();

        let title = non_empty(required_text(root, &TITLE, "title")?, "title")?;
        let description = required_text(root, &DESCRIPTION, "description")?;
        let released = required_text(root, &RELEASE_DATE, "date_released")?;
        let date_released = parse_release_date(&released)?;

        let mut documents = Vec::new();
        for container in root.select(&DOCUMENTS) {
            documents.extend(collect_documents(container, |href| {
                self.parse_doc_url(&format!("{}{}", self.base_url, href))
            })?);
        }

        Ok(Request {
            organisation: Organisation::Agd,
            title,
            reference: None,
            description: Some(description),
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
