//! Per-agency discovery and metadata extraction.
//!
//! Every agency publishes its disclosure log in a different markup shape and
//! dedups on a different key, so each gets its own [`SiteAdapter`] variant.
//! The shared rules (anchor validation, row re-parsing, text extraction) live
//! here.

pub mod agd;
pub mod defence;
pub mod dfat;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::error;

use crate::contract::{Fetcher, RecordStore};
use crate::error::{DiscoveryError, ExtractionError, FetchError};
use crate::fetch::Page;
use crate::request::{DocumentMeta, Organisation, Request};

pub use agd::AgdAdapter;
pub use defence::DefenceAdapter;
pub use dfat::DfatAdapter;

/// A listing entry whose dedup key was not found in the record store.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Request page (AGD) or the listing page the row came from.
    pub url: String,
    /// Outer markup of the listing row, when the row itself carries the metadata.
    pub node: Option<String>,
    pub title: String,
}

#[async_trait]
pub trait SiteAdapter: Send + Sync {
    fn organisation(&self) -> Organisation;

    /// First listing page of the disclosure log.
    async fn get_start_page(&self, fetcher: &dyn Fetcher) -> Result<Page, FetchError>;

    /// Walk the listing from `page` and return the entries not yet in `store`,
    /// in listing order.
    async fn find_new_documents(
        &self,
        fetcher: &dyn Fetcher,
        store: &dyn RecordStore,
        page: Page,
    ) -> Result<Vec<Candidate>, DiscoveryError>;

    /// Map a request page or listing row onto a [`Request`]. Any invalid
    /// attachment anchor fails the whole request.
    fn generate_metadata(
        &self,
        url: &str,
        node: &str,
        retrieved_at: DateTime<Utc>,
    ) -> Result<Request, ExtractionError>;
}

/// Adapter for `organisation`. `find_missing` only affects AGD.
pub fn adapter_for(organisation: Organisation, find_missing: bool) -> Box<dyn SiteAdapter> {
    match organisation {
        Organisation::Agd => Box::new(AgdAdapter::new(find_missing)),
        Organisation::Dfat => Box::new(DfatAdapter::default()),
        Organisation::Defence => Box::new(DefenceAdapter::default()),
    }
}

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Trimmed text content of an element.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Text of the first match of `sel` under `root`, or a missing-field error.
pub(crate) fn required_text(
    root: ElementRef<'_>,
    sel: &Selector,
    field: &'static str,
) -> Result<String, ExtractionError> {
    root.select(sel)
        .next()
        .map(text_of)
        .ok_or(ExtractionError::MissingField(field))
}

/// `text` unless it is empty; an empty title or reference would collapse the
/// request's storage path.
pub(crate) fn non_empty(text: String, field: &'static str) -> Result<String, ExtractionError> {
    if text.is_empty() {
        Err(ExtractionError::MissingField(field))
    } else {
        Ok(text)
    }
}

/// Direct `<td>` children of a table row.
pub(crate) fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "td")
        .collect()
}

/// Re-parse the outer markup of a `<tr>`. Rows only survive parsing inside a
/// table context.
pub(crate) fn parse_row(node: &str) -> Html {
    Html::parse_fragment(&format!("<table><tbody>{node}</tbody></table>"))
}

pub(crate) fn first_row(fragment: &Html) -> Result<ElementRef<'_>, ExtractionError> {
    fragment
        .select(&ROW)
        .next()
        .ok_or(ExtractionError::MissingField("tr"))
}

/// `href` of an attachment anchor. A missing href or a `mailto` link is fatal
/// for the enclosing request.
pub(crate) fn validated_href(anchor: ElementRef<'_>) -> Result<&str, ExtractionError> {
    match anchor.value().attr("href") {
        Some(href) if !href.starts_with("mailto") => Ok(href),
        _ => {
            let markup = anchor.html();
            error!(anchor = %markup, "Invalid anchor");
            Err(ExtractionError::InvalidAnchor(markup))
        }
    }
}

/// Build document metadata for every anchor below `container`.
pub(crate) fn collect_documents<F>(
    container: ElementRef<'_>,
    resolve: F,
) -> Result<Vec<DocumentMeta>, ExtractionError>
where
    F: Fn(&str) -> Result<String, ExtractionError>,
{
    container
        .select(&ANCHOR)
        .map(|a| {
            let href = validated_href(a)?;
            Ok(DocumentMeta::new(resolve(href)?, text_of(a)))
        })
        .collect()
}
