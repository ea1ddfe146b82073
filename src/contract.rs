//! # contract: capability seams of the scrape pipeline
//!
//! The orchestrator talks to the outside world through three traits:
//!
//! - [`Fetcher`]: HTTP retrieval of listing pages and raw document bytes.
//! - [`RecordStore`]: dedup lookups and the final insert of a completed request.
//! - [`Packager`]: the external torrent-creation and seeding commands.
//!
//! Each trait is annotated for `mockall`, so tests (and downstream crates with
//! the `test-export-mocks` feature) get `MockFetcher`, `MockRecordStore` and
//! `MockPackager` for free.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use std::path::{Path, PathBuf};

use crate::error::{AnnounceError, FetchError, PackagingError, StoreError};
use crate::fetch::Page;
use crate::request::{Organisation, RecordFilter, Request};

/// Retrieves pages and documents. Implementations never retry.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a markup page, normalised and ready to parse.
    async fn fetch_page(&self, url: &str) -> Result<Page, FetchError>;

    /// Fetch the exact bytes served at `url`.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Persistence for completed requests.
///
/// Dedup lookups and inserts are separate calls; nothing spans a whole request.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// First stored request matching every set field of `filter`.
    async fn find_one(&self, filter: &RecordFilter) -> Result<Option<Request>, StoreError>;

    /// Persist a request, returning its store id.
    async fn insert(&self, request: &Request) -> Result<String, StoreError>;

    /// All stored requests, optionally restricted to one organisation.
    async fn list(&self, organisation: Option<Organisation>) -> Result<Vec<Request>, StoreError>;
}

/// Torrent creation and seeding.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Packager: Send + Sync {
    /// Build a torrent for `directory`, returning the path of the written file.
    fn package(&self, directory: &Path, archive_name: &str) -> Result<PathBuf, PackagingError>;

    /// Hand a torrent to the seeding client.
    fn announce(&self, archive_path: &Path, directory: &Path) -> Result<(), AnnounceError>;
}
