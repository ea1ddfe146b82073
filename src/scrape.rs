//! Orchestration of one agency run: start page → discover → for each candidate
//! extract → retrieve → derive path → package → announce → persist.
//!
//! # Responsibilities
//! - Strictly sequential: one candidate is carried through to persistence (or
//!   abandoned) before the next one starts.
//! - A failed start page or discovery walk aborts the run ([`ScrapeError`]).
//! - Any other failure abandons only the current candidate ([`RequestError`]);
//!   nothing is persisted for it and the run continues.
//! - A failed announce is logged and the request is persisted regardless.
//!
//! # Non-invariant
//! Dedup lookups and the final insert are separate store calls. Two concurrent
//! runs against the same agency can both capture the same request.

use chrono::Utc;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::adapters::{Candidate, SiteAdapter};
use crate::contract::{Fetcher, Packager, RecordStore};
use crate::error::{RequestError, ScrapeError};
use crate::paths::derive_path;
use crate::request::Organisation;
use crate::retrieve::retrieve_all;

/// Lifecycle of a single candidate within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Discovered,
    MetadataExtracted,
    DocumentsRetrieved,
    Packaged,
    Announced,
    AnnounceFailed,
    Persisted,
}

#[derive(Debug)]
pub struct ScrapeReport {
    pub organisation: Organisation,
    pub discovered: usize,
    pub persisted: Vec<PersistedRequest>,
    pub failed: Vec<FailedCandidate>,
}

#[derive(Debug)]
pub struct PersistedRequest {
    pub id: String,
    pub title: String,
    pub archive_name: String,
    pub documents: usize,
    pub announced: bool,
}

#[derive(Debug)]
pub struct FailedCandidate {
    pub title: String,
    pub url: String,
    pub error: RequestError,
}

/// Shared handles for a run, constructed once at startup.
pub struct Scraper<'a> {
    fetcher: &'a dyn Fetcher,
    store: &'a dyn RecordStore,
    packager: &'a dyn Packager,
    path_root: PathBuf,
}

impl<'a> Scraper<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        store: &'a dyn RecordStore,
        packager: &'a dyn Packager,
        path_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            store,
            packager,
            path_root: path_root.into(),
        }
    }

    pub async fn scrape(&self, adapter: &dyn SiteAdapter) -> Result<ScrapeReport, ScrapeError> {
        let organisation = adapter.organisation();
        info!(%organisation, "[SCRAPE] Getting start page...");
        let page = adapter
            .get_start_page(self.fetcher)
            .await
            .map_err(|e| {
                error!(error = %e, "[SCRAPE][ERROR] Start page unavailable, aborting run");
                ScrapeError::StartPage(e)
            })?;

        info!("[SCRAPE] Finding new documents...");
        let candidates = adapter
            .find_new_documents(self.fetcher, self.store, page)
            .await
            .map_err(|e| {
                error!(error = %e, "[SCRAPE][ERROR] Discovery failed, aborting run");
                e
            })?;
        debug!(?candidates, "[SCRAPE] New candidates");

        let total = candidates.len();
        let mut report = ScrapeReport {
            organisation,
            discovered: total,
            persisted: Vec::new(),
            failed: Vec::new(),
        };

        for (n, candidate) in candidates.into_iter().enumerate() {
            info!("[{}/{}] Scraping: {}", n + 1, total, candidate.title);
            let title = candidate.title.clone();
            let url = candidate.url.clone();
            match self.scrape_request(adapter, candidate).await {
                Ok(persisted) => report.persisted.push(persisted),
                Err(error) => {
                    error!(title = %title, error = %error, "[SCRAPE][ERROR] Skipping request");
                    report.failed.push(FailedCandidate { title, url, error });
                }
            }
        }

        info!(
            discovered = report.discovered,
            persisted = report.persisted.len(),
            failed = report.failed.len(),
            "[SCRAPE] Run complete"
        );
        Ok(report)
    }

    /// Carry one candidate through to persistence.
    pub async fn scrape_request(
        &self,
        adapter: &dyn SiteAdapter,
        candidate: Candidate,
    ) -> Result<PersistedRequest, RequestError> {
        trace_state(RequestState::Discovered, &candidate.title);
        let node = match candidate.node {
            Some(node) => node,
            None => self.fetcher.fetch_page(&candidate.url).await?.markup,
        };

        let mut request = adapter.generate_metadata(&candidate.url, &node, Utc::now())?;
        trace_state(RequestState::MetadataExtracted, &request.title);

        if request.documents.is_empty() {
            return Err(RequestError::NoDocuments);
        }

        let directory = derive_path(&self.path_root, &request);
        retrieve_all(self.fetcher, &directory, &mut request.documents).await?;
        trace_state(RequestState::DocumentsRetrieved, &request.title);

        let archive_path = self
            .packager
            .package(&directory, &format!("{}.torrent", request.title))?;
        let archive_name = archive_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| archive_path.display().to_string());
        request.archive_name = Some(archive_name.clone());
        info!(torrent = %archive_path.display(), "[SCRAPE] Generated torrent");
        trace_state(RequestState::Packaged, &request.title);

        let announced = match self.packager.announce(&archive_path, &directory) {
            Ok(()) => {
                trace_state(RequestState::Announced, &request.title);
                true
            }
            Err(e) => {
                warn!(error = %e, torrent = %archive_path.display(), "[SCRAPE] Announce failed, persisting anyway");
                trace_state(RequestState::AnnounceFailed, &request.title);
                false
            }
        };

        let id = self.store.insert(&request).await?;
        trace_state(RequestState::Persisted, &request.title);

        Ok(PersistedRequest {
            id,
            title: request.title,
            archive_name,
            documents: request.documents.len(),
            announced,
        })
    }
}

fn trace_state(state: RequestState, title: &str) {
    debug!(?state, title = %title, "[SCRAPE] Request state");
}
