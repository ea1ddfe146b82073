//! Error taxonomy for the scrape pipeline.
//!
//! Discovery failures ([`DiscoveryError`]) abort a whole agency run. Per-candidate
//! failures ([`RequestError`]) abort only that candidate. [`AnnounceError`] is
//! logged and never aborts anything.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid anchor: '{0}'")]
    InvalidAnchor(String),
    #[error("could not parse date {input:?}")]
    Date { input: String },
    #[error("malformed listing row: expected 5 cells, found {0}")]
    MalformedRow(usize),
    #[error("document viewer link without `id` parameter: {0}")]
    ViewerWithoutId(String),
}

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("document filename {filename:?} does not name a file inside the request directory")]
    UnsafeFilename { filename: String },
    #[error("failed to retrieve {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PackagingError {
    #[error("torrent command is empty")]
    EmptyCommand,
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("torrent command exited with {0}")]
    ExitStatus(std::process::ExitStatus),
    #[error("failed to prepare {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("seed command is empty")]
    EmptyCommand,
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("seed command exited with {0}")]
    ExitStatus(std::process::ExitStatus),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt record at {}:{line}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("record store lock poisoned")]
    Poisoned,
}

/// Failure while walking listing pages.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("dedup lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// Terminal failure for one candidate. The run moves on to the next candidate.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("fetching request page failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("no documents found for this request")]
    NoDocuments,
    #[error("document retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("packaging failed: {0}")]
    Packaging(#[from] PackagingError),
    #[error("persisting request failed: {0}")]
    Store(#[from] StoreError),
}

/// Run-level abort.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("could not fetch start page: {0}")]
    StartPage(#[source] FetchError),
    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
}
