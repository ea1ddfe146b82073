use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_TRACKERS: [&str; 2] = [
    "udp://tracker.publicbt.com:80/announce",
    "udp://tracker.openbittorrent.com:80/announce",
];

pub const DEFAULT_COMMENT: &str = "Torrent retrieved from foitorrent: http://foitorrent.brendan.so";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub storage: StorageConfig,
    pub packaging: PackagingConfig,
    pub announce: AnnounceConfig,
    pub http: HttpConfig,
}

impl ScrapeConfig {
    pub fn trace_loaded(&self) {
        info!(
            path_root = %self.storage.path_root.display(),
            archive_root = %self.storage.archive_root.display(),
            store_path = %self.storage.store_path.display(),
            trackers = self.packaging.trackers.len(),
            "Loaded ScrapeConfig"
        );
        debug!(?self, "ScrapeConfig loaded (full debug)");
    }
}

/// Where documents, torrents and records live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path_root: PathBuf,
    pub archive_root: PathBuf,
    pub store_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path_root: PathBuf::from("requests"),
            archive_root: PathBuf::from("torrents"),
            store_path: PathBuf::from("requests.jsonl"),
        }
    }
}

/// Torrent-creation command. `command` is the program followed by any fixed
/// leading arguments; trackers, comment, output path and source directory
/// are appended per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingConfig {
    pub command: Vec<String>,
    pub trackers: Vec<String>,
    pub comment: String,
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            command: vec!["./mktorrent".to_string()],
            trackers: DEFAULT_TRACKERS.iter().map(|t| t.to_string()).collect(),
            comment: DEFAULT_COMMENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnounceConfig {
    pub command: Vec<String>,
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            command: vec!["transmission-remote".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Request timeout. Unset means requests may block indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("foi-torrent/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: None,
        }
    }
}
