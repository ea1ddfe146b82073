//! Data model for a single disclosure-log entry and its attachments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The agencies a site adapter exists for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Organisation {
    Agd,
    Dfat,
    Defence,
}

impl Organisation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Organisation::Agd => "agd",
            Organisation::Dfat => "dfat",
            Organisation::Defence => "defence",
        }
    }
}

impl fmt::Display for Organisation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One disclosure-log entry, as persisted in the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub organisation: Organisation,
    /// Human-readable identifier. For AGD this doubles as the dedup key.
    pub title: String,
    /// Agency-issued case reference (DFAT, Defence).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Free text (AGD) or the raw markup of the description cell (DFAT).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Access decision column (Defence only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    /// Exemptions column (Defence only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exemptions: Option<String>,
    pub date_released: NaiveDate,
    pub date_retrieved: DateTime<Utc>,
    pub original_url: String,
    pub documents: Vec<DocumentMeta>,
    /// File name of the generated torrent, set once packaging succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
}

/// One attachment of a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub original_url: String,
    pub title: String,
    /// Percent-decoded last path segment of `original_url`.
    pub filename: String,
    /// Byte count, known once the document has been retrieved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Hex SHA-256 over the retrieved bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

impl DocumentMeta {
    pub fn new(original_url: String, title: String) -> Self {
        let filename = filename_from_url(&original_url);
        Self {
            original_url,
            title,
            filename,
            size: None,
            content_hash: None,
        }
    }
}

/// Percent-decoded tail segment of a URL (everything after the last `/`).
pub fn filename_from_url(url: &str) -> String {
    let tail = url.rsplit('/').next().unwrap_or(url);
    percent_encoding::percent_decode_str(tail)
        .decode_utf8_lossy()
        .into_owned()
}

/// Lookup filter for the record store. Every field that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub organisation: Option<Organisation>,
    pub title: Option<String>,
    pub reference: Option<String>,
}

impl RecordFilter {
    pub fn by_title(organisation: Organisation, title: &str) -> Self {
        Self {
            organisation: Some(organisation),
            title: Some(title.to_string()),
            reference: None,
        }
    }

    pub fn by_reference(reference: &str) -> Self {
        Self {
            reference: Some(reference.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, request: &Request) -> bool {
        self.organisation.map_or(true, |o| o == request.organisation)
            && self.title.as_deref().map_or(true, |t| t == request.title)
            && self
                .reference
                .as_deref()
                .map_or(true, |r| request.reference.as_deref() == Some(r))
    }
}
