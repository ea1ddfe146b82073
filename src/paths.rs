//! Deterministic storage locations for requests and their torrents.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::request::Request;

/// ASCII punctuation, typographic quotes, or a whitespace run.
static TITLE_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[[:punct:]‘’“”]|\s+").expect("title pattern is valid"));

static ARCHIVE_UNSAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[/@:\\]").expect("archive pattern is valid"));

/// `{base}/{organisation}/{YYYY}/{MM}/{sanitized title}`.
pub fn derive_path(base: &Path, request: &Request) -> PathBuf {
    base.join(request.organisation.as_str())
        .join(request.date_released.format("%Y").to_string())
        .join(request.date_released.format("%m").to_string())
        .join(sanitize_title(&request.title))
}

/// Titles that differ only in punctuation or whitespace map to the same name.
pub fn sanitize_title(title: &str) -> String {
    TITLE_UNSAFE.replace_all(title, "_").into_owned()
}

/// Only path-breaking characters are replaced; other punctuation survives.
pub fn sanitize_archive_name(name: &str) -> String {
    ARCHIVE_UNSAFE.replace_all(name, "_").into_owned()
}
