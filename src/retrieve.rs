//! Document retrieval: download, fingerprint, write to the request directory.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Component, Path};
use tracing::{error, info};

use crate::contract::Fetcher;
use crate::error::RetrievalError;
use crate::request::DocumentMeta;

/// Hex SHA-256 of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// A filename must be exactly one plain path component, so it cannot climb
/// out of or replace the request directory.
fn check_filename(filename: &str) -> Result<(), RetrievalError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) if name == filename => Ok(()),
        _ => {
            error!(filename = %filename, "Refusing unsafe document filename");
            Err(RetrievalError::UnsafeFilename {
                filename: filename.to_string(),
            })
        }
    }
}

/// Retrieve every document in order, filling in `size` and `content_hash`
/// and writing the bytes to `directory/filename`.
///
/// Every filename is checked before anything is fetched or written. The first
/// failure aborts the remaining downloads. Files with the same name overwrite
/// each other.
pub async fn retrieve_all(
    fetcher: &dyn Fetcher,
    directory: &Path,
    documents: &mut [DocumentMeta],
) -> Result<(), RetrievalError> {
    for meta in documents.iter() {
        check_filename(&meta.filename)?;
    }
    fs::create_dir_all(directory).map_err(|source| RetrievalError::Io {
        path: directory.to_path_buf(),
        source,
    })?;

    for meta in documents.iter_mut() {
        info!(url = %meta.original_url, "Downloading document");
        let bytes = fetcher
            .fetch_bytes(&meta.original_url)
            .await
            .map_err(|source| RetrievalError::Fetch {
                url: meta.original_url.clone(),
                source,
            })?;

        let hash = content_hash(&bytes);
        let path = directory.join(&meta.filename);
        fs::write(&path, &bytes).map_err(|source| RetrievalError::Io {
            path: path.clone(),
            source,
        })?;

        meta.size = Some(bytes.len() as u64);
        meta.content_hash = Some(hash);
        info!(
            path = %path.display(),
            sha256 = meta.content_hash.as_deref().unwrap_or_default(),
            "Downloaded document"
        );
    }
    Ok(())
}
