use std::io::{self, Write};

use sync_logging::{sync_info, sync_warn};
use tempfile::NamedTempFile;
use thiserror::Error;
use url::Url;

use crate::filename::image_filename;
use crate::{ContentStore, EntryId, FetchError, HttpClient, MediaId, StoreError};

#[derive(Debug, Error)]
pub enum ImageAttachError {
    #[error("invalid image url {0:?}")]
    InvalidUrl(String),
    #[error("download failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("download returned http status {0}")]
    HttpStatus(u16),
    #[error("download returned an empty body")]
    EmptyBody,
    #[error("temporary file error: {0}")]
    TempFile(#[from] io::Error),
    #[error("media library rejected image: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachResult {
    /// The entry already had a cover image; nothing was fetched.
    AlreadyPresent,
    Attached(MediaId),
}

/// Set the cover image of `entry` from `image_url` unless it already has one.
///
/// Returns `true` when the entry ends up with a cover image. Failures are
/// logged and leave the entry untouched.
pub async fn attach_cover_image(
    store: &dyn ContentStore,
    http: &dyn HttpClient,
    entry: EntryId,
    image_url: &str,
) -> bool {
    match try_attach_cover_image(store, http, entry, image_url).await {
        Ok(AttachResult::AlreadyPresent) => true,
        Ok(AttachResult::Attached(media)) => {
            sync_info!("Attached cover image {} to entry {}", media, entry);
            true
        }
        Err(err) => {
            sync_warn!("Cover image for entry {} not set ({}): {}", entry, image_url, err);
            false
        }
    }
}

pub async fn try_attach_cover_image(
    store: &dyn ContentStore,
    http: &dyn HttpClient,
    entry: EntryId,
    image_url: &str,
) -> Result<AttachResult, ImageAttachError> {
    if store.has_cover_image(entry) {
        return Ok(AttachResult::AlreadyPresent);
    }

    let url = validate_url(image_url)?;
    let response = http.get(url.as_str()).await?;
    if response.status != 200 {
        return Err(ImageAttachError::HttpStatus(response.status));
    }
    if response.bytes.is_empty() {
        return Err(ImageAttachError::EmptyBody);
    }

    let filename = image_filename(url.as_str(), entry);

    // Removed on drop, whichever way this returns.
    let mut tmp = NamedTempFile::new()?;
    tmp.write_all(&response.bytes)?;
    tmp.flush()?;

    let media = store.store_media(tmp.path(), &filename, entry)?;
    store.set_cover_image(entry, media)?;
    Ok(AttachResult::Attached(media))
}

fn validate_url(raw: &str) -> Result<Url, ImageAttachError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|_| ImageAttachError::InvalidUrl(raw.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ImageAttachError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}
