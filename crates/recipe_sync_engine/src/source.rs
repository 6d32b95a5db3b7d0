use recipe_sync_core::SourceRecipeRecord;
use serde_json::Value;
use sync_logging::{sync_debug, sync_info};

use crate::decode::decode_body;
use crate::{FailureKind, FetchError, HttpClient, SyncError};

/// GET the recipe list and decode it into records.
///
/// Non-2xx statuses, bodies that are not a JSON array, and an empty array all
/// fail the pass. Individual elements never fail; malformed ones decode to
/// records without an identifier.
pub async fn fetch_source_records(
    http: &dyn HttpClient,
    endpoint: &str,
) -> Result<Vec<SourceRecipeRecord>, SyncError> {
    sync_info!("Attempting to fetch recipes from: {}", endpoint);
    let response = http.get(endpoint).await?;
    sync_info!("API response status code: {}", response.status);

    if !(200..300).contains(&response.status) {
        return Err(FetchError::new(
            FailureKind::HttpStatus(response.status),
            format!("recipe endpoint returned {}", response.status),
        )
        .into());
    }

    let decoded = decode_body(&response.bytes, response.content_type.as_deref())
        .map_err(|err| SyncError::InvalidPayload(err.to_string()))?;
    sync_debug!(
        "API response body (first 200 chars): {}",
        decoded.text.chars().take(200).collect::<String>()
    );

    let value: Value = serde_json::from_str(&decoded.text)
        .map_err(|err| SyncError::InvalidPayload(format!("invalid JSON: {err}")))?;
    let Value::Array(items) = value else {
        return Err(SyncError::InvalidPayload("expected a JSON array".into()));
    };
    if items.is_empty() {
        return Err(SyncError::InvalidPayload("recipe list is empty".into()));
    }

    sync_info!("Successfully parsed JSON. Found {} recipes", items.len());
    Ok(items.into_iter().map(SourceRecipeRecord::from).collect())
}
