use std::sync::Arc;

use recipe_sync_core::{map, ExternalId, MappedRecipeMetadata, SourceRecipeRecord};
use serde_json::{json, Value};
use sync_logging::{sync_debug, sync_error, sync_info, sync_warn};

use crate::content::entry_fields;
use crate::image::attach_cover_image;
use crate::{ContentStore, EntryId, EntryQuery, HttpClient, SyncOutcome};

/// Metadata keys written on every synced entry.
pub mod meta_keys {
    /// Full structured recipe consumed by the recipe plugin.
    pub const RECIPE_METADATA: &str = "delicious_recipes_metadata";
    pub const DIFFICULTY: &str = "_dr_difficulty_level";
    pub const SEASON: &str = "_dr_best_season";
    pub const WIDGETS_ACTIVE: &str = "_dr_widgets_active";
    pub const INGREDIENT_COUNT: &str = "_dr_ingredient_count";
    pub const INGREDIENT_NAMES: &str = "_dr_recipe_ingredients";
    pub const EXTERNAL_ID: &str = "fr_recipe_id";
    pub const EXTERNAL_UPDATED_AT: &str = "fr_recipe_updated_at";
}

/// Produces timestamps for newly created entries.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

/// Whether a local entry stamped `stored` must be rewritten for an upstream
/// record stamped `incoming`. Stamps compare as plain strings; a missing stamp
/// on either side forces the write.
pub fn needs_update(stored: &str, incoming: &str) -> bool {
    stored.is_empty() || incoming.is_empty() || incoming > stored
}

pub struct Reconciler {
    store: Arc<dyn ContentStore>,
    http: Arc<dyn HttpClient>,
    clock: Clock,
}

impl Reconciler {
    pub fn new(store: Arc<dyn ContentStore>, http: Arc<dyn HttpClient>, clock: Clock) -> Self {
        Self { store, http, clock }
    }

    /// Bring the local entry for `record` up to date.
    ///
    /// Store rejections are reported as [`SyncOutcome::Errored`]; image
    /// problems never change the outcome.
    pub async fn reconcile(&self, record: &SourceRecipeRecord) -> SyncOutcome {
        let Some(external_id) = record.id.as_ref() else {
            sync_debug!("Skipping recipe without ID");
            return SyncOutcome::Discarded;
        };
        sync_info!(
            "Processing recipe ID: {}, Title: {}",
            external_id,
            record.title().unwrap_or("Unknown")
        );

        let existing = match self.store.find_entry(&EntryQuery::by_external_id(external_id)) {
            Ok(existing) => existing,
            Err(err) => {
                sync_error!("Lookup for recipe {} failed: {}", external_id, err);
                return SyncOutcome::Errored;
            }
        };

        let metadata = map(record);
        let fields = entry_fields(record);

        let (entry, outcome) = match existing {
            None => {
                sync_info!("Creating new recipe for ID: {}", external_id);
                match self.store.create_entry(&fields, &(self.clock)()) {
                    Ok(entry) => {
                        sync_info!("New recipe created successfully with ID: {}", entry);
                        (entry, SyncOutcome::Created)
                    }
                    Err(err) => {
                        sync_error!("Error creating entry for recipe {}: {}", external_id, err);
                        return SyncOutcome::Errored;
                    }
                }
            }
            Some(entry) => {
                let stored = self.stored_updated_at(entry);
                if !needs_update(&stored, record.updated_at()) {
                    sync_info!("Recipe {} is up to date, skipping update", external_id);
                    return SyncOutcome::Skipped;
                }
                sync_info!("Updating existing recipe ID: {}", entry);
                if let Err(err) = self.store.update_entry(entry, &fields) {
                    sync_error!("Error updating entry {}: {}", entry, err);
                    return SyncOutcome::Errored;
                }
                (entry, SyncOutcome::Updated)
            }
        };

        write_recipe_meta(
            self.store.as_ref(),
            entry,
            &metadata,
            external_id,
            record.updated_at(),
        );

        if let Some(image_url) = record.image_url() {
            attach_cover_image(self.store.as_ref(), self.http.as_ref(), entry, image_url).await;
        }

        outcome
    }

    fn stored_updated_at(&self, entry: EntryId) -> String {
        match self.store.get_meta(entry, meta_keys::EXTERNAL_UPDATED_AT) {
            Some(Value::String(s)) => s,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }
}

/// Write the metadata blob, the derived helper fields and the sync fields.
///
/// The upstream stamp is only written when present so an older non-empty
/// stamp is never blanked. Individual write failures are logged and the
/// remaining fields are still attempted.
pub fn write_recipe_meta(
    store: &dyn ContentStore,
    entry: EntryId,
    metadata: &MappedRecipeMetadata,
    external_id: &ExternalId,
    updated_at: &str,
) {
    let blob = match serde_json::to_value(metadata) {
        Ok(blob) => Some(blob),
        Err(err) => {
            sync_error!("Could not serialize recipe metadata for entry {}: {}", entry, err);
            None
        }
    };

    let mut fields: Vec<(&str, Value)> = Vec::with_capacity(8);
    if let Some(blob) = blob {
        fields.push((meta_keys::RECIPE_METADATA, blob));
    }
    fields.push((meta_keys::DIFFICULTY, json!(metadata.difficulty_level)));
    fields.push((meta_keys::SEASON, json!(metadata.best_season)));
    fields.push((meta_keys::WIDGETS_ACTIVE, json!("yes")));
    fields.push((meta_keys::INGREDIENT_COUNT, json!(metadata.ingredient_count())));
    fields.push((meta_keys::INGREDIENT_NAMES, json!(metadata.ingredient_names())));
    fields.push((meta_keys::EXTERNAL_ID, json!(external_id.as_str())));
    if !updated_at.is_empty() {
        fields.push((meta_keys::EXTERNAL_UPDATED_AT, json!(updated_at)));
    }

    for (key, value) in fields {
        if let Err(err) = store.set_meta(entry, key, value) {
            sync_warn!("Could not write {} on entry {}: {}", key, entry, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::needs_update;

    #[test]
    fn newer_stamp_updates() {
        assert!(needs_update("2024-01-01", "2024-02-01"));
        assert!(needs_update("2024-01-01T10:00:00Z", "2024-01-01T10:00:01Z"));
    }

    #[test]
    fn equal_or_older_stamp_skips() {
        assert!(!needs_update("2024-01-01", "2024-01-01"));
        assert!(!needs_update("2024-01-01", "2023-01-01"));
    }

    #[test]
    fn missing_stamp_forces_update() {
        assert!(needs_update("", "2023-01-01"));
        assert!(needs_update("2024-01-01", ""));
    }
}
