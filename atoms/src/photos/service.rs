use serde_json::{json, Value};

use super::model::{ImageVariant, PhotoRecord, Thumbnail, ThumbnailSize};
use super::{PhotoError, PhotoResult};
use crate::storage::ObjectStore;
use crate::store::{new_id, run_transaction, Collection, DocumentStore, StoreError};

/// Create the empty photo record that belongs to a new property.
pub async fn create_for_property(
    store: &dyn DocumentStore,
    property_id: &str,
) -> PhotoResult<PhotoRecord> {
    let record = PhotoRecord::new(new_id(), property_id);
    store
        .create(Collection::Photos, &record.id, record.to_document()?)
        .await?;
    tracing::info!("✅ Photo record {} created for property {}", record.id, property_id);
    Ok(record)
}

/// All photo records pointing at a property. Callers check the cardinality.
pub async fn find_by_property(
    store: &dyn DocumentStore,
    property_id: &str,
) -> PhotoResult<Vec<PhotoRecord>> {
    let snapshots = store
        .find_by_field(Collection::Photos, "propertyId", &json!(property_id))
        .await?;
    snapshots
        .into_iter()
        .map(|s| PhotoRecord::from_snapshot(s).map_err(PhotoError::from))
        .collect()
}

pub async fn get_photo_record(store: &dyn DocumentStore, record_id: &str) -> PhotoResult<PhotoRecord> {
    match store.get(Collection::Photos, record_id).await? {
        Some(snapshot) => Ok(PhotoRecord::from_snapshot(snapshot)?),
        None => Err(PhotoError::RecordNotFound(record_id.to_string())),
    }
}

/// The single photo record of a property. Zero or several is a broken relationship.
pub async fn get_for_property(
    store: &dyn DocumentStore,
    property_id: &str,
) -> PhotoResult<PhotoRecord> {
    let mut records = find_by_property(store, property_id).await?;
    if records.len() != 1 {
        tracing::error!(
            "❌ Property {} has {} photo records, expected exactly one",
            property_id,
            records.len()
        );
        return Err(PhotoError::BrokenRelationship {
            property_id: property_id.to_string(),
            count: records.len(),
        });
    }
    Ok(records.remove(0))
}

/// Atomically append a variant to a record's image list.
pub async fn append_variant(
    store: &dyn DocumentStore,
    record_id: &str,
    variant: &ImageVariant,
) -> PhotoResult<()> {
    let element = serde_json::to_value(variant).map_err(StoreError::from)?;
    match store
        .array_append(Collection::Photos, record_id, "images", vec![element])
        .await
    {
        Ok(()) => Ok(()),
        Err(StoreError::NotFound(_)) => Err(PhotoError::RecordNotFound(record_id.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Set one thumbnail field of the variant named `variant_name`.
///
/// Runs as a transaction over the raw stored elements, so every other
/// element and every other field is written back exactly as read.
pub async fn patch_thumbnail(
    store: &dyn DocumentStore,
    record_id: &str,
    variant_name: &str,
    size: ThumbnailSize,
    thumbnail: &Thumbnail,
) -> PhotoResult<()> {
    let patch = serde_json::to_value(thumbnail).map_err(StoreError::from)?;

    let result = run_transaction(store, Collection::Photos, record_id, |doc| {
        let element = doc
            .get_mut("images")
            .and_then(Value::as_array_mut)
            .and_then(|images| {
                images
                    .iter_mut()
                    .find(|img| img.get("name").and_then(Value::as_str) == Some(variant_name))
            })
            .and_then(Value::as_object_mut)
            .ok_or_else(|| PhotoError::VariantNotFound {
                record_id: record_id.to_string(),
                name: variant_name.to_string(),
            })?;
        element.insert(size.field().to_string(), patch.clone());
        Ok(())
    })
    .await;

    match result {
        Ok(_) => {
            tracing::info!(
                "✅ {} of {} in record {} set to {}",
                size.field(),
                variant_name,
                record_id,
                thumbnail.name
            );
            Ok(())
        }
        Err(PhotoError::Store(StoreError::NotFound(_))) => {
            Err(PhotoError::RecordNotFound(record_id.to_string()))
        }
        Err(e) => Err(e),
    }
}

/// Remove a property's images and photo records. Returns the records removed.
///
/// Objects go first so a failed purge leaves the records to retry against.
pub async fn delete_for_property(
    store: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    property_id: &str,
) -> PhotoResult<usize> {
    let records = find_by_property(store, property_id).await?;
    if records.is_empty() {
        tracing::info!("No photo records for property {}, nothing to delete", property_id);
        return Ok(0);
    }

    let removed = objects.delete_prefix(&format!("{}/", property_id)).await?;
    tracing::info!("Deleted {} objects for property {}", removed, property_id);

    for record in &records {
        store.delete(Collection::Photos, &record.id).await?;
    }
    tracing::info!("✅ Deleted {} photo records for property {}", records.len(), property_id);
    Ok(records.len())
}
