use chrono::Utc;
use serde_json::{json, Value};

use super::model::{Property, RawProperty};
use super::{PropertyError, PropertyResult};
use crate::photos;
use crate::storage::ObjectStore;
use crate::store::{new_id, run_transaction, Collection, Document, DocumentStore};

/// Store a new property under a fresh id.
pub async fn create_property(store: &dyn DocumentStore, raw: RawProperty) -> PropertyResult<Property> {
    let property = Property::create(new_id(), raw, Utc::now());
    store
        .create(Collection::Properties, &property.id, property.to_document()?)
        .await?;
    tracing::info!("✅ Property {} created", property.id);
    Ok(property)
}

pub async fn get_property(store: &dyn DocumentStore, property_id: &str) -> PropertyResult<Property> {
    match store.get(Collection::Properties, property_id).await? {
        Some(snapshot) => Ok(Property::from_snapshot(snapshot)?),
        None => Err(PropertyError::NotFound(property_id.to_string())),
    }
}

/// General update: merge `raw` into the stored property.
pub async fn update_property(
    store: &dyn DocumentStore,
    property_id: &str,
    raw: RawProperty,
) -> PropertyResult<Property> {
    let written = run_transaction(store, Collection::Properties, property_id, |doc| {
        let current = Property::from_document(property_id, doc.clone())?;
        let merged = current.merge(&raw, Utc::now());
        *doc = merged.to_document()?;
        Ok::<(), PropertyError>(())
    })
    .await?;
    tracing::info!("✅ Property {} updated", property_id);
    Ok(Property::from_document(property_id, written)?)
}

pub async fn delete_property(store: &dyn DocumentStore, property_id: &str) -> PropertyResult<()> {
    if store.get(Collection::Properties, property_id).await?.is_none() {
        return Err(PropertyError::NotFound(property_id.to_string()));
    }
    store.delete(Collection::Properties, property_id).await?;
    tracing::info!("✅ Property {} deleted", property_id);
    Ok(())
}

/// Set top-level fields of an existing property and stamp `updatedAt`.
async fn set_fields(
    store: &dyn DocumentStore,
    property_id: &str,
    fields: Document,
) -> PropertyResult<()> {
    let now = json!(Utc::now());
    run_transaction(store, Collection::Properties, property_id, |doc| {
        for (key, value) in &fields {
            doc.insert(key.clone(), value.clone());
        }
        doc.insert("updatedAt".into(), now.clone());
        Ok::<(), PropertyError>(())
    })
    .await?;
    Ok(())
}

pub async fn update_price(store: &dyn DocumentStore, property_id: &str, price: f64) -> PropertyResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(PropertyError::InvalidArgument("Incorrect data".to_string()));
    }
    let mut fields = Document::new();
    fields.insert("price".into(), json!(price));
    set_fields(store, property_id, fields).await?;
    tracing::info!("✅ Property {} price set to {}", property_id, price);
    Ok(())
}

pub async fn set_availability(
    store: &dyn DocumentStore,
    property_id: &str,
    available: bool,
) -> PropertyResult<()> {
    let mut fields = Document::new();
    fields.insert("isAvailable".into(), Value::Bool(available));
    set_fields(store, property_id, fields).await?;
    tracing::info!("✅ Property {} availability set to {}", property_id, available);
    Ok(())
}

pub async fn set_visibility(
    store: &dyn DocumentStore,
    property_id: &str,
    visible: bool,
) -> PropertyResult<()> {
    let mut fields = Document::new();
    fields.insert("isVisible".into(), Value::Bool(visible));
    set_fields(store, property_id, fields).await?;
    tracing::info!("✅ Property {} visibility set to {}", property_id, visible);
    Ok(())
}

async fn increment(store: &dyn DocumentStore, property_id: &str, field: &str) -> PropertyResult<u64> {
    let written = run_transaction(store, Collection::Properties, property_id, |doc| {
        let current = doc.get(field).and_then(Value::as_u64).unwrap_or(0);
        doc.insert(field.to_string(), json!(current + 1));
        Ok::<(), PropertyError>(())
    })
    .await?;
    Ok(written.get(field).and_then(Value::as_u64).unwrap_or(0))
}

/// One more interested client. Returns the new count.
pub async fn add_interest(store: &dyn DocumentStore, property_id: &str) -> PropertyResult<u64> {
    let count = increment(store, property_id, "interested").await?;
    tracing::info!("✅ Property {} interested = {}", property_id, count);
    Ok(count)
}

/// One more visit. Returns the new count.
pub async fn add_visit(store: &dyn DocumentStore, property_id: &str) -> PropertyResult<u64> {
    let count = increment(store, property_id, "visits").await?;
    tracing::info!("✅ Property {} visits = {}", property_id, count);
    Ok(count)
}

fn by_price_desc(properties: &mut [Property]) {
    properties.sort_by(|a, b| b.price.total_cmp(&a.price));
}

/// Every property, most expensive first.
pub async fn list_all(store: &dyn DocumentStore) -> PropertyResult<Vec<Property>> {
    let mut properties = store
        .list(Collection::Properties)
        .await?
        .into_iter()
        .map(Property::from_snapshot)
        .collect::<Result<Vec<_>, _>>()?;
    by_price_desc(&mut properties);
    Ok(properties)
}

/// Available and visible properties, most expensive first.
pub async fn list_listed(store: &dyn DocumentStore) -> PropertyResult<Vec<Property>> {
    let mut properties = list_all(store).await?;
    properties.retain(Property::is_listed);
    Ok(properties)
}

/// A single property as the public listing sees it.
pub async fn get_listed(store: &dyn DocumentStore, property_id: &str) -> PropertyResult<Property> {
    let property = get_property(store, property_id).await?;
    if !property.is_listed() {
        return Err(PropertyError::NotAvailable(property_id.to_string()));
    }
    Ok(property)
}

/// Lifecycle: a property was inserted. Start it unlisted and give it its
/// photo record. Replays of the same insert are no-ops once the record
/// exists.
pub async fn handle_property_created(store: &dyn DocumentStore, property_id: &str) -> PropertyResult<()> {
    get_property(store, property_id).await?;

    let existing = photos::find_by_property(store, property_id).await?;
    if !existing.is_empty() {
        tracing::info!(
            "Property {} already has {} photo record(s), skipping initialisation",
            property_id,
            existing.len()
        );
        return Ok(());
    }

    let now = json!(Utc::now());
    run_transaction(store, Collection::Properties, property_id, |doc| {
        doc.insert("isAvailable".into(), Value::Bool(false));
        doc.insert("isVisible".into(), Value::Bool(false));
        doc.insert("createdAt".into(), now.clone());
        Ok::<(), PropertyError>(())
    })
    .await?;

    let record = photos::create_for_property(store, property_id).await?;
    tracing::info!("✅ Property {} initialised with photo record {}", property_id, record.id);
    Ok(())
}

/// Lifecycle: a property was removed. Purge its images and photo records.
pub async fn handle_property_removed(
    store: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    property_id: &str,
) -> PropertyResult<usize> {
    Ok(photos::delete_for_property(store, objects, property_id).await?)
}
