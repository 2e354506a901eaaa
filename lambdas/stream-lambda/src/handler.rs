use aws_lambda_events::event::dynamodb::{Event, EventRecord};
use bamboo_atoms::properties::{handle_property_created, handle_property_removed};
use bamboo_atoms::storage::ObjectStore;
use bamboo_atoms::store::{Collection, DocumentStore};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Removed,
}

/// String value of a key attribute (`{"S": "..."}`) of a stream record.
fn string_key(keys: &Value, name: &str) -> Option<String> {
    keys.get(name)?.get("S")?.as_str().map(str::to_string)
}

/// `(event, property id)` when the record is a property insert or removal.
pub fn property_change(record: &EventRecord) -> Option<(Lifecycle, String)> {
    let lifecycle = match record.event_name.as_str() {
        "INSERT" => Lifecycle::Created,
        "REMOVE" => Lifecycle::Removed,
        _ => return None,
    };
    let keys = serde_json::to_value(&record.change.keys).ok()?;
    if Collection::from_partition(&string_key(&keys, "PK")?) != Some(Collection::Properties) {
        return None;
    }
    let sort_key = string_key(&keys, "SK")?;
    let id = Collection::Properties.id_from_sort_key(&sort_key)?;
    Some((lifecycle, id.to_string()))
}

/// Apply property lifecycle side effects. Errors are logged, never returned.
pub async fn handle_stream_event(
    store: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    event: Event,
) -> usize {
    let mut handled = 0;
    for record in &event.records {
        let Some((lifecycle, property_id)) = property_change(record) else {
            continue;
        };
        let property_id = property_id.as_str();
        tracing::info!("📥 Property {} {:?}", property_id, lifecycle);

        let result = match lifecycle {
            Lifecycle::Created => handle_property_created(store, property_id).await,
            Lifecycle::Removed => handle_property_removed(store, objects, property_id)
                .await
                .map(|_| ()),
        };
        match result {
            Ok(()) => handled += 1,
            Err(e) => tracing::error!("❌ {:?} trigger failed for {}: {}", lifecycle, property_id, e),
        }
    }
    handled
}
