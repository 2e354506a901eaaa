use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{Collection, Document, DocumentStore, Snapshot, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    data: Document,
}

/// In-process document store with the same version semantics as the
/// DynamoDB backend. Used by tests and local runs.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<Collection, BTreeMap<String, Entry>>>,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful write operations so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Bump a document's version without changing its body, simulating a
    /// concurrent writer.
    pub fn force_version_bump(&self, collection: Collection, id: &str) {
        let mut guard = self.lock();
        if let Some(entry) = guard.entry(collection).or_default().get_mut(id) {
            entry.version += 1;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Collection, BTreeMap<String, Entry>>> {
        // A poisoned lock only means another test thread panicked mid-write.
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshots(entries: &BTreeMap<String, Entry>) -> impl Iterator<Item = Snapshot> + '_ {
        entries.iter().map(|(id, entry)| Snapshot {
            id: id.clone(),
            version: entry.version,
            data: entry.data.clone(),
        })
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Snapshot>> {
        let guard = self.lock();
        Ok(guard
            .get(&collection)
            .and_then(|entries| entries.get(id))
            .map(|entry| Snapshot {
                id: id.to_string(),
                version: entry.version,
                data: entry.data.clone(),
            }))
    }

    async fn create(&self, collection: Collection, id: &str, data: Document) -> StoreResult<()> {
        let mut guard = self.lock();
        let entries = guard.entry(collection).or_default();
        if entries.contains_key(id) {
            return Err(StoreError::AlreadyExists(collection.sort_key(id)));
        }
        entries.insert(id.to_string(), Entry { version: 0, data });
        self.record_write();
        Ok(())
    }

    async fn merge(&self, collection: Collection, id: &str, fields: Document) -> StoreResult<()> {
        let mut guard = self.lock();
        let entry = guard
            .entry(collection)
            .or_default()
            .entry(id.to_string())
            .or_insert_with(|| Entry {
                version: 0,
                data: Document::new(),
            });
        entry.data.extend(fields);
        entry.version += 1;
        self.record_write();
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let mut guard = self.lock();
        if let Some(entries) = guard.get_mut(&collection) {
            entries.remove(id);
        }
        self.record_write();
        Ok(())
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Snapshot>> {
        let guard = self.lock();
        Ok(guard
            .get(&collection)
            .map(|entries| Self::snapshots(entries).collect())
            .unwrap_or_default())
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Snapshot>> {
        let guard = self.lock();
        Ok(guard
            .get(&collection)
            .map(|entries| {
                Self::snapshots(entries)
                    .filter(|s| s.data.get(field) == Some(value))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn array_append(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        elements: Vec<Value>,
    ) -> StoreResult<()> {
        let mut guard = self.lock();
        let entry = guard
            .get_mut(&collection)
            .and_then(|entries| entries.get_mut(id))
            .ok_or_else(|| StoreError::NotFound(collection.sort_key(id)))?;

        match entry
            .data
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(vec![]))
        {
            Value::Array(items) => items.extend(elements),
            _ => {
                return Err(StoreError::Serialization(format!(
                    "Field {} is not an array",
                    field
                )))
            }
        }
        entry.version += 1;
        self.record_write();
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        collection: Collection,
        id: &str,
        expected_version: u64,
        data: Document,
    ) -> StoreResult<()> {
        let mut guard = self.lock();
        let entry = guard
            .get_mut(&collection)
            .and_then(|entries| entries.get_mut(id))
            .ok_or_else(|| StoreError::Conflict(collection.sort_key(id)))?;

        if entry.version != expected_version {
            return Err(StoreError::Conflict(collection.sort_key(id)));
        }
        entry.data = data;
        entry.version += 1;
        self.record_write();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn create_rejects_duplicate_ids() {
        let store = MemoryDocumentStore::new();
        store
            .create(Collection::Photos, "r1", doc(json!({"propertyId": "p1"})))
            .await
            .unwrap();
        let again = store
            .create(Collection::Photos, "r1", doc(json!({"propertyId": "p2"})))
            .await;
        assert!(matches!(again, Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn array_append_bumps_version_and_keeps_order() {
        let store = MemoryDocumentStore::new();
        store
            .create(Collection::Photos, "r1", doc(json!({"images": []})))
            .await
            .unwrap();
        store
            .array_append(Collection::Photos, "r1", "images", vec![json!("a")])
            .await
            .unwrap();
        store
            .array_append(Collection::Photos, "r1", "images", vec![json!("b")])
            .await
            .unwrap();

        let snap = store.get(Collection::Photos, "r1").await.unwrap().unwrap();
        assert_eq!(snap.version, 2);
        assert_eq!(snap.data.get("images"), Some(&json!(["a", "b"])));
    }

    #[tokio::test]
    async fn array_append_on_missing_document_fails() {
        let store = MemoryDocumentStore::new();
        let result = store
            .array_append(Collection::Photos, "missing", "images", vec![json!(1)])
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn compare_and_swap_detects_stale_version() {
        let store = MemoryDocumentStore::new();
        store
            .create(Collection::Properties, "p1", doc(json!({"price": 1})))
            .await
            .unwrap();
        store
            .merge(Collection::Properties, "p1", doc(json!({"price": 2})))
            .await
            .unwrap();

        let stale = store
            .compare_and_swap(Collection::Properties, "p1", 0, doc(json!({"price": 3})))
            .await;
        assert!(matches!(stale, Err(StoreError::Conflict(_))));

        store
            .compare_and_swap(Collection::Properties, "p1", 1, doc(json!({"price": 3})))
            .await
            .unwrap();
        let snap = store.get(Collection::Properties, "p1").await.unwrap().unwrap();
        assert_eq!(snap.data.get("price"), Some(&json!(3)));
    }

    #[tokio::test]
    async fn find_by_field_matches_equal_values_only() {
        let store = MemoryDocumentStore::new();
        for (id, pid) in [("r1", "p1"), ("r2", "p2"), ("r3", "p1")] {
            store
                .create(Collection::Photos, id, doc(json!({"propertyId": pid})))
                .await
                .unwrap();
        }
        let found = store
            .find_by_field(Collection::Photos, "propertyId", &json!("p1"))
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["r1", "r3"]);
    }
}
