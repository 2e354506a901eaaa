//! Document store boundary.
//!
//! Documents are JSON objects addressed by `(Collection, id)`. Every write
//! bumps a per-document `version`, which is what [`run_transaction`] uses
//! for optimistic read-modify-write.

pub mod attr;
pub mod dynamo;
pub mod memory;

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

pub use dynamo::DynamoDocumentStore;
pub use memory::MemoryDocumentStore;

/// A stored document body (never contains the reserved key attributes).
pub type Document = Map<String, Value>;

/// Attempts made by [`run_transaction`] before giving up on contention.
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Properties,
    Photos,
}

impl Collection {
    /// Partition key value used for the collection in the single table.
    pub fn partition(&self) -> &'static str {
        match self {
            Collection::Properties => "PROPERTY",
            Collection::Photos => "PHOTO",
        }
    }

    pub fn from_partition(pk: &str) -> Option<Self> {
        match pk {
            "PROPERTY" => Some(Collection::Properties),
            "PHOTO" => Some(Collection::Photos),
            _ => None,
        }
    }

    /// Sort key for a document id, e.g. `PHOTO#1234`.
    pub fn sort_key(&self, id: &str) -> String {
        format!("{}#{}", self.partition(), id)
    }

    /// Extract the document id from a sort key of this collection.
    pub fn id_from_sort_key<'a>(&self, sk: &'a str) -> Option<&'a str> {
        sk.strip_prefix(self.partition())?.strip_prefix('#')
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub id: String,
    pub version: u64,
    pub data: Document,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Concurrent write detected on {0}")]
    Conflict(String),

    #[error("Transaction on {0} gave up after {1} attempts")]
    TooManyAttempts(String, u32),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Document store backend error: {0}")]
    Backend(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Snapshot>>;

    /// Insert a new document; `AlreadyExists` if the id is taken.
    async fn create(&self, collection: Collection, id: &str, data: Document) -> StoreResult<()>;

    /// Set the given top-level fields, leaving the others untouched.
    /// Creates the document when it does not exist yet.
    async fn merge(&self, collection: Collection, id: &str, fields: Document) -> StoreResult<()>;

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()>;

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Snapshot>>;

    /// All documents whose top-level `field` equals `value`.
    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Snapshot>>;

    /// Atomically append `elements` to the array at `field`.
    /// `NotFound` if the document does not exist.
    async fn array_append(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        elements: Vec<Value>,
    ) -> StoreResult<()>;

    /// Replace the whole document iff its version is still `expected_version`.
    async fn compare_and_swap(
        &self,
        collection: Collection,
        id: &str,
        expected_version: u64,
        data: Document,
    ) -> StoreResult<()>;
}

/// Read-modify-write a document with optimistic concurrency.
///
/// `mutate` may run several times, always against the latest snapshot.
/// Returns the document as written.
pub async fn run_transaction<F, E>(
    store: &dyn DocumentStore,
    collection: Collection,
    id: &str,
    mut mutate: F,
) -> Result<Document, E>
where
    F: FnMut(&mut Document) -> Result<(), E> + Send,
    E: From<StoreError>,
{
    let doc_ref = collection.sort_key(id);
    let mut attempts = 0;
    loop {
        attempts += 1;
        let snapshot = store
            .get(collection, id)
            .await?
            .ok_or_else(|| StoreError::NotFound(doc_ref.clone()))?;

        let mut data = snapshot.data;
        mutate(&mut data)?;

        match store
            .compare_and_swap(collection, id, snapshot.version, data.clone())
            .await
        {
            Ok(()) => return Ok(data),
            Err(StoreError::Conflict(_)) if attempts < MAX_TRANSACTION_ATTEMPTS => {
                tracing::debug!(
                    "Transaction conflict on {} (attempt {}), retrying",
                    doc_ref,
                    attempts
                );
                sleep(Duration::from_millis(25 * attempts as u64)).await;
            }
            Err(StoreError::Conflict(_)) => {
                return Err(StoreError::TooManyAttempts(doc_ref, attempts).into())
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Generate a new document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
