//! Object storage boundary
//!
//! Keys are property-scoped: `{property_id}/{image_key}` for originals and
//! `{property_id}/thumb_{size}_{image_key}` for thumbnails.

pub mod memory;
pub mod s3;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Filename marker carried by every generated thumbnail.
pub const THUMBNAIL_PREFIX: &str = "thumb_";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Signed URL failed: {0}")]
    Presign(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Name of the bucket this store writes to.
    fn bucket(&self) -> &str;

    /// Write an object. Resolves only once the object is fully stored.
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        public: bool,
    ) -> StorageResult<()>;

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    async fn content_type(&self, key: &str) -> StorageResult<Option<String>>;

    /// Delete every object under `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<usize>;

    /// Time-limited read URL valid until `expires_at`.
    async fn signed_url(&self, key: &str, expires_at: DateTime<Utc>) -> StorageResult<String>;
}

/// Key of an original upload.
pub fn original_key(property_id: &str, image_key: &str) -> String {
    format!("{}/{}", property_id, image_key)
}

/// Directory portion of a key (`""` for top-level objects).
pub fn key_dir(key: &str) -> &str {
    key.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Filename portion of a key.
pub fn key_basename(key: &str) -> &str {
    key.rsplit_once('/').map(|(_, name)| name).unwrap_or(key)
}

/// Thumbnail file name for a given original file name.
pub fn thumbnail_name(size: u32, file_name: &str) -> String {
    format!("{}{}_{}", THUMBNAIL_PREFIX, size, file_name)
}

/// Key of a thumbnail stored next to its original.
pub fn thumbnail_key(dir: &str, size: u32, file_name: &str) -> String {
    let name = thumbnail_name(size, file_name);
    if dir.is_empty() {
        name
    } else {
        format!("{}/{}", dir, name)
    }
}

pub fn is_thumbnail(file_name: &str) -> bool {
    file_name.starts_with(THUMBNAIL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thumbnail_keys_sit_beside_the_original() {
        let original = original_key("prop-1", "rec-1_house.png");
        assert_eq!(original, "prop-1/rec-1_house.png");
        assert_eq!(key_dir(&original), "prop-1");
        assert_eq!(key_basename(&original), "rec-1_house.png");
        assert_eq!(
            thumbnail_key(key_dir(&original), 256, key_basename(&original)),
            "prop-1/thumb_256_rec-1_house.png"
        );
    }

    #[test]
    fn top_level_keys_have_no_dir() {
        assert_eq!(key_dir("loose.png"), "");
        assert_eq!(key_basename("loose.png"), "loose.png");
        assert_eq!(thumbnail_key("", 128, "loose.png"), "thumb_128_loose.png");
    }

    #[test]
    fn thumbnail_marker_is_detected() {
        assert!(is_thumbnail("thumb_512_rec_a.jpg"));
        assert!(!is_thumbnail("rec_thumb_a.jpg"));
    }
}
