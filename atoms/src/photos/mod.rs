// Re-export model types and service functions
pub mod http;
pub mod model;
pub mod service;

pub use model::{ImageVariant, PhotoRecord, Thumbnail, ThumbnailSize};
pub use service::*;

use crate::storage::StorageError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("Photo record not found: {0}")]
    RecordNotFound(String),

    #[error("Broken relationship between photos and properties")]
    BrokenRelationship { property_id: String, count: usize },

    #[error("Image {name} not found in photo record {record_id}")]
    VariantNotFound { record_id: String, name: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type PhotoResult<T> = Result<T, PhotoError>;
