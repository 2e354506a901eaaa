use bamboo_atoms::error::ApiError;
use bamboo_atoms::http::{parse_body, respond};
use bamboo_atoms::photos::{self, ImageVariant, PhotoError};
use bamboo_atoms::properties::{self, PropertyError};
use bamboo_atoms::storage::{original_key, ObjectStore, StorageError};
use bamboo_atoms::store::DocumentStore;
use chrono::{DateTime, Utc};
use lambda_http::{Body, Error as LambdaError, Response};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::data_uri::{self, DataUriError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub property_id: String,
    pub file_name: String,
    #[serde(alias = "imageData")]
    pub image_source: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub property_id: String,
    pub photo_record_id: String,
    pub file_name: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    DataUri(#[from] DataUriError),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::InvalidArgument(msg) => ApiError::InvalidArgument(msg),
            IngestError::DataUri(e) => ApiError::InvalidArgument(e.to_string()),
            IngestError::Property(e) => e.into(),
            IngestError::Photo(e) => e.into(),
            IngestError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// `{recordId}_{stem}{.ext}` from the basename of the client file name.
pub fn image_key(record_id: &str, file_name: &str) -> Result<String, IngestError> {
    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IngestError::InvalidArgument("fileName is required".to_string()))?;
    Ok(match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", record_id, stem, ext),
        None => format!("{}_{}", record_id, stem),
    })
}

/// Store an uploaded original and register its variant on the property's
/// photo record. Thumbnails are produced later by the finalize trigger.
pub async fn ingest(
    store: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    expires_at: DateTime<Utc>,
    request: IngestRequest,
) -> Result<IngestResponse, IngestError> {
    if request.property_id.is_empty() {
        return Err(IngestError::InvalidArgument("propertyId is required".to_string()));
    }
    tracing::info!(
        "📥 Ingesting {} for property {}",
        request.file_name,
        request.property_id
    );

    properties::get_property(store, &request.property_id).await?;
    let record = photos::get_for_property(store, &request.property_id).await?;

    let image = data_uri::parse(&request.image_source)?;
    let key = image_key(&record.id, &request.file_name)?;
    let object_key = original_key(&request.property_id, &key);
    let size = image.bytes.len();

    objects
        .put(&object_key, image.bytes, &image.content_type, true)
        .await?;
    let url = objects.signed_url(&object_key, expires_at).await?;

    photos::append_variant(store, &record.id, &ImageVariant::new(key.clone(), url.clone())).await?;

    tracing::info!(
        "✅ Stored {} ({} bytes, {}) in record {}",
        object_key,
        size,
        image.content_type,
        record.id
    );
    Ok(IngestResponse {
        property_id: request.property_id,
        photo_record_id: record.id,
        file_name: key,
        url,
    })
}

/// HTTP Handler: POST /photos
pub async fn create_photo_handler(
    store: &dyn DocumentStore,
    objects: &dyn ObjectStore,
    expires_at: DateTime<Utc>,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let result = async {
        let request: IngestRequest = parse_body(body)?;
        ingest(store, objects, expires_at, request)
            .await
            .map_err(ApiError::from)
    }
    .await;
    respond(result)
}
