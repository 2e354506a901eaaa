use lambda_http::{Body, Error as LambdaError, Response};

use super::service::{get_for_property, get_photo_record};
use crate::error::ApiError;
use crate::http::respond;
use crate::store::DocumentStore;

/// HTTP Handler: GET /photos?propertyId={id}
pub async fn get_property_photos_handler(
    store: &dyn DocumentStore,
    property_id: Option<&str>,
) -> Result<Response<Body>, LambdaError> {
    let result = match property_id.filter(|id| !id.is_empty()) {
        Some(id) => get_for_property(store, id).await.map_err(ApiError::from),
        None => Err(ApiError::InvalidArgument("propertyId is required".to_string())),
    };
    respond(result)
}

/// HTTP Handler: GET /photos/{id}
pub async fn get_photo_record_handler(
    store: &dyn DocumentStore,
    record_id: &str,
) -> Result<Response<Body>, LambdaError> {
    respond(get_photo_record(store, record_id).await.map_err(ApiError::from))
}
