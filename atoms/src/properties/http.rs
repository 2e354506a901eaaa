use lambda_http::{Body, Error as LambdaError, Response};

use super::model::{
    AvailabilityPayload, PricePayload, PropertyPayload, VisibilityPayload, WriteResult,
};
use super::service::{
    add_interest, add_visit, create_property, delete_property, set_availability, set_visibility,
    update_price, update_property,
};
use crate::error::ApiError;
use crate::http::{parse_body, respond};
use crate::store::DocumentStore;

/// HTTP Handler: POST /properties
pub async fn create_property_handler(
    store: &dyn DocumentStore,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let result = async {
        let payload: PropertyPayload = parse_body(body)?;
        let property = create_property(store, payload.data).await?;
        Ok::<_, ApiError>(WriteResult::now(property))
    }
    .await;
    respond(result)
}

/// HTTP Handler: PUT /properties/{id}
pub async fn update_property_handler(
    store: &dyn DocumentStore,
    property_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let result = async {
        let payload: PropertyPayload = parse_body(body)?;
        let property = update_property(store, property_id, payload.data).await?;
        Ok::<_, ApiError>(WriteResult::now(property))
    }
    .await;
    respond(result)
}

/// HTTP Handler: DELETE /properties/{id}
pub async fn delete_property_handler(
    store: &dyn DocumentStore,
    property_id: &str,
) -> Result<Response<Body>, LambdaError> {
    let result = delete_property(store, property_id)
        .await
        .map(|_| WriteResult::now(property_id.to_string()))
        .map_err(ApiError::from);
    respond(result)
}

/// HTTP Handler: PUT /properties/{id}/price
pub async fn update_price_handler(
    store: &dyn DocumentStore,
    property_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let result = async {
        let payload: PricePayload = parse_body(body)?;
        update_price(store, property_id, payload.price).await?;
        Ok::<_, ApiError>(WriteResult::now(property_id.to_string()))
    }
    .await;
    respond(result)
}

/// HTTP Handler: PUT /properties/{id}/availability
pub async fn update_availability_handler(
    store: &dyn DocumentStore,
    property_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let result = async {
        let payload: AvailabilityPayload = parse_body(body)?;
        set_availability(store, property_id, payload.available).await?;
        Ok::<_, ApiError>(WriteResult::now(property_id.to_string()))
    }
    .await;
    respond(result)
}

/// HTTP Handler: PUT /properties/{id}/visibility
pub async fn update_visibility_handler(
    store: &dyn DocumentStore,
    property_id: &str,
    body: &[u8],
) -> Result<Response<Body>, LambdaError> {
    let result = async {
        let payload: VisibilityPayload = parse_body(body)?;
        set_visibility(store, property_id, payload.visible).await?;
        Ok::<_, ApiError>(WriteResult::now(property_id.to_string()))
    }
    .await;
    respond(result)
}

/// HTTP Handler: PUT /properties/{id}/interest
pub async fn add_interest_handler(
    store: &dyn DocumentStore,
    property_id: &str,
) -> Result<Response<Body>, LambdaError> {
    let result = add_interest(store, property_id)
        .await
        .map(|_| WriteResult::now(property_id.to_string()))
        .map_err(ApiError::from);
    respond(result)
}

/// HTTP Handler: PUT /properties/{id}/visits
pub async fn add_visit_handler(
    store: &dyn DocumentStore,
    property_id: &str,
) -> Result<Response<Body>, LambdaError> {
    let result = add_visit(store, property_id)
        .await
        .map(|_| WriteResult::now(property_id.to_string()))
        .map_err(ApiError::from);
    respond(result)
}
