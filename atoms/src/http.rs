use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;

pub fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    body: &T,
) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(body)?.into())
        .map_err(Box::new)?)
}

/// Render an API error as `{code, error}` with its mapped status.
pub fn error_response(err: &ApiError) -> Result<Response<Body>, Error> {
    json_response(err.status(), &err.body())
}

/// 200 with the serialized value, or the error body.
pub fn respond<T: Serialize>(result: Result<T, ApiError>) -> Result<Response<Body>, Error> {
    match result {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(e) => {
            if e.is_internal() {
                tracing::error!("❌ {} ({})", e, e.code());
            } else {
                tracing::warn!("⚠️ {} ({})", e, e.code());
            }
            error_response(&e)
        }
    }
}

pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::InvalidArgument("Data is empty".to_string()));
    }
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        price: f64,
    }

    #[test]
    fn empty_body_is_invalid_argument() {
        let result: Result<Payload, _> = parse_body(b"");
        assert!(matches!(result, Err(ApiError::InvalidArgument(msg)) if msg == "Data is empty"));
    }

    #[test]
    fn malformed_body_is_invalid_argument() {
        let result: Result<Payload, _> = parse_body(b"{\"price\": \"cheap\"}");
        assert!(matches!(result, Err(ApiError::InvalidArgument(_))));
    }

    #[test]
    fn errors_render_code_and_message() {
        let resp = error_response(&ApiError::NotFound("Property not found".into())).unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_slice(resp.body()).unwrap();
        assert_eq!(body["code"], "not-found");
        assert_eq!(body["error"], "Property not found");
    }
}
