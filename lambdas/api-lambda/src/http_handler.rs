use bamboo_atoms::{photos, properties, ApiError};
use bamboo_shared::{contact, search, AppState};
use lambda_http::{
    http::{header::HeaderValue, Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use photo_pipeline_block::create_photo_handler;
use std::sync::Arc;

fn with_cors_headers(mut resp: Response<Body>, allow_origin: &str) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(allow_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type"),
    );
    resp
}

fn query_flag(event: &Request, key: &str) -> bool {
    event
        .query_string_parameters_ref()
        .and_then(|params| params.first(key))
        == Some("true")
}

/// Paths this API serves, regardless of method.
fn is_known_path(parts: &[&str]) -> bool {
    matches!(
        parts,
        ["properties"]
            | ["properties", _]
            | ["properties", _, "price" | "availability" | "visibility" | "interest" | "visits"]
            | ["photos"]
            | ["photos", _]
            | ["search"]
            | ["search", _]
            | ["contact"]
    )
}

/// Main Lambda handler - routes requests to property, photo, search and contact endpoints
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body: &[u8] = event.body().as_ref();
    tracing::info!("🚀 API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, &state.config.cors_allow_origin));
    }

    let store = state.store.as_ref();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        // Properties
        (&Method::GET, ["properties"]) => {
            search::all_metadata_handler(store, query_flag(&event, "complete")).await
        }
        (&Method::POST, ["properties"]) => properties::http::create_property_handler(store, body).await,
        (&Method::PUT, ["properties", id]) => {
            properties::http::update_property_handler(store, id, body).await
        }
        (&Method::DELETE, ["properties", id]) => {
            properties::http::delete_property_handler(store, id).await
        }
        (&Method::PUT, ["properties", id, "price"]) => {
            properties::http::update_price_handler(store, id, body).await
        }
        (&Method::PUT, ["properties", id, "availability"]) => {
            properties::http::update_availability_handler(store, id, body).await
        }
        (&Method::PUT, ["properties", id, "visibility"]) => {
            properties::http::update_visibility_handler(store, id, body).await
        }
        (&Method::PUT, ["properties", id, "interest"]) => {
            properties::http::add_interest_handler(store, id).await
        }
        (&Method::PUT, ["properties", id, "visits"]) => {
            properties::http::add_visit_handler(store, id).await
        }

        // Photos
        (&Method::POST, ["photos"]) => {
            create_photo_handler(
                store,
                state.objects.as_ref(),
                state.config.signed_url_expires_at,
                body,
            )
            .await
        }
        (&Method::GET, ["photos"]) => {
            let property_id = event
                .query_string_parameters_ref()
                .and_then(|params| params.first("propertyId"));
            photos::http::get_property_photos_handler(store, property_id).await
        }
        (&Method::GET, ["photos", id]) => photos::http::get_photo_record_handler(store, id).await,

        // Search
        (&Method::GET, ["search"]) => search::search_handler(store, query_flag(&event, "complete")).await,
        (&Method::GET, ["search", id]) => search::get_listed_handler(store, id).await,

        // Contact
        (&Method::POST, ["contact"]) => {
            contact::handle_contact(state.mailer.as_ref(), &state.config, body).await
        }

        (_, parts) if is_known_path(parts) => {
            tracing::warn!("Method {} not allowed on {}", method, path);
            bamboo_atoms::http::error_response(&ApiError::MethodNotAllowed)
        }
        _ => not_found(),
    };

    resp.map(|r| with_cors_headers(r, &state.config.cors_allow_origin))
}

/// Unrouted paths never reach a handler, so they keep a plain 404.
fn not_found() -> Result<Response<Body>, Error> {
    let err = ApiError::NotFound("Not found".to_string());
    bamboo_atoms::http::json_response(StatusCode::NOT_FOUND, &err.body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bamboo_atoms::storage::MemoryObjectStore;
    use bamboo_atoms::store::MemoryDocumentStore;
    use bamboo_shared::config::Config;
    use bamboo_shared::email::{Email, MailError, Mailer};
    use serde_json::Value;
    use std::collections::HashMap;

    struct NoMail;

    #[async_trait::async_trait]
    impl Mailer for NoMail {
        async fn send(&self, _email: &Email) -> Result<(), MailError> {
            Ok(())
        }
    }

    fn state() -> Arc<AppState> {
        Arc::new(AppState {
            store: Arc::new(MemoryDocumentStore::new()),
            objects: Arc::new(MemoryObjectStore::new("bamboo-media")),
            mailer: Arc::new(NoMail),
            config: Config::from_lookup(|_| None).unwrap(),
        })
    }

    fn request(method: &str, uri: &str, body: &str) -> Request {
        lambda_http::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn call(state: &Arc<AppState>, req: Request) -> (StatusCode, Value) {
        let resp = function_handler(req, state.clone()).await.unwrap();
        let body = if resp.body().is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(resp.body()).unwrap()
        };
        (resp.status(), body)
    }

    #[tokio::test]
    async fn property_lifecycle_through_routes() {
        let state = state();
        let (status, body) = call(
            &state,
            request("POST", "/properties", r#"{"data": {"name": "Casa", "price": 100}}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = body["obj"]["id"].as_str().unwrap().to_string();

        for action in ["availability", "visibility"] {
            let key = if action == "availability" { "available" } else { "visible" };
            let (status, _) = call(
                &state,
                request("PUT", &format!("/properties/{}/{}", id, action), &format!(r#"{{"{}": true}}"#, key)),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = call(&state, request("GET", &format!("/search/{}", id), "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["property"]["name"], "Casa");

        let (_, body) = call(&state, request("PUT", &format!("/properties/{}/visits", id), "")).await;
        assert_eq!(body["obj"], Value::String(id.clone()));

        let (status, _) = call(&state, request("DELETE", &format!("/properties/{}", id), "")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn query_parameters_are_read() {
        let state = state();
        call(&state, request("POST", "/properties", r#"{"data": {"name": "Casa"}}"#)).await;

        let mut params = HashMap::new();
        params.insert("complete".to_string(), "true".to_string());
        let req = request("GET", "/properties", "").with_query_string_parameters(params);
        let (status, body) = call(&state, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);

        let (_, body) = call(&state, request("GET", "/properties", "")).await;
        assert_eq!(body["total"], 0);

        let (status, body) = call(&state, request("GET", "/photos", "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "invalid-argument");
    }

    #[tokio::test]
    async fn wrong_method_and_unknown_path() {
        let state = state();
        let (status, body) = call(&state, request("DELETE", "/search", "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "method-not-allowed");

        let (status, body) = call(&state, request("GET", "/nowhere", "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "not-found");

        let resp = function_handler(request("OPTIONS", "/photos", ""), state.clone())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }
}
