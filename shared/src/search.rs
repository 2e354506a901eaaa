use bamboo_atoms::error::ApiError;
use bamboo_atoms::http::respond;
use bamboo_atoms::properties::{
    get_listed, list_all, list_listed, PropertyAdmin, PropertyComplete, PropertyShort,
};
use bamboo_atoms::store::DocumentStore;
use lambda_http::{Body, Error, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub total: usize,
    pub properties: Vec<T>,
}

impl<T> From<Vec<T>> for Listing<T> {
    fn from(properties: Vec<T>) -> Self {
        Self {
            total: properties.len(),
            properties,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SearchListing {
    Short(Listing<PropertyShort>),
    Complete(Listing<PropertyComplete>),
}

#[derive(Debug, Serialize)]
pub struct SingleProperty {
    pub property: PropertyComplete,
}

pub async fn search(store: &dyn DocumentStore, complete: bool) -> Result<SearchListing, ApiError> {
    let properties = list_listed(store).await?;
    tracing::info!("Search returned {} properties", properties.len());
    Ok(if complete {
        SearchListing::Complete(properties.iter().map(PropertyComplete::from).collect::<Vec<_>>().into())
    } else {
        SearchListing::Short(properties.iter().map(PropertyShort::from).collect::<Vec<_>>().into())
    })
}

/// Every property in admin shape. Only `complete=true` returns data.
pub async fn all_metadata(
    store: &dyn DocumentStore,
    complete: bool,
) -> Result<Listing<PropertyAdmin>, ApiError> {
    if !complete {
        return Ok(Listing::from(Vec::new()));
    }
    let properties = list_all(store).await?;
    Ok(properties.iter().map(PropertyAdmin::from).collect::<Vec<_>>().into())
}

/// HTTP Handler: GET /search?complete=
pub async fn search_handler(store: &dyn DocumentStore, complete: bool) -> Result<Response<Body>, Error> {
    respond(search(store, complete).await)
}

/// HTTP Handler: GET /search/{id}
pub async fn get_listed_handler(store: &dyn DocumentStore, property_id: &str) -> Result<Response<Body>, Error> {
    let result = get_listed(store, property_id)
        .await
        .map(|p| SingleProperty {
            property: PropertyComplete::from(&p),
        })
        .map_err(ApiError::from);
    respond(result)
}

/// HTTP Handler: GET /properties?complete=true
pub async fn all_metadata_handler(store: &dyn DocumentStore, complete: bool) -> Result<Response<Body>, Error> {
    respond(all_metadata(store, complete).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bamboo_atoms::properties::{create_property, set_availability, set_visibility, RawProperty};
    use bamboo_atoms::store::MemoryDocumentStore;
    use lambda_http::http::StatusCode;
    use serde_json::{json, Value};

    async fn seed(store: &MemoryDocumentStore) -> (String, String) {
        let shown = create_property(store, serde_json::from_value::<RawProperty>(json!({"name": "shown", "price": 10, "years": 3})).unwrap())
            .await
            .unwrap();
        set_availability(store, &shown.id, true).await.unwrap();
        set_visibility(store, &shown.id, true).await.unwrap();
        let hidden = create_property(store, RawProperty::default()).await.unwrap();
        (shown.id, hidden.id)
    }

    fn body(resp: &Response<Body>) -> Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[tokio::test]
    async fn search_shapes_follow_complete_flag() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;

        let short = body(&search_handler(&store, false).await.unwrap());
        assert_eq!(short["total"], 1);
        assert_eq!(short["properties"][0]["name"], "shown");
        assert!(short["properties"][0].get("years").is_none());

        let complete = body(&search_handler(&store, true).await.unwrap());
        assert_eq!(complete["properties"][0]["years"], json!(3.0));
        assert!(complete["properties"][0].get("visits").is_none());
    }

    #[tokio::test]
    async fn single_lookup_checks_listing() {
        let store = MemoryDocumentStore::new();
        let (shown, hidden) = seed(&store).await;

        let resp = get_listed_handler(&store, &shown).await.unwrap();
        assert_eq!(body(&resp)["property"]["id"], Value::String(shown));

        let resp = get_listed_handler(&store, &hidden).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&resp)["code"], "failed-precondition");
        assert_eq!(body(&resp)["error"], "Property not available.");

        let resp = get_listed_handler(&store, "ghost").await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&resp)["code"], "not-found");
    }

    #[tokio::test]
    async fn metadata_requires_complete() {
        let store = MemoryDocumentStore::new();
        seed(&store).await;

        let empty = body(&all_metadata_handler(&store, false).await.unwrap());
        assert_eq!(empty, json!({"total": 0, "properties": []}));

        let all = body(&all_metadata_handler(&store, true).await.unwrap());
        assert_eq!(all["total"], 2);
        assert_eq!(all["properties"][0]["name"], "shown");
        assert_eq!(all["properties"][0]["isVisible"], true);
    }
}
