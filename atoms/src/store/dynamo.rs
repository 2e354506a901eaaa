use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use serde_json::Value;
use std::collections::HashMap;

use super::attr::{document_to_item, item_to_document, item_version, to_attribute};
use super::{Collection, Document, DocumentStore, Snapshot, StoreError, StoreResult};

/// Single-table DynamoDB backend.
///
/// PK = collection partition (`PROPERTY`, `PHOTO`)
/// SK = `{PARTITION}#{id}`
#[derive(Clone)]
pub struct DynamoDocumentStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoDocumentStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(collection: Collection, id: &str) -> HashMap<String, AttributeValue> {
        let mut key = HashMap::new();
        key.insert(
            "PK".to_string(),
            AttributeValue::S(collection.partition().to_string()),
        );
        key.insert("SK".to_string(), AttributeValue::S(collection.sort_key(id)));
        key
    }

    fn full_item(
        collection: Collection,
        id: &str,
        version: u64,
        data: &Document,
    ) -> HashMap<String, AttributeValue> {
        let mut item = document_to_item(data);
        item.extend(Self::key(collection, id));
        item.insert("version".to_string(), AttributeValue::N(version.to_string()));
        item
    }

    fn snapshot(
        collection: Collection,
        item: &HashMap<String, AttributeValue>,
    ) -> StoreResult<Option<Snapshot>> {
        let Some(id) = item
            .get("SK")
            .and_then(|v| v.as_s().ok())
            .and_then(|sk| collection.id_from_sort_key(sk))
        else {
            return Ok(None);
        };
        Ok(Some(Snapshot {
            id: id.to_string(),
            version: item_version(item),
            data: item_to_document(item)?,
        }))
    }

    /// Query a whole partition, following pagination, optionally filtered on
    /// one top-level attribute.
    async fn query_partition(
        &self,
        collection: Collection,
        filter: Option<(&str, &Value)>,
    ) -> StoreResult<Vec<Snapshot>> {
        let mut snapshots = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let mut req = self
                .client
                .query()
                .table_name(&self.table_name)
                .consistent_read(true)
                .key_condition_expression("PK = :pk")
                .expression_attribute_values(
                    ":pk",
                    AttributeValue::S(collection.partition().to_string()),
                )
                .set_exclusive_start_key(start_key.take());

            if let Some((field, value)) = filter {
                req = req
                    .filter_expression("#field = :value")
                    .expression_attribute_names("#field", field)
                    .expression_attribute_values(":value", to_attribute(value));
            }

            let result = req
                .send()
                .await
                .map_err(|e| StoreError::Backend(format!("DynamoDB query error: {}", e)))?;

            for item in result.items() {
                if let Some(snapshot) = Self::snapshot(collection, item)? {
                    snapshots.push(snapshot);
                }
            }

            match result.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(snapshots)
    }
}

#[async_trait]
impl DocumentStore for DynamoDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Snapshot>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(collection, id)))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB get_item error: {}", e)))?;

        match result.item() {
            Some(item) => Self::snapshot(collection, item),
            None => Ok(None),
        }
    }

    async fn create(&self, collection: Collection, id: &str, data: Document) -> StoreResult<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(Self::full_item(collection, id, 0, &data)))
            .condition_expression("attribute_not_exists(SK)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match e.as_service_error() {
                Some(se) if se.is_conditional_check_failed_exception() => {
                    Err(StoreError::AlreadyExists(collection.sort_key(id)))
                }
                _ => Err(StoreError::Backend(format!("DynamoDB put_item error: {}", e))),
            },
        }
    }

    async fn merge(&self, collection: Collection, id: &str, fields: Document) -> StoreResult<()> {
        let mut update_expr = vec!["#version = if_not_exists(#version, :zero) + :one".to_string()];
        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(collection, id)))
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":zero", AttributeValue::N("0".to_string()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()));

        for (i, (field, value)) in fields.iter().enumerate() {
            update_expr.push(format!("#f{i} = :v{i}"));
            builder = builder
                .expression_attribute_names(format!("#f{i}"), field)
                .expression_attribute_values(format!(":v{i}"), to_attribute(value));
        }

        builder
            .update_expression(format!("SET {}", update_expr.join(", ")))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB update_item error: {}", e)))?;

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(collection, id)))
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("DynamoDB delete_item error: {}", e)))?;
        Ok(())
    }

    async fn list(&self, collection: Collection) -> StoreResult<Vec<Snapshot>> {
        self.query_partition(collection, None).await
    }

    async fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<Snapshot>> {
        self.query_partition(collection, Some((field, value))).await
    }

    async fn array_append(
        &self,
        collection: Collection,
        id: &str,
        field: &str,
        elements: Vec<Value>,
    ) -> StoreResult<()> {
        let elements = AttributeValue::L(elements.iter().map(to_attribute).collect());

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key(collection, id)))
            .condition_expression("attribute_exists(SK)")
            .update_expression(
                "SET #field = list_append(if_not_exists(#field, :empty), :elements), \
                 #version = if_not_exists(#version, :zero) + :one",
            )
            .expression_attribute_names("#field", field)
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(":empty", AttributeValue::L(vec![]))
            .expression_attribute_values(":elements", elements)
            .expression_attribute_values(":zero", AttributeValue::N("0".to_string()))
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match e.as_service_error() {
                Some(se) if se.is_conditional_check_failed_exception() => {
                    Err(StoreError::NotFound(collection.sort_key(id)))
                }
                _ => Err(StoreError::Backend(format!("DynamoDB update_item error: {}", e))),
            },
        }
    }

    async fn compare_and_swap(
        &self,
        collection: Collection,
        id: &str,
        expected_version: u64,
        data: Document,
    ) -> StoreResult<()> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(Self::full_item(
                collection,
                id,
                expected_version + 1,
                &data,
            )))
            .condition_expression("attribute_exists(SK) AND #version = :expected")
            .expression_attribute_names("#version", "version")
            .expression_attribute_values(
                ":expected",
                AttributeValue::N(expected_version.to_string()),
            )
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match e.as_service_error() {
                Some(se) if se.is_conditional_check_failed_exception() => {
                    Err(StoreError::Conflict(collection.sort_key(id)))
                }
                _ => Err(StoreError::Backend(format!("DynamoDB put_item error: {}", e))),
            },
        }
    }
}
