use aws_sdk_dynamodb::types::AttributeValue;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;

use super::{Document, StoreError, StoreResult};

/// Attributes owned by the store itself, never part of a document body.
pub const RESERVED_ATTRIBUTES: [&str; 3] = ["PK", "SK", "version"];

pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}

pub fn from_attribute(attr: &AttributeValue) -> StoreResult<Value> {
    let value = match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(n)?),
        AttributeValue::L(items) => Value::Array(
            items
                .iter()
                .map(from_attribute)
                .collect::<StoreResult<Vec<_>>>()?,
        ),
        AttributeValue::M(map) => {
            let mut obj = Map::new();
            for (k, v) in map {
                obj.insert(k.clone(), from_attribute(v)?);
            }
            Value::Object(obj)
        }
        AttributeValue::Ss(items) => {
            Value::Array(items.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(items) => Value::Array(
            items
                .iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<StoreResult<Vec<_>>>()?,
        ),
        other => {
            return Err(StoreError::Serialization(format!(
                "Unsupported attribute type: {:?}",
                other
            )))
        }
    };
    Ok(value)
}

fn parse_number(n: &str) -> StoreResult<Number> {
    if let Ok(i) = n.parse::<i64>() {
        return Ok(Number::from(i));
    }
    n.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| StoreError::Serialization(format!("Invalid number attribute: {}", n)))
}

/// Convert a raw DynamoDB item into a document body, dropping reserved keys.
pub fn item_to_document(item: &HashMap<String, AttributeValue>) -> StoreResult<Document> {
    let mut doc = Map::new();
    for (k, v) in item {
        if RESERVED_ATTRIBUTES.contains(&k.as_str()) {
            continue;
        }
        doc.insert(k.clone(), from_attribute(v)?);
    }
    Ok(doc)
}

pub fn document_to_item(doc: &Document) -> HashMap<String, AttributeValue> {
    doc.iter()
        .filter(|(k, _)| !RESERVED_ATTRIBUTES.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), to_attribute(v)))
        .collect()
}

pub fn item_version(item: &HashMap<String, AttributeValue>) -> u64 {
    item.get("version")
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_image_variants_survive_conversion() {
        let value = json!({
            "propertyId": "p1",
            "images": [
                {"name": "r1_a.png", "url": "u", "thumb128": {"name": "", "url": ""}}
            ],
            "price": 1250000.5,
            "rooms": 3,
            "isVisible": false
        });
        let doc = value.as_object().unwrap().clone();
        let item = document_to_item(&doc);
        assert!(matches!(item.get("images"), Some(AttributeValue::L(_))));
        assert_eq!(item.get("rooms"), Some(&AttributeValue::N("3".into())));

        let back = item_to_document(&item).unwrap();
        assert_eq!(Value::Object(back), value);
    }

    #[test]
    fn reserved_attributes_are_stripped() {
        let mut item = HashMap::new();
        item.insert("PK".to_string(), AttributeValue::S("PHOTO".into()));
        item.insert("SK".to_string(), AttributeValue::S("PHOTO#1".into()));
        item.insert("version".to_string(), AttributeValue::N("7".into()));
        item.insert("propertyId".to_string(), AttributeValue::S("p1".into()));

        let doc = item_to_document(&item).unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(item_version(&item), 7);
    }
}
