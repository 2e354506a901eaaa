use serde::{Deserialize, Serialize};

use crate::store::{Document, Snapshot, StoreError};

/// Reference to a generated thumbnail. The empty sentinel has an empty name.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Thumbnail {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl Thumbnail {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// One uploaded image inside a photo record. `name` is its natural key.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageVariant {
    pub name: String,
    pub url: String,
    pub thumb128: Thumbnail,
    pub thumb256: Thumbnail,
    pub thumb512: Thumbnail,
}

impl ImageVariant {
    /// Fresh variant with all thumbnails set to the empty sentinel.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn thumbnail(&self, size: ThumbnailSize) -> &Thumbnail {
        match size {
            ThumbnailSize::S128 => &self.thumb128,
            ThumbnailSize::S256 => &self.thumb256,
            ThumbnailSize::S512 => &self.thumb512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThumbnailSize {
    S128,
    S256,
    S512,
}

impl ThumbnailSize {
    /// Processing order of the pipeline.
    pub const ALL: [ThumbnailSize; 3] = [ThumbnailSize::S128, ThumbnailSize::S256, ThumbnailSize::S512];

    pub fn pixels(&self) -> u32 {
        match self {
            ThumbnailSize::S128 => 128,
            ThumbnailSize::S256 => 256,
            ThumbnailSize::S512 => 512,
        }
    }

    /// Variant field holding this size.
    pub fn field(&self) -> &'static str {
        match self {
            ThumbnailSize::S128 => "thumb128",
            ThumbnailSize::S256 => "thumb256",
            ThumbnailSize::S512 => "thumb512",
        }
    }

    pub fn from_pixels(pixels: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.pixels() == pixels)
    }
}

/// Photo record: the ordered images of one property.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRecord {
    pub id: String,
    pub property_id: String,
    #[serde(default)]
    pub images: Vec<ImageVariant>,
}

impl PhotoRecord {
    pub fn new(id: impl Into<String>, property_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            property_id: property_id.into(),
            images: Vec::new(),
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut data = snapshot.data;
        data.insert("id".into(), serde_json::Value::String(snapshot.id));
        Ok(serde_json::from_value(serde_json::Value::Object(data))?)
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self)? {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(StoreError::Serialization(format!(
                "photo record serialized to {}",
                other
            ))),
        }
    }

    pub fn variant(&self, name: &str) -> Option<&ImageVariant> {
        self.images.iter().find(|img| img.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_variant_serializes_empty_thumbnails() {
        let variant = ImageVariant::new("r1_house.png", "https://x/r1_house.png");
        let value = serde_json::to_value(&variant).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "r1_house.png",
                "url": "https://x/r1_house.png",
                "thumb128": {"name": "", "url": ""},
                "thumb256": {"name": "", "url": ""},
                "thumb512": {"name": "", "url": ""},
            })
        );
        assert!(ThumbnailSize::ALL.iter().all(|s| variant.thumbnail(*s).is_empty()));
    }

    #[test]
    fn sizes_map_to_fields_and_pixels() {
        assert_eq!(ThumbnailSize::from_pixels(256), Some(ThumbnailSize::S256));
        assert_eq!(ThumbnailSize::from_pixels(64), None);
        assert_eq!(ThumbnailSize::S512.field(), "thumb512");
        let order: Vec<u32> = ThumbnailSize::ALL.iter().map(|s| s.pixels()).collect();
        assert_eq!(order, vec![128, 256, 512]);
    }

    #[test]
    fn record_reads_from_snapshot_with_partial_variants() {
        let snapshot = Snapshot {
            id: "rec-1".into(),
            version: 3,
            data: json!({
                "propertyId": "p1",
                "images": [{"name": "rec-1_a.png", "url": "u"}],
            })
            .as_object()
            .cloned()
            .unwrap(),
        };
        let record = PhotoRecord::from_snapshot(snapshot).unwrap();
        assert_eq!(record.id, "rec-1");
        assert_eq!(record.property_id, "p1");
        assert!(record.variant("rec-1_a.png").unwrap().thumb256.is_empty());
    }
}
