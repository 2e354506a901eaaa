use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{Document, Snapshot, StoreError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(from = "Value", into = "String")]
pub enum Currency {
    #[default]
    MXN,
    USD,
}

impl From<Value> for Currency {
    fn from(value: Value) -> Self {
        match value.as_str() {
            Some("USD") => Currency::USD,
            _ => Currency::MXN,
        }
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        match currency {
            Currency::MXN => "MXN".to_string(),
            Currency::USD => "USD".to_string(),
        }
    }
}

/// Stored as its integer code.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(from = "Value", into = "i64")]
pub enum PropertyType {
    #[default]
    House,
    Apartment,
    Office,
}

impl From<Value> for PropertyType {
    fn from(value: Value) -> Self {
        match value.as_i64() {
            Some(1) => PropertyType::Apartment,
            Some(2) => PropertyType::Office,
            _ => PropertyType::House,
        }
    }
}

impl From<PropertyType> for i64 {
    fn from(kind: PropertyType) -> Self {
        match kind {
            PropertyType::House => 0,
            PropertyType::Apartment => 1,
            PropertyType::Office => 2,
        }
    }
}

/// Stored as its integer code.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(from = "Value", into = "i64")]
pub enum CommercialMode {
    #[default]
    Sell,
    Rent,
    Presell,
}

impl From<Value> for CommercialMode {
    fn from(value: Value) -> Self {
        match value.as_i64() {
            Some(1) => CommercialMode::Rent,
            Some(2) => CommercialMode::Presell,
            _ => CommercialMode::Sell,
        }
    }
}

impl From<CommercialMode> for i64 {
    fn from(mode: CommercialMode) -> Self {
        match mode {
            CommercialMode::Sell => 0,
            CommercialMode::Rent => 1,
            CommercialMode::Presell => 2,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

/// Editable property fields as sent by clients.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProperty {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub years: f64,
    pub address: String,
    pub coordinates: Coordinates,
    pub size_mts: f64,
    pub build_mts: f64,
    pub floor: String,
    pub rooms: f64,
    pub baths: f64,
    pub parking: f64,
    pub has_living_room: bool,
    pub has_kitchen: bool,
    pub has_service_room: bool,
    pub has_service_area: bool,
    pub has_tv_room: bool,
    pub has_furniture: bool,
    pub has_closet: bool,
    pub has_terrace: bool,
    pub terrace_mts: f64,
    pub amenities: Vec<String>,
    pub property_type: PropertyType,
    pub commercial_mode: CommercialMode,
    pub source: String,
    pub matter: String,
}

/// Property document
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Property {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub years: f64,
    pub address: String,
    pub coordinates: Coordinates,
    pub size_mts: f64,
    pub build_mts: f64,
    pub floor: String,
    pub rooms: f64,
    pub baths: f64,
    pub parking: f64,
    pub has_living_room: bool,
    pub has_kitchen: bool,
    pub has_service_room: bool,
    pub has_service_area: bool,
    pub has_tv_room: bool,
    pub has_furniture: bool,
    pub has_closet: bool,
    pub has_terrace: bool,
    pub terrace_mts: f64,
    pub amenities: Vec<String>,
    pub property_type: PropertyType,
    pub commercial_mode: CommercialMode,
    pub source: String,
    pub matter: String,
    pub is_available: bool,
    pub is_visible: bool,
    pub visits: u64,
    pub interested: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn pick_text(current: &str, next: &str) -> String {
    if !next.is_empty() && next != current {
        next.to_string()
    } else {
        current.to_string()
    }
}

impl Property {
    /// New property from client input. Not listed until the creation
    /// trigger has run.
    pub fn create(id: impl Into<String>, raw: RawProperty, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: raw.name,
            description: raw.description,
            price: raw.price,
            currency: raw.currency,
            years: raw.years,
            address: raw.address,
            coordinates: raw.coordinates,
            size_mts: raw.size_mts,
            build_mts: raw.build_mts,
            floor: raw.floor,
            rooms: raw.rooms,
            baths: raw.baths,
            parking: raw.parking,
            has_living_room: raw.has_living_room,
            has_kitchen: raw.has_kitchen,
            has_service_room: raw.has_service_room,
            has_service_area: raw.has_service_area,
            has_tv_room: raw.has_tv_room,
            has_furniture: raw.has_furniture,
            has_closet: raw.has_closet,
            has_terrace: raw.has_terrace,
            terrace_mts: raw.terrace_mts,
            amenities: raw.amenities,
            property_type: raw.property_type,
            commercial_mode: raw.commercial_mode,
            source: raw.source,
            matter: raw.matter,
            updated_at: Some(now),
            ..Default::default()
        }
    }

    /// Apply a general update.
    ///
    /// Text fields and price keep the current value when the next one is
    /// empty (or not positive, for price). Amenities are unioned and sorted.
    /// Source, matter, the listing flags, the counters and `createdAt`
    /// never change here.
    pub fn merge(&self, next: &RawProperty, now: DateTime<Utc>) -> Self {
        let mut amenities = self.amenities.clone();
        amenities.extend(next.amenities.iter().cloned());
        amenities.sort();
        amenities.dedup();

        let price = if next.price > 0.0 && next.price != self.price {
            next.price
        } else {
            self.price
        };

        Self {
            id: self.id.clone(),
            name: pick_text(&self.name, &next.name),
            description: pick_text(&self.description, &next.description),
            price,
            currency: next.currency,
            years: next.years,
            address: pick_text(&self.address, &next.address),
            coordinates: Coordinates {
                latitude: pick_text(&self.coordinates.latitude, &next.coordinates.latitude),
                longitude: pick_text(&self.coordinates.longitude, &next.coordinates.longitude),
            },
            size_mts: next.size_mts,
            build_mts: next.build_mts,
            floor: next.floor.clone(),
            rooms: next.rooms,
            baths: next.baths,
            parking: next.parking,
            has_living_room: next.has_living_room,
            has_kitchen: next.has_kitchen,
            has_service_room: next.has_service_room,
            has_service_area: next.has_service_area,
            has_tv_room: next.has_tv_room,
            has_furniture: next.has_furniture,
            has_closet: next.has_closet,
            has_terrace: next.has_terrace,
            terrace_mts: next.terrace_mts,
            amenities,
            property_type: next.property_type,
            commercial_mode: next.commercial_mode,
            source: self.source.clone(),
            matter: self.matter.clone(),
            is_available: self.is_available,
            is_visible: self.is_visible,
            visits: self.visits,
            interested: self.interested,
            created_at: self.created_at,
            updated_at: Some(now),
        }
    }

    /// Shown on the public listing.
    pub fn is_listed(&self) -> bool {
        self.is_available && self.is_visible
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        Self::from_document(&snapshot.id, snapshot.data)
    }

    pub fn from_document(id: &str, mut data: Document) -> Result<Self, StoreError> {
        data.insert("id".into(), Value::String(id.to_string()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }

    pub fn to_document(&self) -> Result<Document, StoreError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Serialization(format!(
                "property serialized to {}",
                other
            ))),
        }
    }
}

/// Listing card fields.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyShort {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: Currency,
    pub address: String,
    pub coordinates: Coordinates,
    pub size_mts: f64,
    pub build_mts: f64,
    pub floor: String,
    pub rooms: f64,
    pub baths: f64,
    pub parking: f64,
    pub property_type: PropertyType,
    pub commercial_mode: CommercialMode,
    pub source: String,
    pub matter: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyComplete {
    #[serde(flatten)]
    pub short: PropertyShort,
    pub years: f64,
    pub has_living_room: bool,
    pub has_kitchen: bool,
    pub has_service_room: bool,
    pub has_service_area: bool,
    pub has_tv_room: bool,
    pub has_furniture: bool,
    pub has_closet: bool,
    pub has_terrace: bool,
    pub terrace_mts: f64,
    pub amenities: Vec<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAdmin {
    #[serde(flatten)]
    pub complete: PropertyComplete,
    pub is_available: bool,
    pub is_visible: bool,
    pub visits: u64,
    pub interested: u64,
}

impl From<&Property> for PropertyShort {
    fn from(p: &Property) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            price: p.price,
            currency: p.currency,
            address: p.address.clone(),
            coordinates: p.coordinates.clone(),
            size_mts: p.size_mts,
            build_mts: p.build_mts,
            floor: p.floor.clone(),
            rooms: p.rooms,
            baths: p.baths,
            parking: p.parking,
            property_type: p.property_type,
            commercial_mode: p.commercial_mode,
            source: p.source.clone(),
            matter: p.matter.clone(),
        }
    }
}

impl From<&Property> for PropertyComplete {
    fn from(p: &Property) -> Self {
        Self {
            short: p.into(),
            years: p.years,
            has_living_room: p.has_living_room,
            has_kitchen: p.has_kitchen,
            has_service_room: p.has_service_room,
            has_service_area: p.has_service_area,
            has_tv_room: p.has_tv_room,
            has_furniture: p.has_furniture,
            has_closet: p.has_closet,
            has_terrace: p.has_terrace,
            terrace_mts: p.terrace_mts,
            amenities: p.amenities.clone(),
        }
    }
}

impl From<&Property> for PropertyAdmin {
    fn from(p: &Property) -> Self {
        Self {
            complete: p.into(),
            is_available: p.is_available,
            is_visible: p.is_visible,
            visits: p.visits,
            interested: p.interested,
        }
    }
}

/// Response envelope of property writes.
#[derive(Debug, Serialize, Clone)]
pub struct WriteResult<T> {
    pub time: DateTime<Utc>,
    pub obj: T,
}

impl<T> WriteResult<T> {
    pub fn now(obj: T) -> Self {
        Self { time: Utc::now(), obj }
    }
}

#[derive(Debug, Deserialize)]
pub struct PropertyPayload {
    pub data: RawProperty,
}

#[derive(Debug, Deserialize)]
pub struct PricePayload {
    pub price: f64,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityPayload {
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityPayload {
    pub visible: bool,
}
