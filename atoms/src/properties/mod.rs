// Re-export model types and service functions
pub mod http;
pub mod model;
pub mod service;

pub use model::{
    CommercialMode, Coordinates, Currency, Property, PropertyAdmin, PropertyComplete,
    PropertyShort, PropertyType, RawProperty, WriteResult,
};
pub use service::*;

use crate::photos::PhotoError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("Property not found")]
    NotFound(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Property not available.")]
    NotAvailable(String),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Photo(#[from] PhotoError),
}

impl From<StoreError> for PropertyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => PropertyError::NotFound(id),
            other => PropertyError::Store(other),
        }
    }
}

pub type PropertyResult<T> = Result<T, PropertyError>;
