//! Domain atoms for the Bamboo listings backend.
//!
//! Each atom owns a model and the service functions that read and write it
//! through the injected [`store::DocumentStore`] and [`storage::ObjectStore`]
//! handles, plus thin HTTP handlers over those services.

pub mod error;
pub mod http;
pub mod photos;
pub mod properties;
pub mod storage;
pub mod store;

pub use error::ApiError;
