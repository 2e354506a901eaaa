//! Photo ingestion and thumbnail generation.
//!
//! [`ingest`] stores an uploaded original and appends its variant stub to the
//! property's photo record. [`thumbnails::ThumbnailPipeline`] reacts to the
//! object-finalized event for that original and fills in the three thumbnail
//! references, one transaction per size.

pub mod converter;
pub mod data_uri;
pub mod ingest;
pub mod thumbnails;

pub use converter::{ConvertError, ImageConverter, MagickConverter, ResizeConverter};
pub use ingest::{create_photo_handler, ingest, IngestError, IngestRequest, IngestResponse};
pub use thumbnails::{
    FailureSink, FinalizedObject, LogFailures, PipelineError, PipelineOutcome, SkipReason,
    ThumbnailPipeline,
};
