use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use bamboo_atoms::storage::ObjectStore;
use photo_pipeline_block::{FinalizedObject, PipelineOutcome, ThumbnailPipeline};

/// S3 notifications carry form-encoded keys (`+` for spaces).
pub fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(key) => key.into_owned(),
        Err(e) => {
            tracing::warn!("⚠️ Could not decode object key {}: {}", raw, e);
            spaced
        }
    }
}

/// Build the finalized object for a notification record, reading the
/// content type from the stored object's metadata.
pub async fn finalized_object(
    objects: &dyn ObjectStore,
    record: &S3EventRecord,
) -> Option<FinalizedObject> {
    let bucket = record.s3.bucket.name.clone().unwrap_or_default();
    if bucket != objects.bucket() {
        tracing::warn!("⚠️ Ignoring notification from unexpected bucket {:?}", bucket);
        return None;
    }

    let name = record.s3.object.key.as_deref().map(decode_key);
    let content_type = match name.as_deref() {
        Some(key) => match objects.content_type(key).await {
            Ok(content_type) => content_type,
            Err(e) => {
                tracing::warn!("⚠️ Could not read metadata of {}: {}", key, e);
                None
            }
        },
        None => None,
    };

    Some(FinalizedObject {
        bucket,
        name,
        content_type,
    })
}

/// Run the thumbnail pipeline for every record. Never fails.
pub async fn handle_s3_event(
    pipeline: &ThumbnailPipeline,
    objects: &dyn ObjectStore,
    event: S3Event,
) -> Vec<PipelineOutcome> {
    let mut outcomes = Vec::with_capacity(event.records.len());
    for record in &event.records {
        let Some(object) = finalized_object(objects, record).await else {
            continue;
        };
        tracing::info!("📥 Object finalized: {:?}", object.name);
        outcomes.push(pipeline.process(object).await);
    }
    outcomes
}
