use bamboo_atoms::photos::{self, PhotoError, Thumbnail, ThumbnailSize};
use bamboo_atoms::storage::{
    is_thumbnail, key_basename, key_dir, thumbnail_key, thumbnail_name, ObjectStore, StorageError,
};
use bamboo_atoms::store::DocumentStore;
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::converter::{ConvertError, ImageConverter};

/// An object the object store reports as fully written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedObject {
    pub bucket: String,
    pub name: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotAnImage(Option<String>),
    AlreadyThumbnail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Skipped(SkipReason),
    Processed {
        completed: Vec<ThumbnailSize>,
        failed: Vec<ThumbnailSize>,
    },
    Failed(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Object has no name")]
    MissingName,

    #[error("No photo record id in file name {0}")]
    MissingRecordId(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receives pipeline failures. Failed sizes are not retried.
pub trait FailureSink: Send + Sync {
    fn object_failed(&self, object: &str, error: &PipelineError);
    fn size_failed(&self, object: &str, size: ThumbnailSize, error: &PipelineError);
}

/// Logs failures and drops them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailures;

impl FailureSink for LogFailures {
    fn object_failed(&self, object: &str, error: &PipelineError) {
        tracing::error!("❌ Thumbnail pipeline failed for {}: {}", object, error);
    }

    fn size_failed(&self, object: &str, size: ThumbnailSize, error: &PipelineError) {
        tracing::error!(
            "❌ Thumbnail {} failed for {}: {}",
            size.pixels(),
            object,
            error
        );
    }
}

/// Owning photo record id: the file name segment before the first `_`.
pub fn record_id_from_file_name(file_name: &str) -> Option<&str> {
    file_name
        .split_once('_')
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

pub struct ThumbnailPipeline {
    store: Arc<dyn DocumentStore>,
    objects: Arc<dyn ObjectStore>,
    converter: Arc<dyn ImageConverter>,
    failures: Arc<dyn FailureSink>,
    expires_at: DateTime<Utc>,
}

impl ThumbnailPipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        objects: Arc<dyn ObjectStore>,
        converter: Arc<dyn ImageConverter>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            objects,
            converter,
            failures: Arc::new(LogFailures),
            expires_at,
        }
    }

    pub fn with_failure_sink(mut self, failures: Arc<dyn FailureSink>) -> Self {
        self.failures = failures;
        self
    }

    /// Generate and register the thumbnails of a finalized original.
    /// Never fails; problems go to the failure sink.
    pub async fn process(&self, object: FinalizedObject) -> PipelineOutcome {
        let Some(name) = object.name.as_deref() else {
            let err = PipelineError::MissingName;
            self.failures.object_failed(&object.bucket, &err);
            return PipelineOutcome::Failed(err.to_string());
        };

        let content_type = match object.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => ct,
            other => {
                tracing::warn!("Skipping {}: not an image ({:?})", name, other);
                return PipelineOutcome::Skipped(SkipReason::NotAnImage(other.map(str::to_string)));
            }
        };

        let file_name = key_basename(name);
        if is_thumbnail(file_name) {
            tracing::debug!("Skipping {}: already a thumbnail", name);
            return PipelineOutcome::Skipped(SkipReason::AlreadyThumbnail);
        }

        tracing::info!("📥 Generating thumbnails for {} in {}", name, object.bucket);
        match self.run(name, file_name, content_type).await {
            Ok(outcome) => outcome,
            Err(err) => {
                self.failures.object_failed(name, &err);
                PipelineOutcome::Failed(err.to_string())
            }
        }
    }

    async fn run(
        &self,
        key: &str,
        file_name: &str,
        content_type: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        let record_id = record_id_from_file_name(file_name)
            .ok_or_else(|| PipelineError::MissingRecordId(file_name.to_string()))?;

        // Removed on drop, whichever way this returns.
        let workdir = tempfile::tempdir()?;
        let original = workdir.path().join(file_name);
        let bytes = self.objects.get(key).await?;
        tokio::fs::write(&original, bytes).await?;
        tracing::info!("Downloaded {} to {}", key, original.display());

        let mut completed = Vec::new();
        let mut failed = Vec::new();
        for size in ThumbnailSize::ALL {
            let result = self
                .thumbnail(key, file_name, content_type, record_id, &original, workdir.path(), size)
                .await;
            match result {
                Ok(()) => completed.push(size),
                Err(err) => {
                    self.failures.size_failed(key, size, &err);
                    failed.push(size);
                }
            }
        }

        tracing::info!(
            "✅ Thumbnails for {}: {} done, {} failed",
            key,
            completed.len(),
            failed.len()
        );
        Ok(PipelineOutcome::Processed { completed, failed })
    }

    #[allow(clippy::too_many_arguments)]
    async fn thumbnail(
        &self,
        key: &str,
        file_name: &str,
        content_type: &str,
        record_id: &str,
        original: &Path,
        workdir: &Path,
        size: ThumbnailSize,
    ) -> Result<(), PipelineError> {
        let thumb_name = thumbnail_name(size.pixels(), file_name);
        let local = workdir.join(&thumb_name);
        self.converter.convert(original, size.pixels(), &local).await?;

        let data = tokio::fs::read(&local).await?;
        let thumb_key = thumbnail_key(key_dir(key), size.pixels(), file_name);
        self.objects.put(&thumb_key, data, content_type, true).await?;
        let url = self.objects.signed_url(&thumb_key, self.expires_at).await?;
        tracing::info!("Uploaded {}", thumb_key);

        photos::patch_thumbnail(
            self.store.as_ref(),
            record_id,
            file_name,
            size,
            &Thumbnail {
                name: thumb_name,
                url,
            },
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bamboo_atoms::photos::{append_variant, create_for_property, get_photo_record, ImageVariant};
    use bamboo_atoms::storage::MemoryObjectStore;
    use bamboo_atoms::store::MemoryDocumentStore;
    use chrono::TimeZone;
    use std::sync::Mutex;

    /// Writes `{size}:{input bytes}` so tests can tell thumbnails apart.
    struct TaggingConverter {
        fail_size: Option<u32>,
    }

    #[async_trait]
    impl ImageConverter for TaggingConverter {
        async fn convert(&self, input: &Path, size: u32, output: &Path) -> Result<(), ConvertError> {
            if self.fail_size == Some(size) {
                return Err(ConvertError::Decode("boom".into()));
            }
            let mut data = format!("{}:", size).into_bytes();
            data.extend(tokio::fs::read(input).await?);
            tokio::fs::write(output, data).await?;
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        sizes: Mutex<Vec<u32>>,
        objects: Mutex<Vec<String>>,
    }

    impl FailureSink for RecordingSink {
        fn object_failed(&self, object: &str, _error: &PipelineError) {
            self.objects.lock().unwrap().push(object.to_string());
        }

        fn size_failed(&self, _object: &str, size: ThumbnailSize, _error: &PipelineError) {
            self.sizes.lock().unwrap().push(size.pixels());
        }
    }

    struct Fixture {
        store: Arc<MemoryDocumentStore>,
        objects: Arc<MemoryObjectStore>,
        record_id: String,
        key: String,
        file_name: String,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryDocumentStore::new());
        let objects = Arc::new(MemoryObjectStore::new("bucket"));
        let record = create_for_property(store.as_ref(), "p1").await.unwrap();
        let file_name = format!("{}_house.png", record.id);
        let key = format!("p1/{}", file_name);
        objects.put(&key, b"orig".to_vec(), "image/png", true).await.unwrap();
        append_variant(store.as_ref(), &record.id, &ImageVariant::new(&file_name, "url"))
            .await
            .unwrap();
        Fixture {
            store,
            objects,
            record_id: record.id,
            key,
            file_name,
        }
    }

    fn pipeline(f: &Fixture, converter: TaggingConverter) -> ThumbnailPipeline {
        ThumbnailPipeline::new(
            f.store.clone(),
            f.objects.clone(),
            Arc::new(converter),
            Utc.with_ymd_and_hms(2030, 12, 31, 23, 59, 59).unwrap(),
        )
    }

    fn finalized(name: &str, content_type: &str) -> FinalizedObject {
        FinalizedObject {
            bucket: "bucket".into(),
            name: Some(name.into()),
            content_type: Some(content_type.into()),
        }
    }

    #[test]
    fn record_id_is_the_first_segment() {
        assert_eq!(record_id_from_file_name("abc-1_house_big.png"), Some("abc-1"));
        assert_eq!(record_id_from_file_name("house.png"), None);
        assert_eq!(record_id_from_file_name("_house.png"), None);
    }

    #[tokio::test]
    async fn all_sizes_are_uploaded_and_merged() {
        let f = fixture().await;
        let outcome = pipeline(&f, TaggingConverter { fail_size: None })
            .process(finalized(&f.key, "image/png"))
            .await;
        assert_eq!(
            outcome,
            PipelineOutcome::Processed {
                completed: ThumbnailSize::ALL.to_vec(),
                failed: vec![]
            }
        );

        let thumb = f.objects.object(&format!("p1/thumb_256_{}", f.file_name)).unwrap();
        assert_eq!(thumb.data, b"256:orig");
        assert_eq!(thumb.content_type, "image/png");

        let record = get_photo_record(f.store.as_ref(), &f.record_id).await.unwrap();
        let variant = record.variant(&f.file_name).unwrap();
        for size in ThumbnailSize::ALL {
            let t = variant.thumbnail(size);
            assert_eq!(t.name, format!("thumb_{}_{}", size.pixels(), f.file_name));
            assert!(t.url.starts_with("memory://bucket/p1/thumb_"));
        }
        assert_eq!(variant.url, "url");
    }

    #[tokio::test]
    async fn a_failed_size_does_not_stop_the_others() {
        let f = fixture().await;
        let sink = Arc::new(RecordingSink::default());
        let outcome = pipeline(&f, TaggingConverter { fail_size: Some(256) })
            .with_failure_sink(sink.clone())
            .process(finalized(&f.key, "image/png"))
            .await;

        assert_eq!(
            outcome,
            PipelineOutcome::Processed {
                completed: vec![ThumbnailSize::S128, ThumbnailSize::S512],
                failed: vec![ThumbnailSize::S256]
            }
        );
        assert_eq!(*sink.sizes.lock().unwrap(), vec![256]);

        let record = get_photo_record(f.store.as_ref(), &f.record_id).await.unwrap();
        let variant = record.variant(&f.file_name).unwrap();
        assert!(!variant.thumb128.is_empty());
        assert!(variant.thumb256.is_empty());
        assert!(!variant.thumb512.is_empty());
    }

    #[tokio::test]
    async fn thumbnails_and_non_images_are_ignored() {
        let f = fixture().await;
        let writes = f.store.write_count();
        let objects_before = f.objects.len();
        let p = pipeline(&f, TaggingConverter { fail_size: None });

        let outcome = p
            .process(finalized(&format!("p1/thumb_128_{}", f.file_name), "image/png"))
            .await;
        assert_eq!(outcome, PipelineOutcome::Skipped(SkipReason::AlreadyThumbnail));

        let outcome = p.process(finalized("p1/meta.json", "application/json")).await;
        assert_eq!(
            outcome,
            PipelineOutcome::Skipped(SkipReason::NotAnImage(Some("application/json".into())))
        );

        assert_eq!(f.store.write_count(), writes);
        assert_eq!(f.objects.len(), objects_before);
    }

    #[tokio::test]
    async fn unnamed_and_missing_objects_fail_softly() {
        let f = fixture().await;
        let sink = Arc::new(RecordingSink::default());
        let p = pipeline(&f, TaggingConverter { fail_size: None }).with_failure_sink(sink.clone());

        let outcome = p
            .process(FinalizedObject {
                bucket: "bucket".into(),
                name: None,
                content_type: Some("image/png".into()),
            })
            .await;
        assert!(matches!(outcome, PipelineOutcome::Failed(_)));

        let outcome = p.process(finalized("p1/gone_x.png", "image/png")).await;
        assert!(matches!(outcome, PipelineOutcome::Failed(_)));
        assert_eq!(*sink.objects.lock().unwrap(), vec!["bucket", "p1/gone_x.png"]);
    }

    #[tokio::test]
    async fn unknown_variant_is_reported_per_size() {
        let f = fixture().await;
        let stray = format!("p1/{}_other.png", f.record_id);
        f.objects.put(&stray, b"x".to_vec(), "image/png", true).await.unwrap();
        let sink = Arc::new(RecordingSink::default());

        let outcome = pipeline(&f, TaggingConverter { fail_size: None })
            .with_failure_sink(sink.clone())
            .process(finalized(&stray, "image/png"))
            .await;

        assert_eq!(
            outcome,
            PipelineOutcome::Processed {
                completed: vec![],
                failed: ThumbnailSize::ALL.to_vec()
            }
        );
        assert_eq!(*sink.sizes.lock().unwrap(), vec![128, 256, 512]);
        let record = get_photo_record(f.store.as_ref(), &f.record_id).await.unwrap();
        assert_eq!(record.images.len(), 1);
    }
}
