use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, Error as S3Error, ObjectCannedAcl, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::{ObjectStore, StorageError, StorageResult};

/// SigV4 presigned URLs cannot outlive seven days.
const MAX_PRESIGN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// `delete_objects` succeeds even when individual keys fail.
fn check_delete_errors(errors: &[S3Error]) -> StorageResult<()> {
    if errors.is_empty() {
        return Ok(());
    }
    let failed: Vec<String> = errors
        .iter()
        .map(|e| {
            format!(
                "{} ({})",
                e.key().unwrap_or("?"),
                e.code().unwrap_or("unknown")
            )
        })
        .collect();
    tracing::error!("S3 delete_objects left {} object(s): {}", failed.len(), failed.join(", "));
    Err(StorageError::DeleteFailed(format!(
        "could not delete {}",
        failed.join(", ")
    )))
}

#[derive(Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        public: bool,
    ) -> StorageResult<()> {
        let size = data.len();
        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data));
        if public {
            req = req.acl(ObjectCannedAcl::PublicRead);
        }

        req.send().await.map_err(|e| {
            tracing::error!("S3 put_object failed for {}: {}", key, e);
            StorageError::UploadFailed(format!("{}: {}", key, e))
        })?;

        tracing::info!(bucket = %self.bucket, key = %key, size, "S3 upload successful");
        Ok(())
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_no_such_key() => StorageError::NotFound(key.to_string()),
                _ => StorageError::DownloadFailed(format!("{}: {}", key, e)),
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("{}: {}", key, e)))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn content_type(&self, key: &str) -> StorageResult<Option<String>> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(se) if se.is_not_found() => StorageError::NotFound(key.to_string()),
                _ => StorageError::DownloadFailed(format!("{}: {}", key, e)),
            })?;
        Ok(output.content_type().map(|s| s.to_string()))
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<usize> {
        let mut deleted = 0;
        let mut continuation: Option<String> = None;
        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = continuation.as_ref() {
                req = req.continuation_token(token);
            }
            let resp = req.send().await.map_err(|e| {
                tracing::error!("S3 list_objects_v2 failed for prefix {}: {}", prefix, e);
                StorageError::DeleteFailed(format!("S3 list failed: {}", e))
            })?;

            let objects: Vec<_> = resp
                .contents()
                .iter()
                .filter_map(|o| o.key())
                .filter_map(|k| ObjectIdentifier::builder().key(k).build().ok())
                .collect();

            if !objects.is_empty() {
                let count = objects.len();
                let delete_payload = Delete::builder()
                    .set_objects(Some(objects))
                    .build()
                    .map_err(|e| {
                        StorageError::DeleteFailed(format!("Failed to build S3 delete payload: {:?}", e))
                    })?;

                let output = self
                    .client
                    .delete_objects()
                    .bucket(&self.bucket)
                    .delete(delete_payload)
                    .send()
                    .await
                    .map_err(|e| StorageError::DeleteFailed(format!("S3 delete failed: {}", e)))?;
                check_delete_errors(output.errors())?;
                deleted += count;
            }

            if resp.is_truncated().unwrap_or(false) {
                continuation = resp.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        tracing::info!(bucket = %self.bucket, prefix = %prefix, deleted, "S3 prefix purged");
        Ok(deleted)
    }

    async fn signed_url(&self, key: &str, expires_at: DateTime<Utc>) -> StorageResult<String> {
        let remaining = (expires_at - Utc::now())
            .to_std()
            .map_err(|_| StorageError::Presign(format!("expiry {} is in the past", expires_at)))?;

        let lifetime = if remaining > MAX_PRESIGN_LIFETIME {
            tracing::debug!(
                "Requested expiry {} exceeds the S3 presign limit, clamping to 7 days",
                expires_at
            );
            MAX_PRESIGN_LIFETIME
        } else {
            remaining
        };

        let config = PresigningConfig::expires_in(lifetime)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(config)
            .await
            .map_err(|e| StorageError::Presign(format!("{}: {}", key, e)))?;

        Ok(presigned.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_key_delete_failures_are_errors() {
        assert!(check_delete_errors(&[]).is_ok());

        let errors = [S3Error::builder()
            .key("p1/r1_a.png")
            .code("AccessDenied")
            .message("Access Denied")
            .build()];
        let err = check_delete_errors(&errors).unwrap_err();
        assert!(matches!(&err, StorageError::DeleteFailed(msg) if msg.contains("p1/r1_a.png (AccessDenied)")));
    }
}
