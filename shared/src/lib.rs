pub mod config;
pub mod contact;
pub mod email;
pub mod search;

use aws_config::BehaviorVersion;
use bamboo_atoms::storage::{ObjectStore, S3ObjectStore};
use bamboo_atoms::store::{DocumentStore, DynamoDocumentStore};
use photo_pipeline_block::{ImageConverter, MagickConverter, ResizeConverter};
use std::sync::Arc;

pub use config::{Config, ConfigError, ConverterKind};
pub use email::{Mailer, SesMailer};

/// Handles shared by every invocation of a lambda.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Config,
}

impl AppState {
    /// Build AWS-backed handles from the default credential chain.
    pub async fn from_env(config: Config) -> Self {
        let aws = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let dynamo_client = aws_sdk_dynamodb::Client::new(&aws);
        let s3_client = aws_sdk_s3::Client::new(&aws);
        let ses_client = aws_sdk_sesv2::Client::new(&aws);

        tracing::info!(
            "AppState ready (table {}, bucket {})",
            config.table_name,
            config.bucket_name
        );
        Self {
            store: Arc::new(DynamoDocumentStore::new(dynamo_client, &config.table_name)),
            objects: Arc::new(S3ObjectStore::new(s3_client, &config.bucket_name)),
            mailer: Arc::new(SesMailer::new(ses_client)),
            config,
        }
    }

    pub fn converter(&self) -> Arc<dyn ImageConverter> {
        match self.config.converter {
            ConverterKind::Resize => Arc::new(ResizeConverter),
            ConverterKind::ImageMagick => Arc::new(MagickConverter::default()),
        }
    }
}
