use aws_lambda_events::event::s3::S3Event;
use bamboo_shared::{AppState, Config};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use photo_pipeline_block::ThumbnailPipeline;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .without_time()
        .with_ansi(false)
        .init();

    let config = Config::from_env()?;
    let state = AppState::from_env(config).await;
    tracing::info!(
        "🚀 Thumbnail pipeline ready for bucket {} ({:?})",
        state.config.bucket_name,
        state.config.converter
    );
    let pipeline = Arc::new(ThumbnailPipeline::new(
        state.store.clone(),
        state.objects.clone(),
        state.converter(),
        state.config.signed_url_expires_at,
    ));
    let objects = state.objects.clone();

    run(service_fn(move |event: LambdaEvent<S3Event>| {
        let pipeline = pipeline.clone();
        let objects = objects.clone();
        async move {
            handler::handle_s3_event(&pipeline, objects.as_ref(), event.payload).await;
            Ok::<(), Error>(())
        }
    }))
    .await
}
