use aws_lambda_events::event::dynamodb::Event;
use bamboo_shared::{AppState, Config};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
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
    let state = Arc::new(AppState::from_env(config).await);

    run(service_fn(move |event: LambdaEvent<Event>| {
        let state = state.clone();
        async move {
            handler::handle_stream_event(state.store.as_ref(), state.objects.as_ref(), event.payload)
                .await;
            Ok::<(), Error>(())
        }
    }))
    .await
}
