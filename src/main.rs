use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hookflow::scheduler::{AsyncScheduler, QueueScheduler, Scheduler, SyncScheduler};
use hookflow::{DispatchConfig, EventDispatcher, SchedulerSettings, build_router};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hookflow=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "hookflow.toml".to_string());
    let config = match DispatchConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error loading {config_path}: {err}");
            std::process::exit(1);
        }
    };

    let scheduler: Arc<dyn Scheduler> = match config.scheduler {
        SchedulerSettings::Sync => Arc::new(SyncScheduler::new()),
        SchedulerSettings::Async => Arc::new(AsyncScheduler::new().with_scheduling_metrics()),
        SchedulerSettings::Queue {
            queue_capacity,
            workers,
        } => Arc::new(
            QueueScheduler::builder(queue_capacity, workers)
                .with_scheduling_metrics()
                .build(),
        ),
    };

    // Handlers are registered by the embedding application; with none, the
    // server still authenticates and acknowledges every delivery.
    let dispatcher = EventDispatcher::new(vec![], config.webhook_secret.as_bytes(), scheduler);
    let app = build_router(Arc::new(dispatcher), &config.webhook_route);

    tracing::info!(address = %config.address, route = %config.webhook_route, "listening");

    let listener = tokio::net::TcpListener::bind(&config.address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
