use anyhow::{Context, Result};
use capture_agent::camera::FswebcamSource;
use capture_agent::cli::Args;
use capture_agent::config::RunConfig;
use capture_agent::lifecycle::LifecycleConfigurator;
use capture_agent::scheduler::Scheduler;
use capture_agent::store::S3ObjectStore;
use capture_agent::uploader::FrameUploader;
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = RunConfig::resolve(
        args,
        std::env::var("AWS_ACCESS_KEY_ID").ok(),
        std::env::var("AWS_SECRET_ACCESS_KEY").ok(),
    )
    .context("invalid configuration")?;

    init_tracing(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bucket = %config.bucket,
        device = %config.device,
        interval_secs = config.interval_secs,
        ttl_days = config.retention_days,
        "starting capture agent"
    );

    init_metrics(config.metrics_port)?;

    let store = Arc::new(S3ObjectStore::new(&config).await);
    let camera = FswebcamSource::new(config.device.as_str(), config.resolution.as_str());
    let uploader = FrameUploader::new(store.clone(), &config.folder, config.retention_days);
    let lifecycle = LifecycleConfigurator::new(store, &config.folder, config.retention_days);

    let mut scheduler = Scheduler::new(camera, uploader, lifecycle, config.interval());

    tokio::select! {
        _ = scheduler.run() => {}
        _ = shutdown_signal() => {
            info!("shutting down");
        }
    }

    let stats = scheduler.stats();
    info!(
        cycles = stats.cycles,
        uploads = stats.uploads_ok,
        failures = stats.failures,
        "final stats"
    );

    Ok(())
}

/// Initialize tracing/logging.
fn init_tracing(config: &RunConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Initialize the Prometheus metrics exporter.
fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
