use anyhow::Result;
use fleetstats::*;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let docker_repo: Arc<dyn inspector::RuntimeInspector> =
        Arc::new(docker_repo::DockerRepo::connect()?);
    let status = inspector::check_runtime(docker_repo.as_ref()).await;
    if status.running {
        tracing::info!("Connected to container runtime");
    } else {
        tracing::warn!(
            error = status.error.as_deref().unwrap_or_default(),
            "Container runtime not reachable yet; fleet queries will report no containers"
        );
    }

    let cache: Arc<dyn cache::MetricsCache> = Arc::new(
        cache::InMemoryMetricsCache::new(app_config.cache.evict_after_cycles)
            .with_max_idle(app_config.cache_max_idle()),
    );
    let engine = Arc::new(aggregator::AggregationEngine::new(
        docker_repo.clone(),
        cache.clone(),
        app_config.engine_settings(),
    ));

    let shutdown = CancellationToken::new();
    let publisher = Arc::new(publisher::LivePublisher::new(
        engine.clone(),
        app_config.live_interval(),
        app_config.publishing.subscriber_buffer,
        shutdown.clone(),
    ));

    let stats_handle = worker::spawn_stats_log(
        worker::StatsLogDeps {
            publisher: publisher.clone(),
            cache,
            shutdown: shutdown.clone(),
        },
        Duration::from_secs(app_config.monitoring.stats_log_interval_secs),
    );

    let app = routes::app(engine, publisher, docker_repo, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    // Cancelling the root token ends every live subscription, which lets open
    // WebSocket/SSE streams finish so graceful shutdown can complete.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    let _ = stats_handle.await;
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    tracing::info!("Received shutdown signal");
                    shutdown.cancel();
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Received shutdown signal");
    shutdown.cancel();
}
