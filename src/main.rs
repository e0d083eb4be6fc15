use anyhow::Result;
use mondash::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

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

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
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
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    tracing::info!(name = version::NAME, version = version::VERSION, "starting");

    let backend = repo::Backend::from_config(&app_config.storage).await?;

    let sink = notify::EmailSink::new(app_config.email.clone());
    if sink.is_enabled() {
        tracing::info!(host = %app_config.email.smtp_host, "alert emails enabled");
    }
    let monitor = Arc::new(monitor::AlertMonitor::new(
        backend.alerts.clone(),
        backend.devices.clone(),
        Arc::new(sink),
        app_config.monitoring.notify_timeout(),
    ));
    monitor
        .load()
        .await
        .map_err(|e| anyhow::anyhow!("load alerts: {}", e))?;

    let history = Arc::new(history::HistoryService::new(
        backend.records.clone(),
        backend.devices.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let scan_handle = scheduler::spawn(
        monitor.clone(),
        app_config.monitoring.scan_interval(),
        shutdown_rx,
    );

    if app_config.auth.token == config::DEFAULT_AUTH_TOKEN {
        tracing::warn!("auth.token is the built-in default; set AUTH_TOKEN for report ingestion");
    }
    let app = routes::app(history, monitor, &app_config.auth);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = scan_handle.await;

    Ok(())
}
