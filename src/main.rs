use anyhow::Result;
use gridwatch::config::Config;
use gridwatch::grid::StromGedachtClient;
use gridwatch::logging::{get_logger, init_logging};
use gridwatch::monitor::{BroadcastSink, MonitorRegistry};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid config: {}", e))?;
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    let logger = get_logger("main");
    logger.info(&format!("Gridwatch {} starting up", env!("APP_VERSION")));

    let client = StromGedachtClient::new(&config.api)
        .map_err(|e| anyhow::anyhow!("Failed to create grid API client: {}", e))?;
    let sink = BroadcastSink::default();
    let registry = Arc::new(MonitorRegistry::new(
        Arc::new(client),
        Arc::new(sink.clone()),
        Duration::from_millis(config.poll_interval_ms),
    ));

    for monitor in &config.monitors {
        if let Err(e) = registry
            .register(&monitor.zip, monitor.name.clone(), Some(monitor.offsets.as_slice()))
            .await
        {
            logger.error(&format!("Skipping monitor for {}: {}", monitor.zip, e));
        }
    }
    logger.info(&format!("{} monitor(s) running", registry.len().await));

    #[cfg(feature = "web")]
    let web_task = if config.web.enabled {
        let state = gridwatch::web::AppState {
            registry: registry.clone(),
            events: sink.clone(),
            config: Arc::new(config.clone()),
        };
        let host = config.web.host.clone();
        let port = config.web.port;
        let web_logger = get_logger("web");
        Some(tokio::spawn(async move {
            if let Err(e) = gridwatch::web::serve(state, &host, port).await {
                web_logger.error(&format!("Web server error: {}", e));
            }
        }))
    } else {
        None
    };

    tokio::signal::ctrl_c().await?;
    logger.info("Shutdown requested");

    #[cfg(feature = "web")]
    if let Some(task) = web_task {
        task.abort();
    }

    registry.shutdown().await;
    logger.info("Shutdown complete");
    Ok(())
}
