use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::chat::ChatBroker;
use crate::core::config::GatewayConfig;
use crate::core::lifecycle::LifecycleManager;
use crate::core::persistence::ReportStore;
use crate::core::terminal::print_goodbye;
use crate::core::scan::ScanEngine;
use crate::interfaces::web::{ApiServer, ApiServerConfig};

/// Runs the gateway in the foreground until Ctrl+C.
///
/// Shutdown follows attach order: the API stops accepting, the engine
/// terminates and awaits every registered process, then the database closes.
pub async fn run_gateway(
    data_dir: &Path,
    config: GatewayConfig,
    log_tx: tokio::sync::broadcast::Sender<String>,
) -> Result<()> {
    info!("Starting reconlab gateway (data dir: {})", data_dir.display());

    let reports = match ReportStore::open(data_dir).await {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Report store unavailable, continuing without persistence: {:#}", e);
            None
        }
    };
    let engine = ScanEngine::new(&config);

    let api = ApiServer::new(ApiServerConfig {
        engine: engine.clone(),
        reports: reports.clone(),
        chat: ChatBroker::new(config.chat.clone()),
        file_output_dir: config.dirsearch.output_dir(),
        log_tx,
        cors_origins: config.cors_origins.clone(),
        api_host: config.api_host.clone(),
        api_port: config.api_port,
    });

    let mut lifecycle = LifecycleManager::new();
    lifecycle.attach(Arc::new(Mutex::new(api)));
    lifecycle.attach(Arc::new(Mutex::new(engine)));
    if let Some(store) = reports {
        lifecycle.attach(Arc::new(Mutex::new(store)));
    }

    if let Err(e) = lifecycle.start().await {
        lifecycle.shutdown().await?;
        return Err(e);
    }
    info!("Gateway ready. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down gateway...");
    lifecycle.shutdown().await?;
    print_goodbye();
    Ok(())
}
