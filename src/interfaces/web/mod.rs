pub mod error;
mod handlers;
mod router;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use std::convert::Infallible;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::core::chat::ChatBroker;
use crate::core::lifecycle::LifecycleComponent;
use crate::core::persistence::ReportStore;
use crate::core::scan::ScanEngine;

const SERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(3);

pub struct ApiServerConfig {
    pub engine: ScanEngine,
    pub reports: Option<ReportStore>,
    pub chat: ChatBroker,
    pub file_output_dir: PathBuf,
    pub log_tx: tokio::sync::broadcast::Sender<String>,
    pub cors_origins: Vec<String>,
    pub api_host: String,
    pub api_port: u16,
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) engine: ScanEngine,
    /// `None` when the database could not be opened; the gateway keeps running.
    pub(crate) reports: Option<ReportStore>,
    pub(crate) chat: ChatBroker,
    pub(crate) file_output_dir: PathBuf,
    pub(crate) log_tx: tokio::sync::broadcast::Sender<String>,
    pub(crate) cors_origins: Vec<String>,
    pub(crate) api_host: String,
    pub(crate) api_port: u16,
}

pub struct ApiServer {
    state: AppState,
    cancel: CancellationToken,
    server: Option<JoinHandle<()>>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig) -> Self {
        Self {
            state: AppState {
                engine: config.engine,
                reports: config.reports,
                chat: config.chat,
                file_output_dir: config.file_output_dir,
                log_tx: config.log_tx,
                cors_origins: config.cors_origins,
                api_host: config.api_host,
                api_port: config.api_port,
            },
            cancel: CancellationToken::new(),
            server: None,
        }
    }
}

async fn sse_logs_endpoint(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.log_tx.subscribe();
    let stream = BroadcastStream::new(receiver).map(|msg| match msg {
        Ok(log) => Ok(Event::default().data(log)),
        Err(_) => Ok(Event::default().data("Log stream lagged")),
    });

    Sse::new(stream)
}

#[async_trait]
impl LifecycleComponent for ApiServer {
    async fn on_init(&mut self) -> Result<()> {
        info!("API Server Interface initializing...");
        Ok(())
    }

    async fn on_start(&mut self) -> Result<()> {
        let addr = format!("{}:{}", self.state.api_host, self.state.api_port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding API server to {}", addr))?;
        info!("API Server running at http://{addr}");

        let app = router::build_api_router(self.state.clone());
        let stop = self.cancel.clone().cancelled_owned();
        self.server = Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(stop).await {
                error!("API Server crashed: {}", e);
            }
        }));
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("API Server Interface shutting down...");
        self.cancel.cancel();
        // Open SSE log streams never finish on their own.
        if let Some(server) = self.server.take()
            && tokio::time::timeout(SERVER_DRAIN_TIMEOUT, server).await.is_err()
        {
            warn!("API Server did not drain within {:?}", SERVER_DRAIN_TIMEOUT);
        }
        Ok(())
    }
}
