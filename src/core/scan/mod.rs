//! Scan execution engine.
//!
//! A submission creates a `running` record, resolves the tool into an
//! [`ExecutionPlan`] and hands the record's only [`ScanWriter`] to a tracked
//! background task. That task runs the plan, classifies the outcome and
//! finalizes the record. Pollers only ever read snapshots from the store.

pub mod report;
pub mod resolver;
pub mod store;
pub mod streamer;
pub mod supervisor;
pub mod types;

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::core::config::GatewayConfig;
use crate::core::lifecycle::LifecycleComponent;
use report::ReportLookup;
use resolver::ToolResolver;
use store::{ScanStore, ScanWriter};
use supervisor::{ProcessSupervisor, SupervisedChild, TerminateOutcome};
use types::{ExecutionError, ExecutionPlan, ScanRecord, ScanRequest, ScanStatus};

/// Immediate answer to a submission. The scan keeps running in the background.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanAccepted {
    pub scan_id: String,
    pub status: ScanStatus,
    pub message: String,
}

#[derive(Clone)]
pub struct ScanEngine {
    store: ScanStore,
    supervisor: ProcessSupervisor,
    resolver: ToolResolver,
    simulation_delay: Duration,
    drain_timeout: Duration,
    tasks: TaskTracker,
}

impl ScanEngine {
    pub fn new(config: &GatewayConfig) -> Self {
        Self::with_settings(
            ToolResolver::new(config.dirsearch.clone()),
            config.simulation_delay(),
            config.kill_grace(),
        )
    }

    pub fn with_settings(
        resolver: ToolResolver,
        simulation_delay: Duration,
        kill_grace: Duration,
    ) -> Self {
        Self {
            store: ScanStore::new(),
            supervisor: ProcessSupervisor::new(kill_grace),
            resolver,
            simulation_delay,
            // Two signal rounds plus slack for the tasks to write their last line.
            drain_timeout: kill_grace * 2 + Duration::from_secs(1),
            tasks: TaskTracker::new(),
        }
    }

    pub async fn submit(&self, request: ScanRequest) -> ScanAccepted {
        let resolver = &self.resolver;
        self.launch(&request, |scan_id| {
            resolver.resolve(
                scan_id,
                &request.tool,
                &request.target,
                request.scan_type.as_deref(),
            )
        })
        .await
    }

    async fn launch(
        &self,
        request: &ScanRequest,
        plan_for: impl FnOnce(&str) -> ExecutionPlan,
    ) -> ScanAccepted {
        let (writer, plan) = self.store.create(request, plan_for).await;
        let scan_id = writer.scan_id().to_string();
        info!(
            "Scan [{}] created: {} -> {} ({})",
            scan_id,
            request.tool,
            request.target,
            plan.mode().as_str()
        );

        let engine = self.clone();
        self.tasks.spawn(async move {
            engine.execute(writer, plan).await;
        });

        ScanAccepted {
            scan_id,
            status: ScanStatus::Running,
            message: format!("Started {} scan", request.tool),
        }
    }

    async fn execute(&self, writer: ScanWriter, plan: ExecutionPlan) {
        match plan {
            ExecutionPlan::Streamed { argv, announce } => {
                self.run_streamed(&writer, &argv, announce).await
            }
            ExecutionPlan::FileOutput {
                argv,
                working_dir,
                output_file,
            } => {
                self.run_file_output(&writer, &argv, &working_dir, &output_file)
                    .await
            }
            ExecutionPlan::Simulated { tool, target } => {
                self.run_simulated(&writer, &tool, &target).await
            }
        }
        writer.refresh_report().await;
        info!("Scan [{}] finalized", writer.scan_id());
    }

    async fn run_streamed(&self, writer: &ScanWriter, argv: &[String], announce: bool) {
        if announce {
            writer
                .append(&format!("Attempting to run: {}\n", argv.join(" ")))
                .await;
        }

        match self.stream_process(writer, argv).await {
            Ok(status) => {
                info!("Scan [{}] exited with {}", writer.scan_id(), status);
                match status.code() {
                    Some(0) => {
                        writer
                            .finish(
                                ScanStatus::Completed,
                                Some("\nScan completed successfully (exit code: 0)\n"),
                            )
                            .await;
                    }
                    Some(code) => {
                        writer
                            .finish(
                                ScanStatus::Failed,
                                Some(&format!("\nScan failed with exit code: {}\n", code)),
                            )
                            .await;
                    }
                    None => {
                        writer
                            .finish(
                                ScanStatus::Failed,
                                Some("\nScan terminated by signal before completion\n"),
                            )
                            .await;
                    }
                }
            }
            Err(e) => {
                error!("Scan [{}] failed: {}", writer.scan_id(), e);
                writer
                    .finish(ScanStatus::Failed, Some(&format!("\nError: {}\n", e)))
                    .await;
            }
        }
    }

    /// Spawns, streams until both pipes close, then reaps the child. The
    /// registration is dropped on every path out of here.
    async fn stream_process(
        &self,
        writer: &ScanWriter,
        argv: &[String],
    ) -> Result<ExitStatus, ExecutionError> {
        let SupervisedChild {
            mut child,
            registration,
        } = self.supervisor.spawn(writer.scan_id(), argv, None, true)?;

        let streamed = streamer::stream_output(&mut child, writer).await;
        let status = child.wait().await;
        drop(registration);

        streamed?;
        Ok(status?)
    }

    async fn run_file_output(
        &self,
        writer: &ScanWriter,
        argv: &[String],
        working_dir: &Path,
        output_file: &Path,
    ) {
        writer
            .replace_output(format!(
                "Scan is writing to file only. See /api/results/{} for its contents.\n",
                writer.scan_id()
            ))
            .await;
        writer.set_progress(0).await;

        let status = match self.wait_process(writer, argv, working_dir).await {
            Ok(status) => status,
            Err(e) => {
                error!("Scan [{}] failed: {}", writer.scan_id(), e);
                writer.replace_output(format!("Error: {}\n", e)).await;
                writer.finish(ScanStatus::Failed, None).await;
                return;
            }
        };

        info!("Scan [{}] exited with {}", writer.scan_id(), status);
        if !status.success() {
            writer.finish(ScanStatus::Failed, None).await;
            return;
        }

        match tokio::fs::read(output_file).await {
            Ok(bytes) => {
                writer
                    .replace_output(String::from_utf8_lossy(&bytes).into_owned())
                    .await;
                writer.set_progress(100).await;
                writer.finish(ScanStatus::Completed, None).await;
            }
            Err(e) => {
                warn!(
                    "Scan [{}] exited cleanly but {} is unreadable: {}",
                    writer.scan_id(),
                    output_file.display(),
                    e
                );
                writer.finish(ScanStatus::Failed, None).await;
            }
        }
    }

    async fn wait_process(
        &self,
        writer: &ScanWriter,
        argv: &[String],
        working_dir: &Path,
    ) -> Result<ExitStatus, ExecutionError> {
        let SupervisedChild {
            mut child,
            registration,
        } = self
            .supervisor
            .spawn(writer.scan_id(), argv, Some(working_dir), false)?;
        let status = child.wait().await;
        drop(registration);
        Ok(status?)
    }

    async fn run_simulated(&self, writer: &ScanWriter, tool: &str, target: &str) {
        writer
            .append(&format!(
                "Unknown tool: {}. Running generic simulation.\nRunning {} simulation on {}...\n\n",
                tool, tool, target
            ))
            .await;
        tokio::time::sleep(self.simulation_delay).await;
        writer
            .finish(
                ScanStatus::Completed,
                Some(&format!(
                    "Tool execution completed successfully.\nResults saved for {}\n",
                    target
                )),
            )
            .await;
    }

    pub async fn get(&self, scan_id: &str) -> Option<ScanRecord> {
        self.store.get(scan_id).await
    }

    pub async fn materialize_report(&self, scan_id: &str) -> ReportLookup {
        self.store.materialize_report(scan_id).await
    }

    /// `None` when the scan id was never issued.
    pub async fn cancel(&self, scan_id: &str) -> Option<TerminateOutcome> {
        if !self.store.contains(scan_id).await {
            return None;
        }
        Some(self.supervisor.terminate(scan_id).await)
    }

    /// Polls until the scan reaches a terminal state.
    pub async fn wait_until_finished(&self, scan_id: &str, poll: Duration) -> Option<ScanRecord> {
        loop {
            let record = self.store.get(scan_id).await?;
            if record.status.is_terminal() {
                return Some(record);
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Terminates every live process, then waits for the scan tasks to write
    /// their final lines.
    pub async fn shutdown(&self) {
        let outcomes = self.supervisor.terminate_all().await;
        info!("Termination sweep finished ({} processes)", outcomes.len());

        self.tasks.close();
        if tokio::time::timeout(self.drain_timeout, self.tasks.wait())
            .await
            .is_err()
        {
            warn!(
                "{} scan tasks still running after {:?}",
                self.tasks.len(),
                self.drain_timeout
            );
        }
    }
}

#[async_trait]
impl LifecycleComponent for ScanEngine {
    async fn on_init(&mut self) -> Result<()> {
        info!("Scan engine initializing...");
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        info!("Scan engine shutting down...");
        self.shutdown().await;
        Ok(())
    }
}
