use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::types::ExecutionError;
use crate::platform::{NativePlatform, Platform};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminateOutcome {
    /// No process was registered for the scan.
    NotRunning,
    /// The process exited within the grace period after the termination signal.
    Exited,
    /// The process ignored the termination signal and was force-killed.
    Killed,
    /// Still registered after the forced kill grace period.
    Unresponsive,
}

#[derive(Clone)]
struct ProcessHandle {
    pid: Option<u32>,
    released: watch::Receiver<()>,
}

/// Live process handles keyed by scan id.
///
/// A handle is registered at spawn and removed when the owning
/// [`Registration`] drops, which happens on every exit path of the scan task.
/// Termination goes through the pid; the streaming task keeps sole ownership
/// of the `Child`.
#[derive(Clone)]
pub struct ProcessSupervisor {
    handles: Arc<Mutex<HashMap<String, ProcessHandle>>>,
    grace: Duration,
}

/// A spawned child plus the guard that keeps it registered.
pub struct SupervisedChild {
    pub child: Child,
    pub registration: Registration,
}

pub struct Registration {
    scan_id: String,
    handles: Arc<Mutex<HashMap<String, ProcessHandle>>>,
    _released: watch::Sender<()>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        lock(&self.handles).remove(&self.scan_id);
    }
}

fn lock(
    handles: &Mutex<HashMap<String, ProcessHandle>>,
) -> MutexGuard<'_, HashMap<String, ProcessHandle>> {
    handles.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ProcessSupervisor {
    pub fn new(grace: Duration) -> Self {
        Self {
            handles: Arc::new(Mutex::new(HashMap::new())),
            grace,
        }
    }

    /// Launches `argv` and registers the child under `scan_id`. With
    /// `capture_output` stdout and stderr are piped for streaming, otherwise
    /// discarded. A missing binary maps to [`ExecutionError::ToolNotInstalled`].
    pub fn spawn(
        &self,
        scan_id: &str,
        argv: &[String],
        working_dir: Option<&Path>,
        capture_output: bool,
    ) -> Result<SupervisedChild, ExecutionError> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            ExecutionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty argument vector",
            ))
        })?;

        let output = || {
            if capture_output {
                Stdio::piped()
            } else {
                Stdio::null()
            }
        };
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(output())
            .stderr(output())
            .kill_on_drop(true);
        // Own group, so termination also reaches helpers the tool forks.
        #[cfg(unix)]
        cmd.process_group(0);
        if let Some(dir) = working_dir {
            if !dir.is_dir() {
                return Err(ExecutionError::InstallDirMissing {
                    dir: dir.to_path_buf(),
                });
            }
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExecutionError::ToolNotInstalled {
                    program: program.clone(),
                }
            } else {
                ExecutionError::Io(e)
            }
        })?;

        let pid = child.id();
        info!("Spawned [{}] for scan [{}] (pid {:?})", program, scan_id, pid);

        let (released_tx, released_rx) = watch::channel(());
        lock(&self.handles).insert(
            scan_id.to_string(),
            ProcessHandle {
                pid,
                released: released_rx,
            },
        );

        Ok(SupervisedChild {
            child,
            registration: Registration {
                scan_id: scan_id.to_string(),
                handles: self.handles.clone(),
                _released: released_tx,
            },
        })
    }

    pub fn is_running(&self, scan_id: &str) -> bool {
        lock(&self.handles).contains_key(scan_id)
    }

    pub fn running(&self) -> Vec<String> {
        lock(&self.handles).keys().cloned().collect()
    }

    /// Sends a termination signal, then a forced kill if the process is still
    /// registered after the grace period.
    pub async fn terminate(&self, scan_id: &str) -> TerminateOutcome {
        let Some(handle) = lock(&self.handles).get(scan_id).cloned() else {
            return TerminateOutcome::NotRunning;
        };
        let Some(pid) = handle.pid else {
            return TerminateOutcome::NotRunning;
        };

        info!("Terminating scan [{}] (pid {})", scan_id, pid);
        signal(NativePlatform::terminate_command(pid), pid).await;
        if wait_released(handle.released.clone(), self.grace).await {
            return TerminateOutcome::Exited;
        }

        warn!(
            "Scan [{}] ignored termination for {:?}, forcing kill",
            scan_id, self.grace
        );
        signal(NativePlatform::force_kill_command(pid), pid).await;
        if wait_released(handle.released, self.grace).await {
            TerminateOutcome::Killed
        } else {
            error!("Scan [{}] (pid {}) is still running after kill", scan_id, pid);
            TerminateOutcome::Unresponsive
        }
    }

    /// Terminates every registered process concurrently. Individual failures
    /// are logged and never stop the sweep.
    pub async fn terminate_all(&self) -> Vec<(String, TerminateOutcome)> {
        let mut set = JoinSet::new();
        for scan_id in self.running() {
            let supervisor = self.clone();
            set.spawn(async move {
                let outcome = supervisor.terminate(&scan_id).await;
                (scan_id, outcome)
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((scan_id, outcome)) => {
                    info!("Shutdown: scan [{}] -> {:?}", scan_id, outcome);
                    outcomes.push((scan_id, outcome));
                }
                Err(e) => warn!("Shutdown: termination task failed: {}", e),
            }
        }
        outcomes
    }
}

async fn signal(mut cmd: Command, pid: u32) {
    match cmd.stdout(Stdio::null()).stderr(Stdio::null()).status().await {
        Ok(status) if !status.success() => {
            warn!("Signal to pid {} exited with {}", pid, status)
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to signal pid {}: {}", pid, e),
    }
}

/// True once the registration has been dropped, false on timeout.
async fn wait_released(mut released: watch::Receiver<()>, grace: Duration) -> bool {
    tokio::time::timeout(grace, async {
        while released.changed().await.is_ok() {}
    })
    .await
    .is_ok()
}
