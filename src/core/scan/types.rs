use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, ScanStatus::Running)
    }
}

/// Status only moves forward: running -> completed | failed.
pub fn can_transition(from: ScanStatus, to: ScanStatus) -> bool {
    from == ScanStatus::Running && to.is_terminal()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Streamed,
    FileOutput,
    Simulated,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Streamed => "streamed",
            ExecutionMode::FileOutput => "file_output",
            ExecutionMode::Simulated => "simulated",
        }
    }
}

/// What the resolver decided to run for a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionPlan {
    /// Merged stdout/stderr is streamed into the record as it arrives.
    /// `announce` prefixes the output with the command line being run.
    Streamed { argv: Vec<String>, announce: bool },
    /// The tool writes its results to `output_file`; the record is filled from
    /// that file once the process exits.
    FileOutput {
        argv: Vec<String>,
        working_dir: PathBuf,
        output_file: PathBuf,
    },
    /// No process. A canned narrative is written after a fixed delay.
    Simulated { tool: String, target: String },
}

pub const SIMULATED_PROGRAM: &str = "<simulated>";

impl ExecutionPlan {
    pub fn mode(&self) -> ExecutionMode {
        match self {
            ExecutionPlan::Streamed { .. } => ExecutionMode::Streamed,
            ExecutionPlan::FileOutput { .. } => ExecutionMode::FileOutput,
            ExecutionPlan::Simulated { .. } => ExecutionMode::Simulated,
        }
    }

    /// Argument vector recorded on the scan for display and audit.
    pub fn command(&self) -> Vec<String> {
        match self {
            ExecutionPlan::Streamed { argv, .. } | ExecutionPlan::FileOutput { argv, .. } => {
                argv.clone()
            }
            ExecutionPlan::Simulated { tool, target } => vec![
                SIMULATED_PROGRAM.to_string(),
                tool.clone(),
                target.clone(),
            ],
        }
    }
}

/// A scan request as accepted by the engine.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ScanRequest {
    pub tool: String,
    pub target: String,
    #[serde(default)]
    pub command: String,
    #[serde(default, alias = "scanType")]
    pub scan_type: Option<String>,
}

/// Snapshot of a scan record. Pollers always receive clones of this.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScanRecord {
    pub scan_id: String,
    pub status: ScanStatus,
    pub output: String,
    pub command: Vec<String>,
    pub requested_command: String,
    pub mode: ExecutionMode,
    pub tool: String,
    pub target: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub progress: Option<u8>,
    pub report: Option<String>,
}

impl ScanRecord {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Command '{program}' not found. Tool may not be installed.")]
    ToolNotInstalled { program: String },
    #[error("Install directory {} not found. Tool may not be installed.", .dir.display())]
    InstallDirMissing { dir: PathBuf },
    #[error("{0}")]
    Io(#[from] std::io::Error),
}
