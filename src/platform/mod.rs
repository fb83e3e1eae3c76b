use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "RECONLAB_DATA_DIR";

/// Platform-specific operations abstracted behind a common interface.
/// Each OS provides its own `NativePlatform` implementation so call sites
/// remain free of `#[cfg]` blocks.
pub trait Platform {
    /// Build a **tokio** `Command` asking the process tree led by `pid` to terminate.
    fn terminate_command(pid: u32) -> tokio::process::Command;

    /// Build a **tokio** `Command` that kills the process tree led by `pid` unconditionally.
    fn force_kill_command(pid: u32) -> tokio::process::Command;

    /// Send a termination signal to the process identified by `pid`.
    fn kill_process(pid: &str) -> std::io::Result<std::process::Output>;

    /// Spawn a child that tails / follows a log file.
    fn tail_file(path: &Path) -> std::io::Result<std::process::Child>;

    /// Set restrictive *directory* permissions (0o700 on Unix, no-op on Windows).
    fn restrict_dir_permissions(path: &Path);

    /// Set restrictive *file* permissions (0o600 on Unix, no-op on Windows).
    fn restrict_file_permissions(path: &Path);

    /// Root data directory.
    /// Unix: `~/.reconlab`, Windows: `%APPDATA%\reconlab`.
    fn data_dir() -> PathBuf;
}

/// `RECONLAB_DATA_DIR` wins over the platform default when set and non-empty.
fn resolve_data_dir(default: PathBuf) -> PathBuf {
    resolve_data_dir_from(std::env::var_os(DATA_DIR_ENV).map(PathBuf::from), default)
}

fn resolve_data_dir_from(overridden: Option<PathBuf>, default: PathBuf) -> PathBuf {
    match overridden {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => default,
    }
}

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::NativePlatform;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::NativePlatform;
