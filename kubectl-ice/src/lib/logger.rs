use directories::ProjectDirs;
use log::LevelFilter;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::Result;
use crate::lib::error::ConfigError;

const LOG_FILE: &str = "kubectl-ice.log";

/// Platform log file location, falling back to the current directory
///
/// * **macOS**: `~/Library/Application Support/io.kubectl-ice.kubectl-ice/kubectl-ice.log`
/// * **Linux**: `~/.local/share/kubectl-ice/kubectl-ice.log`
/// * **Windows**: `C:\Users\<User>\AppData\Local\kubectl-ice\kubectl-ice\data\kubectl-ice.log`
pub fn log_path() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("io", "kubectl-ice", "kubectl-ice") {
        let log_dir = proj_dirs.data_local_dir();
        fs::create_dir_all(log_dir).map_err(|e| {
            ConfigError::FileError(format!("Failed to create log directory: {}", e))
        })?;
        return Ok(log_dir.join(LOG_FILE));
    }

    Ok(std::env::current_dir()
        .map_err(|e| ConfigError::FileError(format!("Failed to get current directory: {}", e)))?
        .join(LOG_FILE))
}

/// Initialize the logger with file and stderr output
///
/// # Arguments
///
/// * `verbose` - Enable debug level logging
/// * `quiet` - Suppress stderr output (logs still written to file)
///
/// Stdout carries the report, so console logging always goes to stderr.
pub fn init_logger(verbose: bool, quiet: bool) -> Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_path = log_path()?;
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| ConfigError::FileError(format!("Failed to open log file: {}", e)))?;

    let mut builder = env_logger::Builder::new();
    builder.filter_level(log_level).format_timestamp_secs();

    if quiet {
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(env_logger::Target::Pipe(Box::new(TeeWriter {
            stderr: std::io::stderr(),
            file: log_file,
        })));
    }

    builder.init();
    log::debug!("Logging to: {}", log_path.display());

    Ok(())
}

/// Writes every log line to stderr and the log file
struct TeeWriter {
    stderr: std::io::Stderr,
    file: fs::File,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stderr.write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stderr.flush()?;
        self.file.flush()
    }
}
