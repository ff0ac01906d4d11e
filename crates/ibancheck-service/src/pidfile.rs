//! Singleton process guard over a pid file.
//!
//! [`acquire`] runs strictly before the listener binds: it reads the pid
//! recorded in the guard file, probes the process table, and refuses to
//! start while that process is still alive. A dead or missing pid is
//! overwritten with the current process id.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sysinfo::{Pid, System};
use thiserror::Error;
use tracing::info;

/// Failure modes of the process guard. All of them abort startup.
#[derive(Debug, Error)]
pub enum PidFileError {
    /// The recorded process is still alive.
    #[error(
        "process {pid} is still running; stop it and delete the pid file {path} manually"
    )]
    AlreadyRunning { pid: u32, path: PathBuf },

    /// The guard file holds something that is not a pid.
    #[error("pid file {path} holds an invalid pid")]
    InvalidPid {
        path: PathBuf,
        source: std::num::ParseIntError,
    },

    /// Any I/O failure while creating, reading, or rewriting the file.
    #[error("pid file I/O failed for {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Take ownership of the guard file for this process.
///
/// State machine over the file:
/// - absent or empty: write the current pid, success
/// - recorded pid not in the process table: overwrite, success
/// - recorded pid alive: [`PidFileError::AlreadyRunning`]
pub fn acquire(path: impl AsRef<Path>) -> Result<(), PidFileError> {
    let path = path.as_ref();
    let io_err = |source| PidFileError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(io_err)?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(io_err)?;

    let recorded = contents.trim();
    if !recorded.is_empty() {
        let pid: u32 = recorded.parse().map_err(|source| PidFileError::InvalidPid {
            path: path.to_path_buf(),
            source,
        })?;

        if process_alive(pid) {
            return Err(PidFileError::AlreadyRunning {
                pid,
                path: path.to_path_buf(),
            });
        }
        info!(pid, "stale pid found in guard file, taking over");
    }

    file.set_len(0).map_err(io_err)?;
    file.seek(SeekFrom::Start(0)).map_err(io_err)?;
    write!(file, "{}", std::process::id()).map_err(io_err)?;

    info!(path = %path.display(), pid = std::process::id(), "pid file acquired");
    Ok(())
}

/// Probe the process table for `pid`.
fn process_alive(pid: u32) -> bool {
    let sys = System::new_all();
    sys.process(Pid::from_u32(pid)).is_some()
}
