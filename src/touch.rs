/// Keep-alive writes: truncate the target and write a fixed payload.
use chrono::{DateTime, Local};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Content of the target after every touch.
pub const PAYLOAD: &str = "echo? echo?";

/// Record of one successful touch.
#[derive(Debug, Clone)]
pub struct TouchRecord {
    /// Counter value after this touch (1-based).
    pub count: u64,
    pub at: DateTime<Local>,
}

/// Errors that can occur while touching the target.
#[derive(Debug)]
pub enum TouchError {
    /// Failed to open (create/truncate) the target.
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Opened, but the write itself failed.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for TouchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TouchError::Open { path, source } => {
                write!(f, "failed to open {} for writing: {}", path.display(), source)
            }
            TouchError::Write { path, source } => {
                write!(f, "failed to write to {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for TouchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TouchError::Open { source, .. } => Some(source),
            TouchError::Write { source, .. } => Some(source),
        }
    }
}

/// Owns the target path and the process-lifetime touch counter.
///
/// The counter only moves after a write returns successfully, so a failed
/// touch leaves it where it was.
pub struct Toucher {
    path: PathBuf,
    touches: u64,
}

impl Toucher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            touches: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of successful touches so far.
    pub fn touches(&self) -> u64 {
        self.touches
    }

    /// Open the target in truncate mode, write the payload, close it.
    pub fn touch(&mut self) -> Result<TouchRecord, TouchError> {
        write_payload(&self.path)?;
        self.touches += 1;

        let record = TouchRecord {
            count: self.touches,
            at: Local::now(),
        };
        tracing::info!(
            path = %self.path.display(),
            touches = record.count,
            at = %record.at.format("%Y-%m-%d %H:%M:%S"),
            "touched keep-alive file"
        );
        Ok(record)
    }
}

/// Run one touch on the blocking pool.
///
/// A hung `open` or `write` (dead mount) then stalls only the pool thread;
/// the runtime thread keeps servicing signals.
pub async fn touch_detached(mut toucher: Toucher) -> (Toucher, Result<TouchRecord, TouchError>) {
    let joined = tokio::task::spawn_blocking(move || {
        let result = toucher.touch();
        (toucher, result)
    })
    .await;

    match joined {
        Ok(out) => out,
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}

/// The handle is dropped (closed) on return, whether or not the write succeeded.
fn write_payload(path: &Path) -> Result<(), TouchError> {
    let mut file = File::create(path).map_err(|e| TouchError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.write_all(PAYLOAD.as_bytes())
        .map_err(|e| TouchError::Write {
            path: path.to_path_buf(),
            source: e,
        })
}
