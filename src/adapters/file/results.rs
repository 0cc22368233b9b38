//! Result sink appending JSON lines to a file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::model::ReconciliationResult;
use crate::ports::{PortError, ResultSink};

/// Appends one JSON object per result to a file.
#[derive(Debug)]
pub struct JsonLinesResultSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesResultSink {
    /// Creates a sink appending to `path`. The file is created on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }
}

impl ResultSink for JsonLinesResultSink {
    fn publish(&self, result: &ReconciliationResult) -> Result<(), PortError> {
        let mut line = serde_json::to_string(result)?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
