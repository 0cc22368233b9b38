//! Simulated devices whose running configuration lives in a directory.
//!
//! Each device address maps to `<state_dir>/<address>.cfg`; characters that
//! are not safe in file names are replaced with `_`. A missing file is an
//! empty running configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::LoadMode;
use crate::ports::{Credentials, DriverFactory, DriverFuture, DriverSession, PortError};

use super::config_text::ConfigText;

/// Driver factory that keeps device state on disk.
#[derive(Debug, Clone)]
pub struct FileDriver {
    state_dir: PathBuf,
}

impl FileDriver {
    /// Creates a driver storing device state under `state_dir`.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self { state_dir: state_dir.into() }
    }

    /// Path of the state file for `address`.
    #[must_use]
    pub fn state_file(&self, address: &str) -> PathBuf {
        let name: String = address
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.state_dir.join(format!("{name}.cfg"))
    }
}

impl DriverFactory for FileDriver {
    fn connect<'a>(
        &'a self,
        address: &'a str,
        _credentials: &'a Credentials,
        _timeout: Duration,
    ) -> DriverFuture<'a, Box<dyn DriverSession>> {
        Box::pin(async move {
            if !self.state_dir.is_dir() {
                return Err(format!(
                    "device state directory {} does not exist",
                    self.state_dir.display()
                )
                .into());
            }
            let path = self.state_file(address);
            let running = read_running(&path)?;
            let session: Box<dyn DriverSession> =
                Box::new(FileSession { path, running, candidate: None });
            Ok(session)
        })
    }
}

fn read_running(path: &Path) -> Result<ConfigText, PortError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(ConfigText::parse(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigText::default()),
        Err(e) => Err(format!("failed to read {}: {e}", path.display()).into()),
    }
}

struct FileSession {
    path: PathBuf,
    running: ConfigText,
    candidate: Option<ConfigText>,
}

impl DriverSession for FileSession {
    fn load<'a>(&'a mut self, text: &'a str, mode: LoadMode) -> DriverFuture<'a, ()> {
        Box::pin(async move {
            let candidate = self.running.stage(text, mode);
            if candidate.is_empty() {
                return Err("refusing to load an empty candidate".into());
            }
            self.candidate = Some(candidate);
            Ok(())
        })
    }

    fn diff(&mut self) -> DriverFuture<'_, String> {
        Box::pin(async move {
            let candidate = self.candidate.as_ref().ok_or("no candidate loaded")?;
            Ok(self.running.diff(candidate))
        })
    }

    fn commit(&mut self) -> DriverFuture<'_, ()> {
        Box::pin(async move {
            let candidate = self.candidate.take().ok_or("no candidate loaded")?;
            std::fs::write(&self.path, candidate.render())
                .map_err(|e| format!("failed to write {}: {e}", self.path.display()))?;
            self.running = candidate;
            Ok(())
        })
    }

    fn discard(&mut self) -> DriverFuture<'_, ()> {
        Box::pin(async move {
            self.candidate = None;
            Ok(())
        })
    }

    fn confirm(&mut self) -> DriverFuture<'_, String> {
        Box::pin(async move {
            let on_disk = read_running(&self.path)?;
            if on_disk != self.running {
                return Err(format!("{} does not hold the committed config", self.path.display())
                    .into());
            }
            Ok(on_disk
                .value_of("hostname")
                .map_or_else(|| "committed".to_string(), |h| format!("hostname {h}")))
        })
    }

    fn close(&mut self) {
        self.candidate = None;
    }
}
