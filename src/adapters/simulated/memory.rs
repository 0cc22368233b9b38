//! In-process simulated devices with call accounting and fault injection.
//!
//! Used by the test suite as the driver double: every session operation is
//! counted, faults can be armed per device, and a load that overlaps another
//! load on the same device panics so interleaving is caught immediately.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::model::LoadMode;
use crate::ports::{Credentials, DriverFactory, DriverFuture, DriverSession};

use super::config_text::ConfigText;

/// Failure modes that can be armed on a simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    /// `connect` fails immediately.
    Unreachable,
    /// `connect` never completes.
    StallConnect,
    /// `load` rejects every candidate.
    RejectLoad,
    /// `commit` fails after the candidate was loaded.
    FailCommit,
    /// `confirm` fails after a commit.
    FailConfirm,
}

/// Number of calls made against the driver, across all sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `DriverFactory::connect` calls.
    pub connect: usize,
    /// `DriverSession::load` calls.
    pub load: usize,
    /// `DriverSession::diff` calls.
    pub diff: usize,
    /// `DriverSession::commit` calls.
    pub commit: usize,
    /// `DriverSession::discard` calls.
    pub discard: usize,
    /// `DriverSession::confirm` calls.
    pub confirm: usize,
    /// Sessions closed.
    pub close: usize,
}

#[derive(Debug, Default)]
struct Device {
    running: ConfigText,
    revision: u64,
    faults: HashSet<Fault>,
    loading: bool,
}

#[derive(Debug, Default)]
struct State {
    devices: HashMap<String, Device>,
    counts: CallCounts,
}

/// Driver factory backed by in-memory devices.
///
/// Cloning shares the same devices and counters.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    state: Arc<Mutex<State>>,
    load_delay: Duration,
    commit_delay: Duration,
}

impl MemoryDriver {
    /// Creates a driver with no devices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `load` take at least `delay`, widening the window in
    /// which overlapping loads would be detected.
    #[must_use]
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Makes every `commit` take at least `delay`.
    #[must_use]
    pub fn with_commit_delay(mut self, delay: Duration) -> Self {
        self.commit_delay = delay;
        self
    }

    /// Adds (or resets) a device at `address` with the given running config.
    pub fn add_device(&self, address: &str, running: &str) {
        let device = Device { running: ConfigText::parse(running), ..Device::default() };
        self.lock().devices.insert(address.to_string(), device);
    }

    /// Arms `fault` on the device at `address`.
    pub fn arm(&self, address: &str, fault: Fault) {
        if let Some(device) = self.lock().devices.get_mut(address) {
            device.faults.insert(fault);
        }
    }

    /// Clears every fault on the device at `address`.
    pub fn disarm_all(&self, address: &str) {
        if let Some(device) = self.lock().devices.get_mut(address) {
            device.faults.clear();
        }
    }

    /// Returns the running configuration of the device at `address`.
    #[must_use]
    pub fn running_config(&self, address: &str) -> Option<String> {
        self.lock().devices.get(address).map(|d| d.running.render())
    }

    /// Returns the call counters.
    #[must_use]
    pub fn counts(&self) -> CallCounts {
        self.lock().counts
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DriverFactory for MemoryDriver {
    fn connect<'a>(
        &'a self,
        address: &'a str,
        credentials: &'a Credentials,
        _timeout: Duration,
    ) -> DriverFuture<'a, Box<dyn DriverSession>> {
        Box::pin(async move {
            let stall = {
                let mut state = self.lock();
                state.counts.connect += 1;
                let Some(device) = state.devices.get(address) else {
                    return Err(format!("no route to host {address}").into());
                };
                if device.faults.contains(&Fault::Unreachable) {
                    return Err(format!("connection refused by {address}").into());
                }
                device.faults.contains(&Fault::StallConnect)
            };
            if stall {
                std::future::pending::<()>().await;
            }
            if credentials.username.is_empty() {
                return Err(format!("authentication failed on {address}").into());
            }
            let session: Box<dyn DriverSession> = Box::new(MemorySession {
                address: address.to_string(),
                driver: self.clone(),
                candidate: None,
                closed: false,
            });
            Ok(session)
        })
    }
}

struct MemorySession {
    address: String,
    driver: MemoryDriver,
    candidate: Option<ConfigText>,
    closed: bool,
}

impl MemorySession {
    fn with_device<T>(
        &self,
        f: impl FnOnce(&mut Device, &mut CallCounts) -> T,
    ) -> Result<T, crate::ports::PortError> {
        let mut state = self.driver.lock();
        let State { devices, counts } = &mut *state;
        let device = devices
            .get_mut(&self.address)
            .ok_or_else(|| format!("device {} went away", self.address))?;
        Ok(f(device, counts))
    }
}

/// Clears a device's in-progress load marker, also when the load is
/// cancelled.
struct LoadingFlag<'a> {
    driver: &'a MemoryDriver,
    address: &'a str,
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        if let Some(device) = self.driver.lock().devices.get_mut(self.address) {
            device.loading = false;
        }
    }
}

impl DriverSession for MemorySession {
    fn load<'a>(&'a mut self, text: &'a str, mode: LoadMode) -> DriverFuture<'a, ()> {
        Box::pin(async move {
            let rejected = self.with_device(|device, counts| {
                counts.load += 1;
                assert!(!device.loading, "re-entrant load on {}", self.address);
                device.loading = true;
                device.faults.contains(&Fault::RejectLoad)
            })?;
            let _loading = LoadingFlag { driver: &self.driver, address: &self.address };

            if !self.driver.load_delay.is_zero() {
                tokio::time::sleep(self.driver.load_delay).await;
            }

            let staged = self
                .with_device(|device, _| (!rejected).then(|| device.running.stage(text, mode)))?;
            match staged {
                Some(candidate) => {
                    self.candidate = Some(candidate);
                    Ok(())
                }
                None => Err("% Invalid input detected at '^' marker".into()),
            }
        })
    }

    fn diff(&mut self) -> DriverFuture<'_, String> {
        Box::pin(async move {
            let candidate = self.candidate.clone().ok_or("no candidate loaded")?;
            self.with_device(|device, counts| {
                counts.diff += 1;
                device.running.diff(&candidate)
            })
        })
    }

    fn commit(&mut self) -> DriverFuture<'_, ()> {
        Box::pin(async move {
            if !self.driver.commit_delay.is_zero() {
                tokio::time::sleep(self.driver.commit_delay).await;
            }
            let candidate = self.candidate.take();
            let failed = self.with_device(|device, counts| {
                counts.commit += 1;
                if device.faults.contains(&Fault::FailCommit) {
                    return true;
                }
                if let Some(candidate) = candidate {
                    device.running = candidate;
                    device.revision += 1;
                }
                false
            })?;
            if failed {
                return Err("commit rejected: configuration session locked".into());
            }
            Ok(())
        })
    }

    fn discard(&mut self) -> DriverFuture<'_, ()> {
        Box::pin(async move {
            self.candidate = None;
            self.with_device(|_, counts| counts.discard += 1)
        })
    }

    fn confirm(&mut self) -> DriverFuture<'_, String> {
        Box::pin(async move {
            let marker = self.with_device(|device, counts| {
                counts.confirm += 1;
                if device.faults.contains(&Fault::FailConfirm) {
                    return None;
                }
                Some(device.running.value_of("hostname").map_or_else(
                    || format!("revision {}", device.revision),
                    |hostname| format!("hostname {hostname} revision {}", device.revision),
                ))
            })?;
            marker.ok_or_else(|| "device stopped answering after commit".into())
        })
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.driver.lock().counts.close += 1;
        }
    }
}
