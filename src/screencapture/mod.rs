// ABOUTME: Bridge to the OS screenshot-location preference (com.apple.screencapture location)
// ABOUTME: Reads fall back to the Desktop folder; writes trigger a best-effort SystemUIServer refresh

pub mod command;

use crate::config::ScreencaptureConfig;
use crate::destination::Destination;
use command::CommandError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingError {
    #[error("screenshot location query failed: {0}")]
    Query(#[source] CommandError),

    #[error("screenshot location write failed: {0}")]
    Write(#[source] CommandError),

    #[error("screenshot UI refresh failed: {0}")]
    Refresh(#[source] CommandError),
}

/// Raw access to the external preference. Implementations do no fallback or
/// trimming; that is handled by [`ExternalSetting`].
pub trait SettingBridge {
    /// Raw text output of the preference read.
    fn read(&self) -> Result<String, SettingError>;

    fn write(&self, value: &str) -> Result<(), SettingError>;

    /// Makes the OS component that caches the preference pick up a new value.
    fn refresh(&self) -> Result<(), SettingError>;
}

/// Shells out to `defaults` and `killall`.
pub struct DefaultsBridge {
    config: ScreencaptureConfig,
}

impl DefaultsBridge {
    pub fn new(config: ScreencaptureConfig) -> Self {
        Self { config }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.command_timeout_secs)
    }
}

impl SettingBridge for DefaultsBridge {
    fn read(&self) -> Result<String, SettingError> {
        command::run(
            &self.config.defaults_program,
            &["read", self.config.domain.as_str(), self.config.key.as_str()],
            self.timeout(),
        )
        .map_err(SettingError::Query)
    }

    fn write(&self, value: &str) -> Result<(), SettingError> {
        command::run(
            &self.config.defaults_program,
            &["write", self.config.domain.as_str(), self.config.key.as_str(), value],
            self.timeout(),
        )
        .map(|_| ())
        .map_err(SettingError::Write)
    }

    fn refresh(&self) -> Result<(), SettingError> {
        if !self.config.refresh_after_write {
            return Ok(());
        }
        command::run(
            &self.config.killall_program,
            &[self.config.refresh_process.as_str()],
            self.timeout(),
        )
        .map(|_| ())
        .map_err(SettingError::Refresh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOutcome {
    /// False when the value was written but the refresh step failed.
    pub refreshed: bool,
}

/// The screenshot destination as the OS sees it. Never cached: every `get`
/// queries the bridge.
pub struct ExternalSetting {
    bridge: Box<dyn SettingBridge>,
    fallback: Destination,
}

impl ExternalSetting {
    pub fn new(bridge: Box<dyn SettingBridge>, fallback: Destination) -> Self {
        Self { bridge, fallback }
    }

    pub fn get(&self) -> Destination {
        match self.bridge.read() {
            Ok(output) => {
                let value = chomp(&output);
                if value.is_empty() {
                    tracing::debug!("Screenshot location unset, using {}", self.fallback);
                    self.fallback.clone()
                } else {
                    Destination::new(value)
                }
            }
            Err(e) => {
                tracing::debug!("{e}; using {}", self.fallback);
                self.fallback.clone()
            }
        }
    }

    /// Writes the preference, then refreshes. A refresh failure is logged and
    /// reported through [`SetOutcome`], not as an error.
    pub fn set(&self, destination: &Destination) -> Result<SetOutcome, SettingError> {
        self.bridge.write(destination.as_str())?;
        tracing::info!("Screenshot location set to {destination}");

        match self.bridge.refresh() {
            Ok(()) => Ok(SetOutcome { refreshed: true }),
            Err(e) => {
                tracing::warn!("{e}");
                Ok(SetOutcome { refreshed: false })
            }
        }
    }
}

/// Strips exactly one trailing newline.
fn chomp(output: &str) -> &str {
    output.strip_suffix('\n').unwrap_or(output)
}

#[cfg(test)]
pub use memory::MemorySettingBridge;

#[cfg(test)]
mod memory {
    use super::{CommandError, SettingBridge, SettingError};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;
    use std::time::Duration;

    fn simulated(program: &str) -> CommandError {
        CommandError::Timeout {
            program: program.to_string(),
            timeout: Duration::from_secs(0),
        }
    }

    /// In-memory preference store. Reads mimic `defaults read` output, so a set
    /// value comes back with a trailing newline.
    #[derive(Clone, Default)]
    pub struct MemorySettingBridge {
        value: Rc<RefCell<Option<String>>>,
        raw_output: Rc<RefCell<Option<String>>>,
        fail_reads: Rc<Cell<bool>>,
        fail_writes: Rc<Cell<bool>>,
        fail_refresh: Rc<Cell<bool>>,
        reads: Rc<Cell<usize>>,
        refreshes: Rc<Cell<usize>>,
    }

    impl MemorySettingBridge {
        pub fn with_value(value: &str) -> Self {
            let bridge = Self::default();
            *bridge.value.borrow_mut() = Some(value.to_string());
            bridge
        }

        pub fn value(&self) -> Option<String> {
            self.value.borrow().clone()
        }

        /// Overrides what `read` returns verbatim.
        pub fn set_raw_output(&self, output: &str) {
            *self.raw_output.borrow_mut() = Some(output.to_string());
        }

        pub fn set_fail_reads(&self, fail: bool) {
            self.fail_reads.set(fail);
        }

        pub fn set_fail_writes(&self, fail: bool) {
            self.fail_writes.set(fail);
        }

        pub fn set_fail_refresh(&self, fail: bool) {
            self.fail_refresh.set(fail);
        }

        pub fn reads(&self) -> usize {
            self.reads.get()
        }

        pub fn refreshes(&self) -> usize {
            self.refreshes.get()
        }
    }

    impl SettingBridge for MemorySettingBridge {
        fn read(&self) -> Result<String, SettingError> {
            self.reads.set(self.reads.get() + 1);
            if self.fail_reads.get() {
                return Err(SettingError::Query(simulated("defaults")));
            }
            if let Some(raw) = self.raw_output.borrow().as_ref() {
                return Ok(raw.clone());
            }
            Ok(self
                .value
                .borrow()
                .as_ref()
                .map(|v| format!("{v}\n"))
                .unwrap_or_default())
        }

        fn write(&self, value: &str) -> Result<(), SettingError> {
            if self.fail_writes.get() {
                return Err(SettingError::Write(simulated("defaults")));
            }
            *self.raw_output.borrow_mut() = None;
            *self.value.borrow_mut() = Some(value.to_string());
            Ok(())
        }

        fn refresh(&self) -> Result<(), SettingError> {
            if self.fail_refresh.get() {
                return Err(SettingError::Refresh(simulated("killall")));
            }
            self.refreshes.set(self.refreshes.get() + 1);
            Ok(())
        }
    }
}
