use std::path::Path;
use std::process::{Command, ExitStatus};
use std::time::{Duration, Instant};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use submerge_base::{kind_err, Error, ErrorKind, Result};
use tracing::{info, warn};

use crate::config::SupervisorConfig;

/// The supervised inspector child process.
pub struct Child {
    inner: std::process::Child,
}

impl Child {
    /// Launches the inspector with the plugin names the plugin server will
    /// register under (SPEC_FULL.md §4.5 step 3).
    pub fn spawn(config: &SupervisorConfig, autoload_file: &Path) -> Result<Self> {
        let inner = Command::new(&config.inspector_binary)
            .arg("--extension")
            .arg(autoload_file)
            .arg("--config_plugin")
            .arg(&config.config_plugin_name)
            .arg("--logger_plugin")
            .arg(&config.logger_plugin_name)
            .spawn()
            .map_err(|e| {
                kind_err(
                    ErrorKind::ChildStartupFailed,
                    format!("spawning inspector child: {e}"),
                )
            })?;
        info!(pid = inner.id(), "inspector child started");
        Ok(Child { inner })
    }

    pub fn pid(&self) -> u32 {
        self.inner.id()
    }

    /// Non-blocking check for exit. `Ok(None)` means still running.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        self.inner.try_wait().map_err(|e| Error::new(ErrorKind::ChildUnhealthy, e))
    }

    /// SIGTERM, wait up to `grace`, then SIGKILL if it hasn't exited. Safe to
    /// call on an already-exited child.
    pub fn terminate_gracefully(&mut self, grace: Duration) -> Result<()> {
        if self.try_wait()?.is_some() {
            return Ok(());
        }

        let pid = Pid::from_raw(self.inner.id() as i32);
        if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
            if e != nix::errno::Errno::ESRCH {
                warn!(error = %e, "SIGTERM delivery failed");
            }
        }

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if self.try_wait()?.is_some() {
                return Ok(());
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        if self.try_wait()?.is_some() {
            return Ok(());
        }

        warn!(pid = self.pid(), "inspector child missed grace period, sending SIGKILL");
        let _ = self.inner.kill();
        let _ = self.inner.wait();
        Ok(())
    }
}
