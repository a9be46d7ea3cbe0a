// Translates SIGINT/SIGTERM into a `Cancel` trip. The signal handler itself
// only stores to an atomic (the one thing that's safe to do in a signal
// handler); a dedicated thread polls it and drives the actual shutdown, the
// same indirection `submerge-admin::child` uses in the other direction when
// it sends signals to the inspector.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use nix::sys::signal::{signal, SigHandler, Signal};
use submerge_base::{Cancel, Error, ErrorKind, Result};
use tracing::info;

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_signal(_: i32) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs handlers for SIGINT and SIGTERM and spawns the thread that turns
/// either into `cancel.cancel()`. Idempotent only in the sense that it's
/// meant to be called once per process.
pub fn install(cancel: Cancel) -> Result<()> {
    unsafe {
        signal(Signal::SIGINT, SigHandler::Handler(on_signal))
            .map_err(|e| Error::new(ErrorKind::Other, e))?;
        signal(Signal::SIGTERM, SigHandler::Handler(on_signal))
            .map_err(|e| Error::new(ErrorKind::Other, e))?;
    }
    std::thread::spawn(move || {
        while !SHUTDOWN_REQUESTED.load(Ordering::SeqCst) {
            std::thread::sleep(Duration::from_millis(100));
        }
        info!("shutdown signal received");
        cancel.cancel();
    });
    Ok(())
}
