use std::sync::Arc;
use std::time::Duration;

use submerge_base::Cancel;
use submerge_txn::Kind;
use tracing::warn;

use crate::extension::Extension;

/// Runs the fixed-cadence log-forwarding loop (SPEC_FULL.md §4.4) on its own
/// thread until `stop` is called or the process exits. Each tick drains both
/// kinds in bounded batches, publishing and acking one batch at a time;
/// a network failure stops that kind's draining for the tick and leaves the
/// batch unacked for the next one to retry.
pub struct ForwardingLoop {
    cancel: Cancel,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl ForwardingLoop {
    pub fn spawn(extension: Arc<Extension>, interval: Duration, max_per_batch: usize) -> Self {
        let cancel = Cancel::new();
        let loop_cancel = cancel.clone();
        let handle = std::thread::spawn(move || run(extension, loop_cancel, interval, max_per_batch));
        ForwardingLoop {
            cancel,
            handle: Some(handle),
        }
    }

    /// Signals the loop to stop and waits for the current tick to finish.
    pub fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ForwardingLoop {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn run(extension: Arc<Extension>, cancel: Cancel, interval: Duration, max_per_batch: usize) {
    while cancel.sleep(interval) {
        for kind in Kind::ALL {
            drain_one_kind(&extension, &cancel, kind, max_per_batch);
        }
    }
}

fn drain_one_kind(extension: &Arc<Extension>, cancel: &Cancel, kind: Kind, max_per_batch: usize) {
    loop {
        if cancel.is_cancelled() {
            return;
        }
        let batch = match extension.log_buffer().drain(kind, max_per_batch) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "log buffer drain failed");
                return;
            }
        };
        if batch.is_empty() {
            return;
        }
        match extension.publish_logs_batch(kind, batch.lines()) {
            Ok(()) => {
                if let Err(e) = batch.ack() {
                    warn!(error = %e, "failed to ack a published batch");
                }
            }
            Err(e) => {
                warn!(error = %e, "publish_logs failed, batch stays buffered for next tick");
                return;
            }
        }
    }
}
