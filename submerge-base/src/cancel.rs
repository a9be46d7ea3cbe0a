use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// A cheap, cloneable cooperative cancellation token. Every long-running loop
/// polls this at its suspension points; supervisor shutdown trips it once and
/// every clone observes the trip immediately.
#[derive(Clone)]
pub struct Cancel {
    inner: Arc<Inner>,
}

struct Inner {
    tripped: AtomicBool,
    gate: Mutex<()>,
    cond: Condvar,
}

impl Cancel {
    pub fn new() -> Self {
        Cancel {
            inner: Arc::new(Inner {
                tripped: AtomicBool::new(false),
                gate: Mutex::new(()),
                cond: Condvar::new(),
            }),
        }
    }

    /// Trip the token. Idempotent; wakes every thread parked in [`Cancel::sleep`].
    pub fn cancel(&self) {
        self.inner.tripped.store(true, Ordering::SeqCst);
        let _guard = self.inner.gate.lock().unwrap();
        self.inner.cond.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.tripped.load(Ordering::SeqCst)
    }

    /// Sleep for up to `dur`, returning early the moment the token trips.
    /// Returns `true` if the sleep elapsed fully uncancelled, `false` if
    /// cancellation woke it early.
    pub fn sleep(&self, dur: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }
        let guard = self.inner.gate.lock().unwrap();
        let _ = self
            .inner
            .cond
            .wait_timeout_while(guard, dur, |_| !self.is_cancelled())
            .unwrap();
        !self.is_cancelled()
    }
}

impl Default for Cancel {
    fn default() -> Self {
        Self::new()
    }
}
