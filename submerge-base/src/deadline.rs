use std::time::{Duration, Instant};

/// Expresses "this suspension point must not block past T". RPC calls,
/// Store opens and child-process waits all take one so that no operation in
/// the agent can wait unboundedly.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(dur: Duration) -> Self {
        Deadline {
            at: Instant::now() + dur,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.at
    }
}
