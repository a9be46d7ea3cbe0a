use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A fresh identifier minted per RPC call, threaded through the outbound
/// transport header and every `tracing` event emitted while servicing that
/// call.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        CorrelationId(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn distinct_each_call() {
        assert_ne!(CorrelationId::new(), CorrelationId::new());
    }

    #[test]
    fn displays_as_hyphenated_uuid() {
        let id = CorrelationId::new();
        assert_eq!(id.to_string().len(), 36);
    }
}
