// We want a few things here:
// 1. A way to create a new error with a backtrace
// 2. A way to centralize setting a breakpoint to trap any error in the system fairly soon
//    after it's created (or at least when it's propagated from a library we use back to us)
// 3. Same but for logging / emitting error messages into the tracing/logging system
// 4. A kind tag, separate from the underlying cause's Rust type, so callers can match on
//    "what should I do about this" (retry, re-enroll, escalate) without downcasting.

use std::borrow::Cow;
use backtrace_error::DynBacktraceError;
use tracing::error;

#[cfg(test)]
use test_log::test;

/// What a caller should do about an [`Error`], independent of the underlying cause's Rust type.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ErrorKind {
    /// Network/IO/deadline failure on an RPC call. Recoverable by retry at the next loop tick.
    Transport,
    /// The server returned `invalid=true` for the node identity in use.
    InvalidIdentity,
    /// A re-enroll attempt itself failed or was rejected.
    EnrollFailed,
    /// A Store (redb) transaction failed.
    Storage,
    /// The inspector child process failed to start.
    ChildStartupFailed,
    /// The inspector child process failed repeated health probes.
    ChildUnhealthy,
    /// Any failure in the signed-metadata update pipeline.
    Update,
    /// No specific kind; the default for errors converted via `?` from library types.
    Other,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    cause: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

struct SimpleErr(Cow<'static, str>);
impl std::fmt::Debug for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for SimpleErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::error::Error for SimpleErr {
    fn description(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.cause)
    }
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        Error::new(ErrorKind::Other, err)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(kind: ErrorKind, err: E) -> Error {
        error!(target: "submerge", kind = ?kind, "{:?}", err);
        let cause = DynBacktraceError::from(err);
        Error { kind, cause }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Re-tag an error constructed via `?` (which defaults to [`ErrorKind::Other`])
    /// with the kind appropriate to the call site.
    pub fn with_kind(mut self, kind: ErrorKind) -> Error {
        self.kind = kind;
        self
    }
}

pub fn err(msg: impl Into<Cow<'static, str>>) -> Error {
    kind_err(ErrorKind::Other, msg)
}

pub fn kind_err(kind: ErrorKind, msg: impl Into<Cow<'static, str>>) -> Error {
    let e = SimpleErr(msg.into());
    Error::new(kind, e)
}

#[test]
fn test_error() {
    let e = err("test error");
    assert_eq!(e.kind(), ErrorKind::Other);
}

#[test]
fn test_with_kind() {
    let e = err("boom").with_kind(ErrorKind::Transport);
    assert_eq!(e.kind(), ErrorKind::Transport);
}
