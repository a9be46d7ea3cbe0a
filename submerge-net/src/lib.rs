// The RPC client: typed request/response calls to the management server,
// with a per-call deadline, a correlation id propagated through headers and
// logs, and the `invalid`-identity in-band signal kept distinct from
// transport failures (SPEC_FULL.md §4.2).

mod client;
mod outcome;
mod tls;
mod types;

pub use client::RpcClient;
pub use outcome::{Outcome, PublishOutcome};
pub use tls::TlsMode;
pub use types::{HealthStatus, LogKind, QueryResult, CONFIG_SOURCE_NAME};

#[cfg(test)]
mod test;
