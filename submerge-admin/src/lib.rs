// The Inspector Supervisor: start sequence, in-process plugin socket server,
// health-probe loop, and exponential-backoff restart policy (SPEC_FULL.md
// §4.5).

mod child;
mod config;
mod framing;
mod health;
mod paths;
mod plugin_server;
mod protocol;
mod supervisor;

pub use config::SupervisorConfig;
pub use paths::Paths;
pub use protocol::{LogKindWire, PluginRequest, PluginResponse};
pub use supervisor::Supervisor;
