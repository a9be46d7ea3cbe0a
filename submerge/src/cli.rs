use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Endpoint telemetry agent: supervises the inspector child process,
/// forwards its logs and queries to the management server, and keeps both
/// itself and the inspector up to date against a signed update feed
/// (SPEC_FULL.md §6).
#[derive(Parser, Debug)]
#[command(name = "submerge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub agent: AgentArgs,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
pub enum Command {
    /// Run the agent: supervisor, telemetry extension, and updater loops. Default.
    #[default]
    Run,
    /// One-shot: probe the inspector's plugin socket and exit 0 if healthy.
    CheckHealth,
}

#[derive(Parser, Debug, Clone)]
pub struct AgentArgs {
    /// Root directory for the database, plugin socket, pidfile, and autoload file.
    #[arg(long, env = "ROOT_DIR", default_value = "/var/lib/submerge")]
    pub root_dir: PathBuf,

    /// Enrollment secret, given directly.
    #[arg(long, env = "ENROLL_SECRET")]
    pub enroll_secret: Option<String>,

    /// Enrollment secret, given as a path to a file containing it.
    #[arg(long, env = "ENROLL_SECRET_PATH")]
    pub enroll_secret_path: Option<PathBuf>,

    /// Base URL of the management server.
    #[arg(long, env = "SERVER_ADDR")]
    pub server_addr: String,

    /// Update channel used to build both self and inspector target names.
    #[arg(long, env = "UPDATE_CHANNEL", default_value = "stable")]
    pub update_channel: String,

    /// Disable TLS certificate verification entirely. Never the default.
    #[arg(long, env = "INSECURE_TLS", default_value_t = false)]
    pub insecure_tls: bool,

    /// Comma-separated hex-encoded SPKI SHA-256 pins the server certificate
    /// must additionally match.
    #[arg(long, env = "PINNED_KEYS")]
    pub pinned_keys: Option<String>,

    /// Path to a PEM root CA bundle to trust instead of the platform store.
    #[arg(long, env = "ROOT_CA_PATH")]
    pub root_ca_path: Option<PathBuf>,

    /// Path to the managed inspector binary.
    #[arg(long, env = "INSPECTOR_BINARY", default_value = "osqueryd")]
    pub inspector_binary: PathBuf,
}
