// Top-level wiring: CLI parsing lives in `bin.rs`; this crate assembles the
// subsystem crates into a running agent and exposes the one-shot
// `check-health` path, per SPEC_FULL.md §6's exit-code contract.

mod cli;
mod secret;
mod shutdown;
mod tls;

use std::sync::Arc;
use std::time::Duration;

pub use cli::{AgentArgs, Cli, Command};
use crossbeam_channel::bounded;
use submerge_adapt::{Extension, ForwardingLoop};
use submerge_admin::{Paths, Supervisor, SupervisorConfig};
use submerge_auth::{Enroller, Identity};
use submerge_base::{kind_err, Cancel, ErrorKind, Result};
use submerge_net::{HealthStatus, RpcClient};
use submerge_rowdb::Store;
use submerge_txn::{LogBuffer, LogBufferConfig};
use submerge_vers::{BinaryUpdater, UpdaterConfig, PINNED_ROOT};
use tracing::{error, info, warn};

const RPC_DEADLINE: Duration = Duration::from_secs(60);
const CHECK_HEALTH_DEADLINE: Duration = Duration::from_secs(5);
const FORWARDING_INTERVAL: Duration = Duration::from_secs(10);
const MAX_LOGS_PER_BATCH: usize = 100;

/// Installs the process-wide `tracing` subscriber. Respects `RUST_LOG`;
/// defaults to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn platform() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Everything assembled and running for `submerge run`. Shutdown always
/// flows through `cancel`; every background thread is joined before the
/// process exits.
struct Agent {
    cancel: Cancel,
    forwarding: ForwardingLoop,
    supervisor_handle: std::thread::JoinHandle<Result<()>>,
    update_handles: Vec<std::thread::JoinHandle<()>>,
}

fn build_agent(args: &AgentArgs) -> Result<Agent> {
    let paths = Paths::new(args.root_dir.clone());
    std::fs::create_dir_all(paths.database_dir())
        .map_err(|e| kind_err(ErrorKind::Other, format!("creating database directory: {e}")))?;

    let store = Arc::new(Store::open(paths.database_file())?);
    let tls = tls::build_tls_mode(args)?;
    let client = Arc::new(RpcClient::new(args.server_addr.clone(), RPC_DEADLINE, &tls)?);

    let identity = Identity::new(Arc::clone(&store));
    let enroller = Arc::new(Enroller::new(identity, Arc::clone(&client)));
    let log_buffer = Arc::new(LogBuffer::open(Arc::clone(&store), LogBufferConfig::default())?);
    let enroll_secret = secret::resolve_enroll_secret(args)?;
    let extension = Arc::new(Extension::new(
        Arc::clone(&store),
        Arc::clone(&client),
        Arc::clone(&enroller),
        Arc::clone(&log_buffer),
        enroll_secret,
    ));

    let cancel = Cancel::new();
    shutdown::install(cancel.clone())?;

    let forwarding = ForwardingLoop::spawn(Arc::clone(&extension), FORWARDING_INTERVAL, MAX_LOGS_PER_BATCH);

    let supervisor_config = SupervisorConfig::new(args.inspector_binary.clone());
    let supervisor = Supervisor::new(
        paths.clone(),
        supervisor_config.clone(),
        Arc::clone(&extension),
        cancel.clone(),
    );
    let (ready_tx, ready_rx) = bounded(1);
    let supervisor_handle = std::thread::spawn(move || supervisor.run(ready_tx));
    // Don't block startup forever on the inspector: log and proceed so the
    // extension and updater loops still run even if it's slow to come up.
    if ready_rx.recv_timeout(supervisor_config.startup_deadline).is_err() {
        warn!("inspector did not report ready within its startup deadline, continuing anyway");
    }

    let update_handles = spawn_updaters(args, &supervisor_config, &cancel)?;

    Ok(Agent {
        cancel,
        forwarding,
        supervisor_handle,
        update_handles,
    })
}

fn spawn_updaters(
    args: &AgentArgs,
    supervisor_config: &SupervisorConfig,
    cancel: &Cancel,
) -> Result<Vec<std::thread::JoinHandle<()>>> {
    let metadata_base_url = format!("{}/tuf/metadata/", args.server_addr.trim_end_matches('/'));
    let targets_base_url = format!("{}/tuf/targets/", args.server_addr.trim_end_matches('/'));
    let platform = platform();

    let self_exe = std::env::current_exe()
        .map_err(|e| kind_err(ErrorKind::Update, format!("locating running binary: {e}")))?;
    let self_updater = BinaryUpdater::new(
        "self",
        self_exe,
        args.root_dir.join("self-tuf"),
        args.root_dir.join("self-staging"),
        PINNED_ROOT,
        UpdaterConfig::new(
            args.update_channel.clone(),
            platform.clone(),
            metadata_base_url.clone(),
            targets_base_url.clone(),
        ),
        {
            let cancel = cancel.clone();
            Box::new(move || cancel.cancel())
        },
    );

    // The inspector updater has no direct handle on the supervisor's child;
    // tripping the same shared cancel causes a full clean shutdown, and the
    // service manager restarts the whole agent against both fresh binaries.
    let inspector_updater = BinaryUpdater::new(
        "inspector",
        supervisor_config.inspector_binary.clone(),
        args.root_dir.join("inspector-tuf"),
        args.root_dir.join("inspector-staging"),
        PINNED_ROOT,
        UpdaterConfig::new(args.update_channel.clone(), platform, metadata_base_url, targets_base_url),
        {
            let cancel = cancel.clone();
            Box::new(move || cancel.cancel())
        },
    );

    let self_handle = {
        let cancel = cancel.clone();
        std::thread::spawn(move || self_updater.run(&cancel))
    };
    let inspector_handle = {
        let cancel = cancel.clone();
        std::thread::spawn(move || inspector_updater.run(&cancel))
    };
    Ok(vec![self_handle, inspector_handle])
}

/// Runs the agent until cancelled (by a signal or the self-updater's
/// finalizer) and returns the process exit code.
pub fn run(cli: &Cli) -> i32 {
    match cli.command.unwrap_or_default() {
        Command::Run => run_agent(&cli.agent),
        Command::CheckHealth => check_health(&cli.agent),
    }
}

fn run_agent(args: &AgentArgs) -> i32 {
    let agent = match build_agent(args) {
        Ok(agent) => agent,
        Err(e) => {
            error!(error = %e, "fatal startup failure");
            return 1;
        }
    };

    while !agent.cancel.is_cancelled() {
        agent.cancel.sleep(Duration::from_secs(1));
    }

    agent.forwarding.stop();
    let supervisor_result = agent.supervisor_handle.join();
    for handle in agent.update_handles {
        let _ = handle.join();
    }

    match supervisor_result {
        Ok(Ok(())) => {
            info!("clean shutdown");
            0
        }
        Ok(Err(e)) => {
            error!(error = %e, "unrecoverable supervisor failure");
            2
        }
        Err(_) => {
            error!("supervisor thread panicked");
            2
        }
    }
}

/// Performs the health RPC against `--server-addr` and exits 0 iff the
/// server reports the node healthy; this is a standalone probe and does not
/// require an agent to be running locally.
fn check_health(args: &AgentArgs) -> i32 {
    let tls = match tls::build_tls_mode(args) {
        Ok(tls) => tls,
        Err(e) => {
            error!(error = %e, "failed to resolve TLS mode");
            return 1;
        }
    };
    let client = match RpcClient::new(args.server_addr.clone(), CHECK_HEALTH_DEADLINE, &tls) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build RPC client");
            return 1;
        }
    };
    match client.check_health() {
        Ok(HealthStatus::Healthy) => {
            info!("server reports healthy");
            0
        }
        Ok(status) => {
            warn!(?status, "server reports not healthy");
            1
        }
        Err(e) => {
            error!(error = %e, "health RPC failed");
            1
        }
    }
}
