use std::sync::Arc;
use std::time::Duration;

use submerge_auth::{Enroller, Identity};
use submerge_base::ErrorKind;
use submerge_net::{RpcClient, TlsMode};
use submerge_rowdb::Store;
use submerge_txn::{LogBuffer, LogBufferConfig};
use test_log::test;

use super::*;

fn extension_for_test(dir: &std::path::Path) -> Arc<Extension> {
    let store = Arc::new(Store::open(dir.join("agent.redb")).unwrap());
    let client = Arc::new(
        RpcClient::new("http://127.0.0.1:1", Duration::from_secs(1), &TlsMode::SystemDefault).unwrap(),
    );
    let enroller = Arc::new(Enroller::new(Identity::new(Arc::clone(&store)), Arc::clone(&client)));
    let log_buffer = Arc::new(LogBuffer::open(Arc::clone(&store), LogBufferConfig::default()).unwrap());
    Arc::new(Extension::new(store, client, enroller, log_buffer, "secret"))
}

#[test]
fn run_returns_immediately_when_already_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let config = SupervisorConfig::new("/bin/true");
    let cancel = Cancel::new();
    cancel.cancel();

    let extension = extension_for_test(dir.path());
    let supervisor = Supervisor::new(paths, config, extension, cancel);
    let (tx, _rx) = crossbeam_channel::unbounded();
    supervisor.run(tx).unwrap();
}

#[test]
fn missing_inspector_binary_surfaces_child_startup_failed() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let config = SupervisorConfig::new(dir.path().join("no-such-inspector"));
    let extension = extension_for_test(dir.path());
    let cancel = Cancel::new();
    let supervisor = Supervisor::new(paths.clone(), config, extension, cancel);

    let mut signaled = false;
    let (tx, _rx) = crossbeam_channel::unbounded();
    let err = supervisor
        .start_and_supervise(&mut signaled, &tx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChildStartupFailed);
    assert!(!paths.plugin_socket().exists());
}

#[test]
fn run_propagates_the_last_error_once_the_restart_budget_is_exhausted() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let mut config = SupervisorConfig::new(dir.path().join("no-such-inspector"));
    config.max_restarts = 3;
    config.restart_backoff_base = Duration::from_millis(1);
    config.restart_backoff_ceiling = Duration::from_millis(1);
    let extension = extension_for_test(dir.path());
    let cancel = Cancel::new();
    let supervisor = Supervisor::new(paths, config, extension, cancel);

    let (tx, _rx) = crossbeam_channel::unbounded();
    let err = supervisor.run(tx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChildStartupFailed);
}

#[test]
fn startup_times_out_without_a_connecting_child() {
    let dir = tempfile::tempdir().unwrap();
    let paths = Paths::new(dir.path());
    let mut config = SupervisorConfig::new("sleep");
    config.startup_deadline = Duration::from_millis(200);
    let extension = extension_for_test(dir.path());
    let cancel = Cancel::new();
    let supervisor = Supervisor::new(paths, config, extension, cancel);

    let mut signaled = false;
    let (tx, _rx) = crossbeam_channel::unbounded();
    let err = supervisor
        .start_and_supervise(&mut signaled, &tx)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChildStartupFailed);
}
