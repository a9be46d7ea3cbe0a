use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::time::Duration;

use submerge_adapt::Extension;
use submerge_auth::{Enroller, Identity};
use submerge_net::{RpcClient, TlsMode};
use submerge_rowdb::Store;
use submerge_txn::{LogBuffer, LogBufferConfig};
use test_log::test;

use super::*;

fn extension_for_test(dir: &std::path::Path) -> Arc<Extension> {
    let store = Arc::new(Store::open(dir.join("agent.redb")).unwrap());
    // Nothing listens on this address; tests here only exercise the plugin
    // socket framing, not RPC calls.
    let client = Arc::new(
        RpcClient::new("http://127.0.0.1:1", Duration::from_secs(1), &TlsMode::SystemDefault).unwrap(),
    );
    let enroller = Arc::new(Enroller::new(Identity::new(Arc::clone(&store)), Arc::clone(&client)));
    let log_buffer = Arc::new(LogBuffer::open(Arc::clone(&store), LogBufferConfig::default()).unwrap());
    Arc::new(Extension::new(store, client, enroller, log_buffer, "secret"))
}

#[test]
fn ping_gets_pong() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("plugin.sock");
    let extension = extension_for_test(dir.path());
    let server = PluginServer::bind(&socket_path, extension).unwrap();

    let mut stream = UnixStream::connect(&socket_path).unwrap();
    write_framed(&mut stream, &PluginRequest::Ping).unwrap();
    let response: PluginResponse = read_framed(&mut stream).unwrap().unwrap();
    assert!(matches!(response, PluginResponse::Pong));

    server.shutdown();
}

#[test]
fn log_string_is_appended_and_acked() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("plugin.sock");
    let extension = extension_for_test(dir.path());
    let server = PluginServer::bind(&socket_path, Arc::clone(&extension)).unwrap();

    let mut stream = UnixStream::connect(&socket_path).unwrap();
    write_framed(
        &mut stream,
        &PluginRequest::LogString {
            kind: crate::protocol::LogKindWire::Status,
            text: "hello from the plugin".to_string(),
        },
    )
    .unwrap();
    let response: PluginResponse = read_framed(&mut stream).unwrap().unwrap();
    assert!(matches!(response, PluginResponse::Ack));

    server.shutdown();
}

#[test]
fn handles_multiple_requests_on_one_connection() {
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("plugin.sock");
    let extension = extension_for_test(dir.path());
    let server = PluginServer::bind(&socket_path, extension).unwrap();

    let mut stream = UnixStream::connect(&socket_path).unwrap();
    for _ in 0..3 {
        write_framed(&mut stream, &PluginRequest::Ping).unwrap();
        let response: PluginResponse = read_framed(&mut stream).unwrap().unwrap();
        assert!(matches!(response, PluginResponse::Pong));
    }

    server.shutdown();
}
