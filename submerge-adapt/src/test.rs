use std::sync::Arc;
use std::time::Duration;

use submerge_auth::{Enroller, Identity};
use submerge_net::{RpcClient, TlsMode};
use submerge_rowdb::Store;
use submerge_txn::{Kind, LogBuffer, LogBufferConfig};
use test_log::test;
use tiny_http::{Response, Server};

use crate::Extension;

struct Harness {
    _dir: tempfile::TempDir,
    extension: Arc<Extension>,
}

fn harness(url: &str) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(Store::open(dir.path().join("agent.redb")).unwrap());
    let client = Arc::new(RpcClient::new(url, Duration::from_secs(2), &TlsMode::SystemDefault).unwrap());
    let enroller = Arc::new(Enroller::new(Identity::new(Arc::clone(&store)), Arc::clone(&client)));
    let log_buffer = Arc::new(LogBuffer::open(Arc::clone(&store), LogBufferConfig::default()).unwrap());
    let extension = Arc::new(Extension::new(
        Arc::clone(&store),
        client,
        enroller,
        log_buffer,
        "secret",
    ));
    Harness { _dir: dir, extension }
}

fn serve_sequence(server: Server, responses: Vec<(u16, &'static str)>) {
    std::thread::spawn(move || {
        for (status, body) in responses {
            match server.recv() {
                Ok(request) => {
                    let response = Response::from_string(body)
                        .with_status_code(tiny_http::StatusCode(status));
                    let _ = request.respond(response);
                }
                Err(_) => return,
            }
        }
    });
}

#[test]
fn generate_config_enrolls_then_fetches() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    serve_sequence(
        server,
        vec![
            (200, r#"{"node_key":"NK1","node_invalid":false}"#),
            (200, r#"{"config":"the-config","node_invalid":false}"#),
        ],
    );

    let h = harness(&url);
    let blob = h.extension.generate_config().unwrap();
    assert_eq!(blob, b"the-config");
}

#[test]
fn generate_config_falls_back_to_cache_on_fetch_failure() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    serve_sequence(
        server,
        vec![
            (200, r#"{"node_key":"NK1","node_invalid":false}"#),
            (200, r#"{"config":"first","node_invalid":false}"#),
        ],
    );
    let h = harness(&url);
    assert_eq!(h.extension.generate_config().unwrap(), b"first");

    // Server is gone now; a fresh fetch fails and the cached blob is served.
    assert_eq!(h.extension.generate_config().unwrap(), b"first");
}

#[test]
fn invalid_response_triggers_reenroll_and_retry() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    serve_sequence(
        server,
        vec![
            (200, r#"{"node_key":"NK1","node_invalid":false}"#), // initial enroll
            (200, r#"{"node_invalid":true}"#),                   // config fetch rejected
            (200, r#"{"node_key":"NK2","node_invalid":false}"#), // re-enroll
            (200, r#"{"config":"fresh","node_invalid":false}"#), // retried fetch
        ],
    );

    let h = harness(&url);
    let blob = h.extension.generate_config().unwrap();
    assert_eq!(blob, b"fresh");
}

#[test]
fn log_string_never_touches_the_network() {
    // No server listening at all; append must still succeed.
    let h = harness("http://127.0.0.1:1");
    h.extension.log_string(Kind::Status, "hello").unwrap();
}

#[test]
fn forwarding_loop_drains_and_acks_on_tick() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    serve_sequence(
        server,
        vec![
            (200, r#"{"node_key":"NK1","node_invalid":false}"#), // enroll
            (200, r#"{"node_invalid":false}"#),                  // publish_logs
        ],
    );

    let h = harness(&url);
    h.extension.log_string(Kind::Status, "line-1").unwrap();

    let loop_handle =
        crate::ForwardingLoop::spawn(Arc::clone(&h.extension), Duration::from_millis(20), 100);
    std::thread::sleep(Duration::from_millis(300));
    loop_handle.stop();

    let remaining = h.extension.log_buffer().drain(Kind::Status, 10).unwrap();
    assert!(remaining.is_empty());
}
