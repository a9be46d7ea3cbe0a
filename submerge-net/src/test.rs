use std::time::Duration;

use test_log::test;
use tiny_http::{Response, Server};

use crate::{HealthStatus, RpcClient, TlsMode};

fn client_for(url: &str) -> RpcClient {
    RpcClient::new(url, Duration::from_secs(2), &TlsMode::SystemDefault).unwrap()
}

fn respond_once(server: Server, status: u16, body: &'static str) {
    std::thread::spawn(move || {
        if let Ok(request) = server.recv() {
            let response = Response::from_string(body)
                .with_status_code(tiny_http::StatusCode(status))
                .with_header(
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .unwrap(),
                );
            let _ = request.respond(response);
        }
    });
}

#[test]
fn enroll_returns_node_key_on_success() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    respond_once(server, 200, r#"{"node_key":"NK1","node_invalid":false}"#);

    let client = client_for(&url);
    let outcome = client.enroll("secret", "host1").unwrap();
    assert_eq!(outcome.value, "NK1");
    assert!(!outcome.invalid);
}

#[test]
fn enroll_surfaces_invalid_flag() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    respond_once(server, 200, r#"{"node_invalid":true}"#);

    let client = client_for(&url);
    let outcome = client.enroll("secret", "host1").unwrap();
    assert!(outcome.invalid);
}

#[test]
fn get_config_returns_cached_flag_on_invalid() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    respond_once(server, 200, r#"{"node_invalid":true}"#);

    let client = client_for(&url);
    let outcome = client.get_config("NK1").unwrap();
    assert!(outcome.invalid);
}

#[test]
fn malformed_response_is_transport_error() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    respond_once(server, 200, "not json");

    let client = client_for(&url);
    let err = client.enroll("secret", "host1").unwrap_err();
    assert_eq!(err.kind(), submerge_base::ErrorKind::Transport);
}

#[test]
fn check_health_is_unreachable_when_connection_refused() {
    // Nothing listening on this port.
    let client = client_for("http://127.0.0.1:1");
    let status = client.check_health().unwrap();
    assert_eq!(status, HealthStatus::Unreachable);
}

#[test]
fn check_health_maps_healthy_status() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let url = format!("http://{}", server.server_addr());
    respond_once(server, 200, r#"{"status":"healthy"}"#);

    let client = client_for(&url);
    assert_eq!(client.check_health().unwrap(), HealthStatus::Healthy);
}
