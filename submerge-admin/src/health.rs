use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use crate::framing::{read_framed, write_framed};
use crate::protocol::{PluginRequest, PluginResponse};

/// One health probe: a `Ping` over the plugin socket, standing in for the
/// spec's "`SELECT 1`-equivalent request against the child" (SPEC_FULL.md
/// §4.5 step 6). Connection failures, timeouts, and non-`Pong` replies are
/// all treated as unhealthy.
pub fn probe(socket_path: &Path, timeout: Duration) -> bool {
    let stream = match UnixStream::connect(socket_path) {
        Ok(s) => s,
        Err(_) => return false,
    };
    if stream.set_read_timeout(Some(timeout)).is_err() {
        return false;
    }
    if stream.set_write_timeout(Some(timeout)).is_err() {
        return false;
    }
    let mut stream = stream;
    if write_framed(&mut stream, &PluginRequest::Ping).is_err() {
        return false;
    }
    matches!(read_framed(&mut stream), Ok(Some(PluginResponse::Pong)))
}

#[cfg(test)]
mod test {
    use super::*;
    use std::os::unix::net::UnixListener;
    use test_log::test;

    #[test]
    fn unreachable_socket_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!probe(&dir.path().join("no.sock"), Duration::from_millis(200)));
    }

    #[test]
    fn responding_pong_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("health.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();
        let handle = std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let _req: PluginRequest = read_framed(&mut stream).unwrap().unwrap();
                write_framed(&mut stream, &PluginResponse::Pong).unwrap();
            }
        });

        assert!(probe(&socket_path, Duration::from_secs(1)));
        handle.join().unwrap();
    }
}
