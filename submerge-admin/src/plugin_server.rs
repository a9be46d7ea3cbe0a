use std::os::unix::net::{UnixListener, UnixStream};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use submerge_adapt::Extension;
use submerge_base::{kind_err, Cancel, Error, ErrorKind, Result};
use tracing::warn;

use crate::framing::{read_framed, write_framed};
use crate::protocol::{PluginRequest, PluginResponse};

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The in-process plugin server (SPEC_FULL.md §4.5 step 5): one accept
/// thread, one handler thread per connection, dispatching the four
/// telemetry-extension capabilities over the framed protocol.
pub struct PluginServer {
    cancel: Cancel,
    accept_handle: Option<std::thread::JoinHandle<()>>,
}

impl PluginServer {
    pub fn bind(socket_path: &Path, extension: Arc<Extension>) -> Result<Self> {
        let _ = std::fs::remove_file(socket_path);
        let listener = UnixListener::bind(socket_path)
            .map_err(|e| kind_err(ErrorKind::ChildStartupFailed, format!("binding plugin socket: {e}")))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| Error::new(ErrorKind::ChildStartupFailed, e))?;

        let cancel = Cancel::new();
        let accept_cancel = cancel.clone();
        let accept_handle = std::thread::spawn(move || accept_loop(listener, accept_cancel, extension));

        Ok(PluginServer {
            cancel,
            accept_handle: Some(accept_handle),
        })
    }

    /// Stops accepting connections and joins the accept thread. Does not
    /// wait for in-flight handler threads; those finish or drop their
    /// connections on their own.
    pub fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.accept_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PluginServer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn accept_loop(listener: UnixListener, cancel: Cancel, extension: Arc<Extension>) {
    while !cancel.is_cancelled() {
        match listener.accept() {
            Ok((stream, _addr)) => {
                let extension = Arc::clone(&extension);
                std::thread::spawn(move || handle_connection(stream, extension));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                cancel.sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                warn!(error = %e, "plugin socket accept failed");
                cancel.sleep(ACCEPT_POLL_INTERVAL);
            }
        }
    }
}

fn handle_connection(mut stream: UnixStream, extension: Arc<Extension>) {
    let _ = stream.set_nonblocking(false);
    loop {
        let request: PluginRequest = match read_framed(&mut stream) {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "plugin connection read failed");
                return;
            }
        };
        let response = dispatch(&extension, request);
        if write_framed(&mut stream, &response).is_err() {
            return;
        }
    }
}

fn dispatch(extension: &Extension, request: PluginRequest) -> PluginResponse {
    match request {
        PluginRequest::Ping => PluginResponse::Pong,
        PluginRequest::GenerateConfig => match extension.generate_config() {
            Ok(blob) => PluginResponse::Config { blob },
            Err(e) => PluginResponse::Error { message: e.to_string() },
        },
        PluginRequest::LogString { kind, text } => {
            match extension.log_string(kind.into(), &text) {
                Ok(()) => PluginResponse::Ack,
                Err(e) => PluginResponse::Error { message: e.to_string() },
            }
        }
        PluginRequest::GetQueries => match extension.get_queries() {
            Ok(query_map) => PluginResponse::Queries { query_map },
            Err(e) => PluginResponse::Error { message: e.to_string() },
        },
        PluginRequest::WriteResults { results } => match extension.write_results(&results) {
            Ok(()) => PluginResponse::Ack,
            Err(e) => PluginResponse::Error { message: e.to_string() },
        },
    }
}

#[cfg(test)]
mod test;
