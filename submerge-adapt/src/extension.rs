use std::collections::BTreeMap;
use std::sync::Arc;

use submerge_auth::Enroller;
use submerge_base::{kind_err, Error, ErrorKind, Result};
use submerge_net::{LogKind, QueryResult, RpcClient};
use submerge_txn::{Kind, LogBuffer};
use tracing::warn;

use crate::config_cache::ConfigCache;

fn to_net_kind(kind: Kind) -> LogKind {
    match kind {
        Kind::Status => LogKind::Status,
        Kind::Result => LogKind::Result,
    }
}

/// The Telemetry Extension: the plugin-callable surface the inspector
/// invokes, backed by the RPC client, the enrollment gate, and the log
/// buffer (SPEC_FULL.md §4.4). Enrollment itself lives one layer down in
/// [`submerge_auth::Enroller`]; this type owns the re-enroll-and-retry
/// policy every public operation shares.
pub struct Extension {
    client: Arc<RpcClient>,
    enroller: Arc<Enroller>,
    log_buffer: Arc<LogBuffer>,
    config_cache: ConfigCache,
    enroll_secret: String,
}

impl Extension {
    pub fn new(
        store: Arc<submerge_rowdb::Store>,
        client: Arc<RpcClient>,
        enroller: Arc<Enroller>,
        log_buffer: Arc<LogBuffer>,
        enroll_secret: impl Into<String>,
    ) -> Self {
        Extension {
            client,
            enroller,
            log_buffer,
            config_cache: ConfigCache::new(store),
            enroll_secret: enroll_secret.into(),
        }
    }

    fn ensure_enrolled(&self) -> Result<String> {
        if let Some(node_key) = self.enroller.node_key()? {
            return Ok(node_key);
        }
        self.enroller.enroll(&self.enroll_secret)
    }

    /// `Enrolled --invalid response--> Unenrolled` transition: clear the
    /// rejected identity and its config cache, then enroll fresh.
    fn reenroll(&self) -> Result<String> {
        self.enroller.invalidate()?;
        self.config_cache.clear()?;
        self.enroller.enroll(&self.enroll_secret)
    }

    /// Returns the cached or freshly fetched configuration blob.
    pub fn generate_config(&self) -> Result<Vec<u8>> {
        let node_key = self.ensure_enrolled()?;
        match self.client.get_config(&node_key) {
            Ok(outcome) if outcome.invalid => self.generate_config_after_reenroll(),
            Ok(outcome) => {
                self.config_cache.set(&outcome.value)?;
                Ok(outcome.value)
            }
            Err(e) => self.config_fallback(e),
        }
    }

    fn generate_config_after_reenroll(&self) -> Result<Vec<u8>> {
        let node_key = self.reenroll()?;
        let outcome = self.client.get_config(&node_key)?;
        if outcome.invalid {
            return Err(kind_err(
                ErrorKind::InvalidIdentity,
                "server rejected freshly re-enrolled identity",
            ));
        }
        self.config_cache.set(&outcome.value)?;
        Ok(outcome.value)
    }

    fn config_fallback(&self, cause: Error) -> Result<Vec<u8>> {
        match self.config_cache.get()? {
            Some(cached) => {
                warn!(error = %cause, "config fetch failed, serving cached blob");
                Ok(cached)
            }
            None => Err(cause),
        }
    }

    /// Forwards one log line to the log buffer. Never touches the network.
    pub fn log_string(&self, kind: Kind, text: &str) -> Result<()> {
        self.log_buffer.append(kind, text.as_bytes())
    }

    pub fn get_queries(&self) -> Result<BTreeMap<String, String>> {
        let node_key = self.ensure_enrolled()?;
        let outcome = self.client.get_queries(&node_key)?;
        if !outcome.invalid {
            return Ok(outcome.value);
        }
        let node_key = self.reenroll()?;
        let outcome = self.client.get_queries(&node_key)?;
        if outcome.invalid {
            return Err(kind_err(
                ErrorKind::InvalidIdentity,
                "server rejected freshly re-enrolled identity",
            ));
        }
        Ok(outcome.value)
    }

    pub fn write_results(&self, results: &[QueryResult]) -> Result<()> {
        let node_key = self.ensure_enrolled()?;
        let outcome = self.client.publish_results(&node_key, results)?;
        if !outcome.invalid {
            return Ok(());
        }
        let node_key = self.reenroll()?;
        let outcome = self.client.publish_results(&node_key, results)?;
        if outcome.invalid {
            return Err(kind_err(
                ErrorKind::InvalidIdentity,
                "server rejected freshly re-enrolled identity",
            ));
        }
        Ok(())
    }

    /// Publishes one drained batch, re-enrolling and retrying once on
    /// `invalid`. Used by the forwarding loop, which owns ack-on-success.
    pub(crate) fn publish_logs_batch(&self, kind: Kind, lines: &[Vec<u8>]) -> Result<()> {
        let node_key = self.ensure_enrolled()?;
        let net_kind = to_net_kind(kind);
        let outcome = self.client.publish_logs(&node_key, net_kind, lines)?;
        if !outcome.invalid {
            return Ok(());
        }
        let node_key = self.reenroll()?;
        let outcome = self.client.publish_logs(&node_key, net_kind, lines)?;
        if outcome.invalid {
            return Err(kind_err(
                ErrorKind::InvalidIdentity,
                "server rejected freshly re-enrolled identity",
            ));
        }
        Ok(())
    }

    pub(crate) fn log_buffer(&self) -> &Arc<LogBuffer> {
        &self.log_buffer
    }
}
