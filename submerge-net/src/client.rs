use std::time::Duration;

use reqwest::blocking::Client;
use submerge_base::{kind_err, CorrelationId, Error, ErrorKind, Result};
use tracing::{info_span, warn};

use crate::outcome::{Outcome, PublishOutcome};
use crate::tls::TlsMode;
use crate::types::*;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Typed request/response calls to the management server. One instance is
/// shared (behind `Arc`) by every extension loop; `reqwest::blocking::Client`
/// is `Send + Sync` and internally pools connections, so no extra
/// synchronization is needed here.
pub struct RpcClient {
    http: Client,
    base_url: String,
    deadline: Duration,
}

impl RpcClient {
    pub fn new(base_url: impl Into<String>, deadline: Duration, tls: &TlsMode) -> Result<Self> {
        let mut builder = Client::builder().timeout(deadline);
        builder = tls.apply(builder)?;
        let http = builder
            .build()
            .map_err(|e| Error::new(ErrorKind::Transport, e))?;
        Ok(RpcClient {
            http,
            base_url: base_url.into(),
            deadline,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn post<Req: serde::Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp> {
        let correlation_id = CorrelationId::new();
        let span = info_span!("rpc_call", path, %correlation_id);
        let _entered = span.enter();

        let response = self
            .http
            .post(self.url(path))
            .header(REQUEST_ID_HEADER, correlation_id.to_string())
            .json(body)
            .send()
            .map_err(|e| {
                warn!(%correlation_id, error = %e, "rpc transport failure");
                Error::new(ErrorKind::Transport, e)
            })?;

        if !response.status().is_success() {
            return Err(kind_err(
                ErrorKind::Transport,
                format!("server returned HTTP {}", response.status()),
            ));
        }

        response
            .json::<Resp>()
            .map_err(|e| Error::new(ErrorKind::Transport, e))
    }

    /// `enroll(secret, hostId) -> (nodeKey, invalid, error)`.
    pub fn enroll(&self, secret: &str, host_id: &str) -> Result<Outcome<String>> {
        let resp: EnrollResponse = self.post(
            "/api/v1/enroll",
            &EnrollRequest {
                enroll_secret: secret,
                host_identifier: host_id,
            },
        )?;
        if resp.node_invalid || resp.node_key.is_none() {
            return Ok(Outcome::new(String::new(), true));
        }
        Ok(Outcome::new(resp.node_key.unwrap(), false))
    }

    /// `getConfig(nodeKey) -> (blob, invalid, error)`.
    pub fn get_config(&self, node_key: &str) -> Result<Outcome<Vec<u8>>> {
        let resp: ConfigResponse =
            self.post("/api/v1/config", &NodeKeyRequest { node_key })?;
        if resp.node_invalid {
            return Ok(Outcome::new(Vec::new(), true));
        }
        Ok(Outcome::new(
            resp.config.unwrap_or_default().into_bytes(),
            false,
        ))
    }

    /// `getQueries(nodeKey) -> (queryMap, invalid, error)`.
    pub fn get_queries(
        &self,
        node_key: &str,
    ) -> Result<Outcome<std::collections::BTreeMap<String, String>>> {
        let resp: QueriesResponse =
            self.post("/api/v1/distributed/read", &NodeKeyRequest { node_key })?;
        Ok(Outcome::new(resp.queries, resp.node_invalid))
    }

    /// `publishLogs(nodeKey, kind, lines) -> (msg, errcode, invalid, error)`.
    pub fn publish_logs(
        &self,
        node_key: &str,
        kind: LogKind,
        lines: &[Vec<u8>],
    ) -> Result<PublishOutcome> {
        let resp: PublishResponse = self.post(
            "/api/v1/log",
            &PublishLogsRequest {
                node_key,
                log_type: kind,
                data: lines,
            },
        )?;
        Ok(PublishOutcome {
            message: resp.message,
            error_code: resp.error_code,
            invalid: resp.node_invalid,
        })
    }

    /// `publishResults(nodeKey, results) -> (msg, errcode, invalid, error)`.
    pub fn publish_results(
        &self,
        node_key: &str,
        results: &[QueryResult],
    ) -> Result<PublishOutcome> {
        let resp: PublishResponse = self.post(
            "/api/v1/distributed/write",
            &PublishResultsRequest { node_key, queries: results },
        )?;
        Ok(PublishOutcome {
            message: resp.message,
            error_code: resp.error_code,
            invalid: resp.node_invalid,
        })
    }

    /// `checkHealth() -> (status, error)`.
    pub fn check_health(&self) -> Result<HealthStatus> {
        let correlation_id = CorrelationId::new();
        let result = self
            .http
            .get(self.url("/api/v1/health"))
            .header(REQUEST_ID_HEADER, correlation_id.to_string())
            .send();

        let response = match result {
            Ok(r) => r,
            Err(_) => return Ok(HealthStatus::Unreachable),
        };
        if !response.status().is_success() {
            return Ok(HealthStatus::Unreachable);
        }
        let body: HealthResponse = response
            .json()
            .map_err(|e| Error::new(ErrorKind::Transport, e))?;
        Ok(match body.status.as_str() {
            "healthy" => HealthStatus::Healthy,
            "degraded" => HealthStatus::Degraded,
            _ => HealthStatus::Unreachable,
        })
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}
