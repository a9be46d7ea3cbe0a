use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The single config source name the extension publishes under, mirroring
/// how the plugin ABI's config provider returns `{name: blob}`.
pub const CONFIG_SOURCE_NAME: &str = "";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Status,
    Result,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unreachable,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueryResult {
    pub query_id: String,
    pub status_code: i32,
    pub rows: Vec<BTreeMap<String, String>>,
}

#[derive(Serialize)]
pub(crate) struct EnrollRequest<'a> {
    pub enroll_secret: &'a str,
    pub host_identifier: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct EnrollResponse {
    #[serde(default)]
    pub node_key: Option<String>,
    #[serde(default)]
    pub node_invalid: bool,
}

#[derive(Serialize)]
pub(crate) struct NodeKeyRequest<'a> {
    pub node_key: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ConfigResponse {
    #[serde(default)]
    pub config: Option<String>,
    #[serde(default)]
    pub node_invalid: bool,
}

#[derive(Deserialize)]
pub(crate) struct QueriesResponse {
    #[serde(default)]
    pub queries: BTreeMap<String, String>,
    #[serde(default)]
    pub node_invalid: bool,
}

#[derive(Serialize)]
pub(crate) struct PublishLogsRequest<'a> {
    pub node_key: &'a str,
    pub log_type: LogKind,
    pub data: &'a [Vec<u8>],
}

#[derive(Serialize)]
pub(crate) struct PublishResultsRequest<'a> {
    pub node_key: &'a str,
    pub queries: &'a [QueryResult],
}

#[derive(Deserialize)]
pub(crate) struct PublishResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub node_invalid: bool,
}

#[derive(Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
}
