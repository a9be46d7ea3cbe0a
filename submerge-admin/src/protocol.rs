use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use submerge_net::QueryResult;

/// The four plugin capabilities the extension registers, multiplexed over
/// one length-prefixed `rmp-serde` request/response pair per connection
/// (SPEC_FULL.md §4.5 step 5; the wire framing is this implementation's
/// own choice, not part of the inspector's plugin ABI itself).
#[derive(Debug, Serialize, Deserialize)]
pub enum PluginRequest {
    Ping,
    GenerateConfig,
    LogString { kind: LogKindWire, text: String },
    GetQueries,
    WriteResults { results: Vec<QueryResult> },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum LogKindWire {
    Status,
    Result,
}

impl From<LogKindWire> for submerge_txn::Kind {
    fn from(kind: LogKindWire) -> Self {
        match kind {
            LogKindWire::Status => submerge_txn::Kind::Status,
            LogKindWire::Result => submerge_txn::Kind::Result,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub enum PluginResponse {
    Pong,
    Config { blob: Vec<u8> },
    Ack,
    Queries { query_map: BTreeMap<String, String> },
    Error { message: String },
}
