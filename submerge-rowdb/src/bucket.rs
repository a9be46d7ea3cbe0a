use redb::TableDefinition;

const CONFIG_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("config");
const STATUS_LOGS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("status-logs");
const RESULT_LOGS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("result-logs");

/// The fixed set of top-level buckets the Store creates idempotently on open.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Bucket {
    Config,
    StatusLogs,
    ResultLogs,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::Config, Bucket::StatusLogs, Bucket::ResultLogs];

    /// The underlying redb table definition. Public so collaborators that
    /// need more than the generic `get`/`put`/`range` calls (the log buffer's
    /// atomic append-and-evict, for one) can open it directly within a
    /// `Store::update` transaction.
    pub fn table(self) -> TableDefinition<'static, &'static [u8], &'static [u8]> {
        match self {
            Bucket::Config => CONFIG_TABLE,
            Bucket::StatusLogs => STATUS_LOGS_TABLE,
            Bucket::ResultLogs => RESULT_LOGS_TABLE,
        }
    }
}
