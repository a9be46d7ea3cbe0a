use submerge_rowdb::Bucket;

/// The two log streams the buffer keeps distinct end to end (SPEC_FULL.md
/// §4.3's resolved open question: status and result lines are never merged
/// into one bucket).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Kind {
    Status,
    Result,
}

impl Kind {
    pub const ALL: [Kind; 2] = [Kind::Status, Kind::Result];

    pub(crate) fn bucket(self) -> Bucket {
        match self {
            Kind::Status => Bucket::StatusLogs,
            Kind::Result => Bucket::ResultLogs,
        }
    }
}
