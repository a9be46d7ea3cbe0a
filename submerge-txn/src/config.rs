/// Tunables for [`crate::LogBuffer`]. Defaults match SPEC_FULL.md §4.3.
#[derive(Clone, Copy, Debug)]
pub struct LogBufferConfig {
    /// Lines longer than this are dropped rather than buffered.
    pub max_line_bytes: usize,
    /// Total value bytes kept per kind; enforced after every append.
    pub max_bucket_bytes: u64,
    /// Aggregate byte budget a single `drain` call will fill before
    /// returning, even if `max_per_batch` has not yet been reached.
    pub max_batch_bytes: u64,
}

impl Default for LogBufferConfig {
    fn default() -> Self {
        LogBufferConfig {
            max_line_bytes: 2 * 1024 * 1024,
            max_bucket_bytes: 50 * 1024 * 1024,
            max_batch_bytes: 3 * 1024 * 1024,
        }
    }
}
