use imo_engine::MirrorSink;
use tracing::info;

/// Reports mirror records through the log; a server-rendered page would set them as cookies.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl MirrorSink for LogSink {
    fn write(&self, record: &str) {
        info!(record, "Override mirrored");
    }
}
