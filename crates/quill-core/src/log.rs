//! Caller-facing log sink for protocol milestones.

use std::sync::Arc;

/// Single-argument callback invoked synchronously at protocol milestones.
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Default sink used when the caller supplies none; forwards to `tracing`.
pub fn default_log_sink() -> LogSink {
    Arc::new(|message| tracing::info!("{message}"))
}
