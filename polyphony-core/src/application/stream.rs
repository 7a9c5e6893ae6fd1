//! Throttled accumulation of streamed text fragments.
//!
//! Chunks arrive much faster than a UI can usefully repaint, so the
//! accumulated buffer is applied to the store at most once per
//! [`FLUSH_INTERVAL`]. The final flush after the channel closes is
//! unconditional and carries the full buffer, so no tail data is lost to
//! the throttle window.

use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedReceiver;

/// Minimum interval between intermediate flushes.
pub const FLUSH_INTERVAL: Duration = Duration::from_millis(50);

/// Drains `chunks` into one buffer, invoking `apply` with the accumulated
/// text on each throttled flush and once more, unconditionally, at the end.
/// Returns the complete accumulated text.
pub async fn drain_throttled<F>(mut chunks: UnboundedReceiver<String>, mut apply: F) -> String
where
    F: FnMut(&str),
{
    let mut buffer = String::new();
    let mut last_flush: Option<Instant> = None;

    while let Some(fragment) = chunks.recv().await {
        if fragment.is_empty() {
            continue;
        }
        buffer.push_str(&fragment);

        let due = last_flush.is_none_or(|at| at.elapsed() >= FLUSH_INTERVAL);
        if due {
            apply(&buffer);
            last_flush = Some(Instant::now());
        }
    }

    // Final flush regardless of timing: the full text always lands.
    apply(&buffer);
    buffer
}
