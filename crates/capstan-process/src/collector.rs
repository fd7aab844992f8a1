//! Per-stream line accumulation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::Notify;
use tracing::warn;

use crate::config::{LineCallback, StreamKind};

/// State shared between a drain task and the waiting orchestrator.
///
/// The buffer is written only by the drain task; the orchestrator reads it
/// after closure, or as a best-effort snapshot when a run is abandoned.
struct StreamState {
    buffer: Mutex<String>,
    closed: AtomicBool,
    notify: Notify,
}

/// Accumulates one child stream line by line and signals its closure
pub(crate) struct StreamCollector {
    state: Arc<StreamState>,
}

impl StreamCollector {
    /// Start draining `reader` on a background task.
    ///
    /// Each received line is handed to `on_line` (if any) before being
    /// appended, with a line separator, to the internal buffer. End of
    /// stream or a read error marks the collector closed.
    pub(crate) fn spawn<R>(kind: StreamKind, reader: R, on_line: Option<LineCallback>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let state = Arc::new(StreamState {
            buffer: Mutex::new(String::new()),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        });

        let task_state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if let Some(callback) = &on_line {
                            callback(kind, &line);
                        }
                        let mut buffer = task_state.buffer.lock();
                        buffer.push_str(&line);
                        buffer.push('\n');
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(stream = ?kind, error = %e, "Stream read failed, treating as closed");
                        break;
                    }
                }
            }
            // Closure is idempotent: the flag only ever flips to true, and
            // waiters re-check it after every wakeup.
            task_state.closed.store(true, Ordering::Release);
            task_state.notify.notify_waiters();
        });

        Self { state }
    }

    /// Collector for a stream that never produced a handle
    pub(crate) fn finished() -> Self {
        Self {
            state: Arc::new(StreamState {
                buffer: Mutex::new(String::new()),
                closed: AtomicBool::new(true),
                notify: Notify::new(),
            }),
        }
    }

    /// Whether the stream has signalled closure
    pub(crate) fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// Wait until the stream signals closure
    pub(crate) async fn closed(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_closed() {
                return;
            }
            notified.await;
        }
    }

    /// Best-effort copy of the accumulated text
    pub(crate) fn snapshot(&self) -> String {
        self.state.buffer.lock().clone()
    }
}
