//! Destinations for trace and report lines.

use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;

/// Receives rendered trace lines, one call per line.
pub trait TraceSink: Send + Sync {
    /// Writes one line. `line` carries no trailing newline.
    fn emit(&self, line: &str);
}

/// Writes each line to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl TraceSink for StdoutSink {
    fn emit(&self, line: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout is not worth failing a build over.
        let _ = writeln!(stdout, "{line}");
    }
}

/// Forwards each line as an `INFO` event on target `tapscope::trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn emit(&self, line: &str) {
        tracing::info!(target: "tapscope::trace", "{line}");
    }
}

/// Collects lines in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every line emitted so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Forgets every line collected so far.
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl TraceSink for MemorySink {
    fn emit(&self, line: &str) {
        self.lines.lock().push(line.to_owned());
    }
}

impl<S: TraceSink + ?Sized> TraceSink for Arc<S> {
    fn emit(&self, line: &str) {
        (**self).emit(line);
    }
}
