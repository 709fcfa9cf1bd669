//! Rendering of trace lines and the final timing report.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use crate::identity::Identity;
use crate::sink::TraceSink;
use crate::timing::TimingRecord;

/// Spaces of indentation per nesting level.
pub const INDENT_WIDTH: usize = 4;

/// Whether trace lines carry terminal styling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TraceStyle {
    /// Bold truecolor, hook name underlined.
    #[default]
    Colored,
    /// Text only.
    Plain,
}

/// Formats a duration as fractional milliseconds, e.g. `5.000ms`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    format!("{:.3}ms", duration.as_secs_f64() * 1000.0)
}

/// Renders lines and hands them to a [`TraceSink`].
///
/// A sink that panics loses the line; the panic does not reach the hook
/// that was firing.
pub struct TraceEmitter {
    sink: Arc<dyn TraceSink>,
    style: TraceStyle,
}

impl TraceEmitter {
    /// Creates an emitter writing to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn TraceSink>, style: TraceStyle) -> Self {
        Self { sink, style }
    }

    /// Returns the rendering style.
    #[must_use]
    pub fn style(&self) -> TraceStyle {
        self.style
    }

    /// `"{indent}Intercepting call from {label}: {hook_name} hook"`.
    #[must_use]
    pub fn render_call(&self, label: &str, hook_name: &str, identity: Identity) -> String {
        let indent = " ".repeat(identity.depth * INDENT_WIDTH);
        let lead = format!("Intercepting call from {label}: ");

        match self.style {
            TraceStyle::Plain => format!("{indent}{lead}{hook_name} hook"),
            TraceStyle::Colored => {
                let color = identity.color;
                format!(
                    "{indent}{}{}{}",
                    lead.truecolor(color.r, color.g, color.b).bold(),
                    hook_name
                        .truecolor(color.r, color.g, color.b)
                        .bold()
                        .underline(),
                    " hook".truecolor(color.r, color.g, color.b).bold(),
                )
            }
        }
    }

    /// Renders a trace line and writes it to the sink.
    pub fn emit_call(&self, label: &str, hook_name: &str, identity: Identity) {
        let line = self.render_call(label, hook_name, identity);
        self.emit(&line);
    }

    /// One `"{id}: {duration}"` line per record, in the order given.
    #[must_use]
    pub fn render_report(records: &[TimingRecord]) -> Vec<String> {
        records
            .iter()
            .map(|record| format!("{}: {}", record.id, format_duration(record.duration())))
            .collect()
    }

    /// Writes one report line per record to the sink.
    pub fn emit_report(&self, records: &[TimingRecord]) {
        for line in Self::render_report(records) {
            self.emit(&line);
        }
    }

    fn emit(&self, line: &str) {
        let sink = &self.sink;
        if catch_unwind(AssertUnwindSafe(|| sink.emit(line))).is_err() {
            tracing::warn!(line, "trace sink panicked; line dropped");
        }
    }
}

impl std::fmt::Debug for TraceEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceEmitter")
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}
