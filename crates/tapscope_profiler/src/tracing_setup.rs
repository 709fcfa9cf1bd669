//! Subscriber setup for diagnostic logging.
//!
//! The profiler logs through `tracing`: instrumentation at `DEBUG`, each
//! settled tap on target `tapscope::timing`, and (with
//! [`TracingSink`](crate::TracingSink)) trace lines on target
//! `tapscope::trace`. [`TracingSetup`] installs a `tracing-subscriber`
//! formatter for those events, writing to stderr so stdout stays free for
//! trace output.
//!
//! # Example
//!
//! ```
//! use tapscope_profiler::{TracingFormat, TracingSetup};
//! use tracing::Level;
//!
//! TracingSetup::new()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .with_env_filter("tapscope=debug,tapscope::timing=trace")
//!     .init();
//! ```

use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable multi-line output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output.
    Json,
}

/// Builder for the global `tracing` subscriber.
#[derive(Debug, Clone)]
pub struct TracingSetup {
    level: Level,
    format: TracingFormat,
    /// Directive string, e.g. `"tapscope=debug"`.
    env_filter: Option<String>,
    span_events: bool,
}

impl Default for TracingSetup {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingSetup {
    /// Creates a setup with `INFO` level and pretty output.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level used when no filter is given.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets target-specific levels (`target=level,...`).
    ///
    /// An unparseable filter falls back to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Installs the subscriber.
    ///
    /// Returns `false` if a global subscriber was already installed, in
    /// which case the existing one is kept.
    pub fn init(&self) -> bool {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        let layer = match self.format {
            TracingFormat::Pretty => tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_span_events(span_events)
                .boxed(),
            TracingFormat::Compact => tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_span_events(span_events)
                .boxed(),
            TracingFormat::Json => tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_span_events(span_events)
                .boxed(),
        };

        let installed = tracing_subscriber::registry()
            .with(self.filter())
            .with(layer)
            .try_init()
            .is_ok();

        if installed {
            tracing::debug!(level = %self.level, format = ?self.format, "tracing initialized");
        }
        installed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info_and_pretty() {
        let setup = TracingSetup::default();

        assert_eq!(setup.level, Level::INFO);
        assert_eq!(setup.format, TracingFormat::Pretty);
        assert!(setup.env_filter.is_none());
        assert!(!setup.span_events);
    }

    #[test]
    fn builder_sets_every_option() {
        let setup = TracingSetup::new()
            .with_level(Level::TRACE)
            .with_format(TracingFormat::Json)
            .with_env_filter("tapscope=debug")
            .with_span_events(true);

        assert_eq!(setup.level, Level::TRACE);
        assert_eq!(setup.format, TracingFormat::Json);
        assert_eq!(setup.env_filter.as_deref(), Some("tapscope=debug"));
        assert!(setup.span_events);
    }

    #[test]
    fn second_init_keeps_existing_subscriber() {
        TracingSetup::new().with_format(TracingFormat::Compact).init();

        assert!(!TracingSetup::new().init());
    }
}
