//! The profiling plugin.
//!
//! [`ProfilingPlugin`] instruments a [`Compiler`] in three phases:
//!
//! 1. **Eager**: the compiler and its resolver factory are instrumented as
//!    soon as the plugin is applied.
//! 2. **Deferred**: a tap on the compiler's `compilation` hook instruments
//!    the compilation, both module factories and every template the
//!    compilation carries.
//! 3. **Keyed**: a probe per configured module type instruments each parser
//!    when the normal module factory creates it.
//!
//! On every `done`, the timings finalized during that run are written to
//! the sink. A failed run writes no report and its timings are left out of
//! the next one.
//!
//! # Example
//!
//! ```no_run
//! use tapscope_pipeline::{Compiler, PipelineConfig};
//! use tapscope_profiler::{ProfilingPlugin, TraceStyle};
//!
//! # async fn example() -> Result<(), tapscope_pipeline::PipelineError> {
//! let compiler = Compiler::new(PipelineConfig::new().with_entry("./src"));
//! let profiler = ProfilingPlugin::new().with_style(TraceStyle::Plain);
//!
//! compiler.apply(&profiler);
//! compiler.run().await?;
//!
//! for record in profiler.timings() {
//!     println!("{}: {:?}", record.id, record.duration());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tapscope_pipeline::{Compiler, Plugin};

use crate::clock::{Clock, ClockProvider};
use crate::emitter::{TraceEmitter, TraceStyle};
use crate::identity::IdentityTable;
use crate::interceptor::{InterceptorFactory, PLUGIN_NAME};
use crate::registry::{ComponentRegistry, DiscoveredHook};
use crate::sink::{StdoutSink, TraceSink};
use crate::timing::{TimingRecord, TimingRecorder};

/// Module types whose parsers are instrumented by default.
pub const DEFAULT_PARSER_MODULE_TYPES: [&str; 4] = [
    tapscope_pipeline::config::JAVASCRIPT_AUTO,
    tapscope_pipeline::config::JAVASCRIPT_ESM,
    tapscope_pipeline::config::JSON,
    tapscope_pipeline::config::WEBASSEMBLY_EXPERIMENTAL,
];

// ─────────────────────────────────────────────────────────────────────────────
// ProfilingSession
// ─────────────────────────────────────────────────────────────────────────────

/// Runtime state of an applied [`ProfilingPlugin`].
pub struct ProfilingSession {
    registry: Arc<ComponentRegistry>,
    recorder: Arc<TimingRecorder>,
    emitter: Arc<TraceEmitter>,
    parser_module_types: Vec<String>,
    /// Number of records already reported or discarded.
    reported: Mutex<usize>,
}

impl ProfilingSession {
    fn new(plugin: &ProfilingPlugin) -> Self {
        let recorder = Arc::new(TimingRecorder::new(plugin.clock.clone()));
        let emitter = Arc::new(TraceEmitter::new(Arc::clone(&plugin.sink), plugin.style));
        let factory = InterceptorFactory::new(
            Arc::new(plugin.identities.clone()),
            Arc::clone(&emitter),
            Arc::clone(&recorder),
        );

        Self {
            registry: Arc::new(ComponentRegistry::new(factory)),
            recorder,
            emitter,
            parser_module_types: plugin.parser_module_types.clone(),
            reported: Mutex::new(0),
        }
    }

    /// The registry that tracks instrumented hooks.
    #[must_use]
    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// The store every wrapped tap records into.
    #[must_use]
    pub fn recorder(&self) -> &Arc<TimingRecorder> {
        &self.recorder
    }

    /// Writes the records finalized since the previous report to the sink.
    ///
    /// Returns the number of report lines written. Calling it again before
    /// any new tap firing completes writes nothing.
    pub fn report(&self) -> usize {
        let mut reported = self.reported.lock();
        let records = self.recorder.records_from(*reported);
        *reported += records.len();

        tracing::debug!(records = records.len(), "writing timing report");
        self.emitter.emit_report(&records);
        records.len()
    }

    /// Drops the records of a failed run from the next report.
    fn discard_pending(&self) {
        let mut reported = self.reported.lock();
        let total = self.recorder.len();
        tracing::debug!(
            discarded = total.saturating_sub(*reported),
            "run failed, skipping timing report"
        );
        *reported = total;
    }

    fn attach(self: &Arc<Self>, compiler: &Compiler) {
        self.registry.discover(compiler);
        self.registry.discover(&*compiler.resolver_factory);

        let session = Arc::clone(self);
        compiler
            .hooks
            .compilation
            .tap(PLUGIN_NAME, move |(compilation, params)| {
                let registry = &session.registry;
                registry.discover_compilation(&compilation);
                registry.discover(&*params.normal_module_factory);
                registry.discover(&*params.context_module_factory);
                registry.probe_parsers(&params.normal_module_factory, &session.parser_module_types);
                Ok(())
            });

        let session = Arc::clone(self);
        compiler.hooks.done.tap(PLUGIN_NAME, move |_stats| {
            session.report();
            Ok(())
        });

        let session = Arc::clone(self);
        compiler.hooks.failed.tap(PLUGIN_NAME, move |_error| {
            session.discard_pending();
            Ok(())
        });
    }
}

impl std::fmt::Debug for ProfilingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilingSession")
            .field("registry", &self.registry)
            .field("recorder", &self.recorder)
            .field("reported", &*self.reported.lock())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ProfilingPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Traces every hook firing and times every tap of a [`Compiler`].
///
/// Configure with the `with_*` methods before applying. The session is
/// created on first apply and shared by every compiler the plugin is
/// applied to.
pub struct ProfilingPlugin {
    identities: IdentityTable,
    style: TraceStyle,
    sink: Arc<dyn TraceSink>,
    clock: Clock,
    parser_module_types: Vec<String>,
    session: OnceLock<Arc<ProfilingSession>>,
}

impl ProfilingPlugin {
    /// Creates a plugin with the built-in identity table, colored output on
    /// stdout and the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identities: IdentityTable::builtin(),
            style: TraceStyle::default(),
            sink: Arc::new(StdoutSink),
            clock: Clock::system(),
            parser_module_types: DEFAULT_PARSER_MODULE_TYPES
                .iter()
                .map(|module_type| (*module_type).to_owned())
                .collect(),
            session: OnceLock::new(),
        }
    }

    /// Sets where trace and report lines are written.
    #[must_use]
    pub fn with_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Sets the time source for timing records.
    #[must_use]
    pub fn with_clock(mut self, provider: Arc<dyn ClockProvider>) -> Self {
        self.clock = Clock::with_provider(provider);
        self
    }

    /// Replaces the identity table.
    #[must_use]
    pub fn with_identities(mut self, identities: IdentityTable) -> Self {
        self.identities = identities;
        self
    }

    /// Sets whether trace lines are colored.
    #[must_use]
    pub fn with_style(mut self, style: TraceStyle) -> Self {
        self.style = style;
        self
    }

    /// Sets the module types whose parsers are instrumented.
    #[must_use]
    pub fn with_parser_module_types<I, S>(mut self, module_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parser_module_types = module_types.into_iter().map(Into::into).collect();
        self
    }

    /// The session, once the plugin has been applied.
    #[must_use]
    pub fn session(&self) -> Option<&Arc<ProfilingSession>> {
        self.session.get()
    }

    /// Finalized timing records, in finalization order.
    #[must_use]
    pub fn timings(&self) -> Vec<TimingRecord> {
        self.session()
            .map(|session| session.recorder.records())
            .unwrap_or_default()
    }

    /// Every hook instrumented so far.
    #[must_use]
    pub fn discovered(&self) -> Vec<DiscoveredHook> {
        self.session()
            .map(|session| session.registry.discovered())
            .unwrap_or_default()
    }
}

impl Default for ProfilingPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for ProfilingPlugin {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn apply(&self, compiler: &Compiler) {
        let session = self
            .session
            .get_or_init(|| Arc::new(ProfilingSession::new(self)));
        session.attach(compiler);

        tracing::info!(
            hooks = session.registry.discovered().len(),
            parser_module_types = ?self.parser_module_types,
            "profiling plugin applied"
        );
    }
}

impl std::fmt::Debug for ProfilingPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfilingPlugin")
            .field("style", &self.style)
            .field("parser_module_types", &self.parser_module_types)
            .field("session", &self.session.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use tapscope_pipeline::PipelineConfig;

    #[test]
    fn default_probes_four_module_types() {
        let plugin = ProfilingPlugin::new();

        assert_eq!(
            plugin.parser_module_types,
            vec![
                "javascript/auto",
                "javascript/esm",
                "json",
                "webassembly/experimental"
            ]
        );
        assert!(plugin.session().is_none());
        assert!(plugin.timings().is_empty());
    }

    #[test]
    fn apply_instruments_compiler_and_resolver_eagerly() {
        let plugin = ProfilingPlugin::new().with_sink(MemorySink::new());
        let compiler = Compiler::new(PipelineConfig::new());

        compiler.apply(&plugin);

        let labels: hashbrown::HashSet<String> = plugin
            .discovered()
            .into_iter()
            .map(|hook| hook.label)
            .collect();
        let expected: hashbrown::HashSet<String> = ["Compiler", "Resolver"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        assert_eq!(labels, expected);
        assert_eq!(compiler.hooks.compilation.tap_names(), vec![PLUGIN_NAME]);
        assert_eq!(compiler.hooks.done.tap_names(), vec![PLUGIN_NAME]);
        assert_eq!(compiler.hooks.failed.tap_names(), vec![PLUGIN_NAME]);
    }

    #[test]
    fn report_writes_only_records_since_last_report() {
        let sink = MemorySink::new();
        let plugin = ProfilingPlugin::new()
            .with_sink(sink.clone())
            .with_style(TraceStyle::Plain);
        let compiler = Compiler::new(PipelineConfig::new());
        compiler.apply(&plugin);
        let Some(session) = plugin.session() else {
            panic!("session missing after apply");
        };
        let id: Arc<str> = Arc::from("run-Logger");

        assert_eq!(session.report(), 0);
        session.recorder().start(&id).finish();
        assert_eq!(session.report(), 1);
        assert_eq!(session.report(), 0);
        assert_eq!(sink.lines().len(), 1);

        session.recorder().start(&id).finish();
        session.discard_pending();
        assert_eq!(session.report(), 0);
        assert_eq!(sink.lines().len(), 1);
    }
}
