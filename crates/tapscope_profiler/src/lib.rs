//! Hook interception and per-tap timing for Tapscope pipelines.
//!
//! `tapscope_profiler` attaches an interceptor to every hook of a
//! [`Compiler`](tapscope_pipeline::Compiler) and the components it creates.
//! Each interceptor does two things:
//!
//! - On every firing it writes an indented, colored trace line naming the
//!   component and hook.
//! - Every tap registered on the hook is wrapped so that each firing records
//!   a [`TimingRecord`] with id `"{hook}-{tap}"`. Sync, callback and future
//!   taps are all supported and keep their exact results and errors.
//!
//! When the compiler's `done` hook fires, one `"{id}: {duration}"` line per
//! record is written.
//!
//! # Example
//!
//! ```no_run
//! use tapscope_pipeline::{Compiler, PipelineConfig};
//! use tapscope_profiler::ProfilingPlugin;
//!
//! # async fn example() -> Result<(), tapscope_pipeline::PipelineError> {
//! let compiler = Compiler::new(PipelineConfig::new().with_entry("./src"));
//! compiler.apply(&ProfilingPlugin::new());
//! compiler.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Components
//!
//! | Type | Role |
//! |------|------|
//! | [`ComponentRegistry`] | Finds hooks and instruments each one once |
//! | [`InterceptorFactory`] | Builds a [`ProfilingInterceptor`] per hook |
//! | [`wrap_tap`] | Adds timing to a single tap |
//! | [`TraceEmitter`] | Renders trace and report lines to a [`TraceSink`] |
//! | [`TimingRecorder`] | Stores finalized [`TimingRecord`]s |
//!
//! # Testing
//!
//! Enable the `test-utils` feature for [`MockClock`], which makes durations
//! deterministic, and capture output with [`MemorySink`].

pub mod clock;
pub mod emitter;
pub mod identity;
pub mod interceptor;
pub mod plugin;
pub mod registry;
pub mod sink;
pub mod timing;
pub mod tracing_setup;
pub mod wrapper;

#[cfg(any(test, feature = "test-utils"))]
pub use clock::MockClock;
pub use clock::{Clock, ClockProvider};
pub use emitter::{INDENT_WIDTH, TraceEmitter, TraceStyle, format_duration};
pub use identity::{DEFAULT_IDENTITY, Identity, IdentityTable, ParseColorError, Rgb, labels};
pub use interceptor::{InterceptorFactory, PLUGIN_NAME, ProfilingInterceptor};
pub use plugin::{DEFAULT_PARSER_MODULE_TYPES, ProfilingPlugin, ProfilingSession};
pub use registry::{Component, ComponentRegistry, DiscoveredHook, HookVisitor, Instrumentable};
pub use sink::{MemorySink, StdoutSink, TraceSink, TracingSink};
pub use timing::{OpenTiming, TimingRecord, TimingRecorder, timing_id};
pub use tracing_setup::{TracingFormat, TracingSetup};
pub use wrapper::wrap_tap;
