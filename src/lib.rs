//! Hook interception and per-tap timing for hook-driven pipelines.
//!
//! Tapscope is split into three layers:
//!
//! - [`tapscope_hooks`]: named extension points with sync, callback and
//!   future taps, plus interceptors
//! - [`tapscope_pipeline`]: a hook-driven module build pipeline
//! - [`tapscope_profiler`]: traces every hook firing and times every tap
//!
//! ```no_run
//! use tapscope::prelude::*;
//!
//! # async fn example() -> Result<(), PipelineError> {
//! let compiler = Compiler::new(PipelineConfig::new().with_entry("./src"));
//! compiler.apply(&ProfilingPlugin::new());
//! compiler.run().await?;
//! # Ok(())
//! # }
//! ```

/// Layer 1: hooks, taps and interceptors.
pub use tapscope_hooks;

/// Layer 2: the build pipeline.
pub use tapscope_pipeline;

/// Layer 3: the profiling engine.
pub use tapscope_profiler;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use tapscope_hooks::prelude::*;
    pub use tapscope_pipeline::{Compiler, PipelineConfig, PipelineError, Plugin};
    pub use tapscope_profiler::{
        IdentityTable, MemorySink, ProfilingPlugin, TraceSink, TraceStyle, TracingFormat,
        TracingSetup,
    };
}
