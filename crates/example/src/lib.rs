//! Example build profiled with Tapscope.
//!
//! Builds a five-module project (two eager imports, two lazy chunks) with a
//! handful of plugins that tap the pipeline in every invocation style, then
//! lets [`ProfilingPlugin`](tapscope_profiler::ProfilingPlugin) trace and
//! time the run.
//!
//! ```text
//! ./src ──▶ ./a        (javascript/esm)
//!       ──▶ ./b        (json)
//!       ┄┄▶ ./a-lazy   (javascript/auto, chunk 1)
//!       ┄┄▶ ./b-lazy   (webassembly/experimental, chunk 2)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tapscope_pipeline::config::{JAVASCRIPT_AUTO, JAVASCRIPT_ESM, JSON, WEBASSEMBLY_EXPERIMENTAL};
use tapscope_pipeline::{Compilation, CompilationParams, Compiler, ModuleSpec, PipelineConfig, Plugin};

/// Options for the sample project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleOptions {
    /// Emit hot-update chunks.
    pub hot: bool,
    /// Render WebAssembly modules with their own template.
    pub webassembly: bool,
}

/// The sample project.
#[must_use]
pub fn sample_config(options: SampleOptions) -> PipelineConfig {
    PipelineConfig::new()
        .with_entry("./src")
        .with_module(
            ModuleSpec::new("./src", JAVASCRIPT_AUTO)
                .with_source(
                    "import a from './a';\nimport b from './b';\nconst lazy = import('./a-lazy');",
                )
                .with_imports(["./a", "./b"])
                .with_lazy_imports(["./a-lazy", "./b-lazy"]),
        )
        .with_module(ModuleSpec::new("./a", JAVASCRIPT_ESM).with_source("export default 'a';"))
        .with_module(ModuleSpec::new("./b", JSON).with_source("{ \"b\": true }"))
        .with_module(
            ModuleSpec::new("./a-lazy", JAVASCRIPT_AUTO).with_source("module.exports = 'lazy';"),
        )
        .with_module(ModuleSpec::new("./b-lazy", WEBASSEMBLY_EXPERIMENTAL))
        .with_hot(options.hot)
        .with_webassembly(options.webassembly)
}

/// Logs the start of every run.
#[derive(Debug, Default)]
pub struct RunLoggerPlugin;

impl Plugin for RunLoggerPlugin {
    fn name(&self) -> &'static str {
        "RunLoggerPlugin"
    }

    fn apply(&self, compiler: &Compiler) {
        compiler.hooks.before_run.tap(self.name(), |()| {
            tracing::info!("build starting");
            Ok(())
        });
    }
}

/// Warms a cache before modules are built.
#[derive(Debug)]
pub struct PrefetchPlugin {
    /// Simulated latency of the warm-up.
    pub latency: Duration,
}

impl Plugin for PrefetchPlugin {
    fn name(&self) -> &'static str {
        "PrefetchPlugin"
    }

    fn apply(&self, compiler: &Compiler) {
        let latency = self.latency;
        compiler
            .hooks
            .make
            .tap_promise(self.name(), move |_compilation: Arc<Compilation>| {
                Box::pin(async move {
                    tokio::time::sleep(latency).await;
                    Ok(())
                })
            });
    }
}

/// Writes assets from a background task and reports back through a
/// continuation.
#[derive(Debug)]
pub struct AssetWriterPlugin {
    /// Simulated write latency.
    pub latency: Duration,
}

impl Plugin for AssetWriterPlugin {
    fn name(&self) -> &'static str {
        "AssetWriterPlugin"
    }

    fn apply(&self, compiler: &Compiler) {
        let latency = self.latency;
        compiler
            .hooks
            .emit
            .tap_async(self.name(), move |compilation: Arc<Compilation>, done| {
                tokio::spawn(async move {
                    tokio::time::sleep(latency).await;
                    tracing::info!(assets = ?compilation.assets(), "assets written");
                    done(Ok(()));
                });
            });
    }
}

/// Counts modules as the compilation builds them.
#[derive(Debug, Default)]
pub struct ModuleCounterPlugin;

impl Plugin for ModuleCounterPlugin {
    fn name(&self) -> &'static str {
        "ModuleCounterPlugin"
    }

    fn apply(&self, compiler: &Compiler) {
        let name = self.name();
        compiler.hooks.compilation.tap(
            name,
            move |(compilation, _params): (Arc<Compilation>, CompilationParams)| {
                compilation.hooks.succeed_module.tap(name, |module| {
                    tracing::debug!(request = %module.request, "module built");
                    Ok(())
                });
                compilation.hooks.seal.tap(name, |()| Ok(()));
                Ok(())
            },
        );
    }
}

/// Applies every demo plugin to `compiler`.
pub fn apply_demo_plugins(compiler: &Compiler) {
    compiler.apply(&RunLoggerPlugin);
    compiler.apply(&PrefetchPlugin {
        latency: Duration::from_millis(15),
    });
    compiler.apply(&AssetWriterPlugin {
        latency: Duration::from_millis(10),
    });
    compiler.apply(&ModuleCounterPlugin);
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tapscope_profiler::{MemorySink, MockClock, ProfilingPlugin, TraceStyle};

    use super::*;

    #[tokio::test]
    async fn demo_plugins_are_timed() {
        let sink = MemorySink::new();
        let profiler = ProfilingPlugin::new()
            .with_sink(sink.clone())
            .with_style(TraceStyle::Plain)
            .with_clock(Arc::new(MockClock::new(Instant::now())));
        let compiler = Compiler::new(sample_config(SampleOptions::default()));
        compiler.apply(&profiler);
        apply_demo_plugins(&compiler);

        let stats = compiler.run().await.unwrap();

        assert_eq!(stats.modules.len(), 5);
        let ids: Vec<_> = profiler
            .timings()
            .into_iter()
            .map(|record| record.id.to_string())
            .collect();
        for expected in [
            "beforeRun-RunLoggerPlugin",
            "make-PrefetchPlugin",
            "emit-AssetWriterPlugin",
            "succeedModule-ModuleCounterPlugin",
            "seal-ModuleCounterPlugin",
        ] {
            assert!(ids.iter().any(|id| id == expected), "missing {expected}");
        }
        assert!(
            sink.lines()
                .iter()
                .any(|line| line == "beforeRun-RunLoggerPlugin: 0.000ms")
        );
    }
}
