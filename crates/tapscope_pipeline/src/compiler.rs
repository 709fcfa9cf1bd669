//! The [`Compiler`]: root of the pipeline and owner of a run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tapscope_hooks::Hook;

use crate::compilation::{Compilation, CompilationParams};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::factory::{ContextModuleFactory, NormalModuleFactory};
use crate::plugin::Plugin;
use crate::resolver::ResolverFactory;

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    /// Requests of the built modules, in build order.
    pub modules: Vec<String>,
    /// Emitted asset names.
    pub assets: Vec<String>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
}

/// Hooks exposed by the [`Compiler`].
#[derive(Debug)]
pub struct CompilerHooks {
    /// Fired when a run starts, before anything else.
    pub environment: Hook<(), ()>,
    /// Fired after `environment`.
    pub after_environment: Hook<(), ()>,
    /// Fired before the run begins.
    pub before_run: Hook<(), ()>,
    /// Fired when the run begins.
    pub run: Hook<(), ()>,
    /// Fired with each new normal module factory.
    pub normal_module_factory: Hook<Arc<NormalModuleFactory>, ()>,
    /// Fired with each new context module factory.
    pub context_module_factory: Hook<Arc<ContextModuleFactory>, ()>,
    /// Fired before a compilation is created.
    pub before_compile: Hook<CompilationParams, ()>,
    /// Fired right before a compilation is created.
    pub compile: Hook<CompilationParams, ()>,
    /// Fired with a new compilation, before `compilation`.
    pub this_compilation: Hook<(Arc<Compilation>, CompilationParams), ()>,
    /// Fired with a new compilation. Plugins use this to reach the
    /// compilation, its factories and its templates.
    pub compilation: Hook<(Arc<Compilation>, CompilationParams), ()>,
    /// Fired to build the module graph.
    pub make: Hook<Arc<Compilation>, ()>,
    /// Fired after the compilation is sealed.
    pub after_compile: Hook<Arc<Compilation>, ()>,
    /// Fired before assets are written.
    pub emit: Hook<Arc<Compilation>, ()>,
    /// Fired after assets are written.
    pub after_emit: Hook<Arc<Compilation>, ()>,
    /// Fired once a run has completed.
    pub done: Hook<Arc<Stats>, ()>,
    /// Fired when a run fails.
    pub failed: Hook<PipelineError, ()>,
}

/// Root of the pipeline.
///
/// The compiler owns the resolver factory and creates a fresh pair of module
/// factories and a fresh [`Compilation`] for each run. The built-in
/// `EntryPlugin` taps `make` to build the configured entries.
#[derive(Debug)]
pub struct Compiler {
    /// Hooks fired by this compiler.
    pub hooks: CompilerHooks,
    /// Resolver factory shared by every compilation.
    pub resolver_factory: Arc<ResolverFactory>,
    config: Arc<PipelineConfig>,
}

impl Compiler {
    /// Creates a compiler for `config`.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        let config = Arc::new(config);
        let compiler = Self {
            hooks: CompilerHooks {
                environment: Hook::new("environment"),
                after_environment: Hook::new("afterEnvironment"),
                before_run: Hook::new("beforeRun"),
                run: Hook::new("run"),
                normal_module_factory: Hook::new("normalModuleFactory"),
                context_module_factory: Hook::new("contextModuleFactory"),
                before_compile: Hook::new("beforeCompile"),
                compile: Hook::new("compile"),
                this_compilation: Hook::new("thisCompilation"),
                compilation: Hook::new("compilation"),
                make: Hook::new("make"),
                after_compile: Hook::new("afterCompile"),
                emit: Hook::new("emit"),
                after_emit: Hook::new("afterEmit"),
                done: Hook::new("done"),
                failed: Hook::new("failed"),
            },
            resolver_factory: Arc::new(ResolverFactory::new(Arc::clone(&config))),
            config,
        };

        let entries = compiler.config.entries().to_vec();
        compiler
            .hooks
            .make
            .tap_promise("EntryPlugin", move |compilation: Arc<Compilation>| {
                let entries = entries.clone();
                Box::pin(async move {
                    compilation.build_entries(&entries).await?;
                    Ok(())
                })
            });

        compiler
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Applies a plugin.
    pub fn apply(&self, plugin: &dyn Plugin) -> &Self {
        tracing::debug!(plugin = plugin.name(), "applying plugin");
        plugin.apply(self);
        self
    }

    /// Runs the pipeline once.
    ///
    /// On success `done` fires with the run's [`Stats`]; on failure `failed`
    /// fires with the error, which is then returned.
    pub async fn run(&self) -> Result<Arc<Stats>, PipelineError> {
        let started = Instant::now();

        match self.run_compilation(started).await {
            Ok(stats) => {
                self.hooks.done.call_async(Arc::clone(&stats)).await?;
                tracing::info!(
                    modules = stats.modules.len(),
                    assets = stats.assets.len(),
                    duration = ?stats.duration,
                    "run complete"
                );
                Ok(stats)
            }
            Err(error) => {
                tracing::warn!(%error, "run failed");
                if let Err(hook_error) = self.hooks.failed.call(error.clone()) {
                    tracing::warn!(error = %hook_error, "failed hook errored");
                }
                Err(error)
            }
        }
    }

    async fn run_compilation(&self, started: Instant) -> Result<Arc<Stats>, PipelineError> {
        self.hooks.environment.call(())?;
        self.hooks.after_environment.call(())?;
        self.hooks.before_run.call_async(()).await?;
        self.hooks.run.call_async(()).await?;

        let params = self.new_compilation_params()?;
        self.hooks.before_compile.call_async(params.clone()).await?;
        self.hooks.compile.call(params.clone())?;

        let compilation = self.new_compilation(params)?;
        self.hooks.make.call_async(Arc::clone(&compilation)).await?;
        compilation.finish().await?;
        compilation.seal().await?;
        self.hooks
            .after_compile
            .call_async(Arc::clone(&compilation))
            .await?;

        self.hooks.emit.call_async(Arc::clone(&compilation)).await?;
        self.hooks
            .after_emit
            .call_async(Arc::clone(&compilation))
            .await?;

        Ok(Arc::new(Stats {
            modules: compilation
                .modules()
                .iter()
                .map(|module| module.request.clone())
                .collect(),
            assets: compilation.assets(),
            duration: started.elapsed(),
        }))
    }

    fn new_compilation_params(&self) -> Result<CompilationParams, PipelineError> {
        let normal_module_factory = Arc::new(NormalModuleFactory::new(
            Arc::clone(&self.config),
            Arc::clone(&self.resolver_factory),
        ));
        self.hooks
            .normal_module_factory
            .call(Arc::clone(&normal_module_factory))?;

        let context_module_factory = Arc::new(ContextModuleFactory::new(Arc::clone(
            &self.resolver_factory,
        )));
        self.hooks
            .context_module_factory
            .call(Arc::clone(&context_module_factory))?;

        Ok(CompilationParams {
            normal_module_factory,
            context_module_factory,
        })
    }

    fn new_compilation(
        &self,
        params: CompilationParams,
    ) -> Result<Arc<Compilation>, PipelineError> {
        let compilation = Arc::new(Compilation::new(&self.config, params.clone()));
        self.hooks
            .this_compilation
            .call((Arc::clone(&compilation), params.clone()))?;
        self.hooks
            .compilation
            .call((Arc::clone(&compilation), params))?;
        Ok(compilation)
    }
}
