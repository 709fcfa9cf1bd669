//! A single compilation pass: building modules, chunking and rendering.

use std::collections::VecDeque;
use std::sync::Arc;

use hashbrown::HashSet;
use parking_lot::Mutex;
use tapscope_hooks::Hook;

use crate::config::{PipelineConfig, WEBASSEMBLY_EXPERIMENTAL};
use crate::error::PipelineError;
use crate::factory::{ContextModuleFactory, NormalModuleFactory};
use crate::module::Module;
use crate::template::{
    ChunkTemplate, HotUpdateChunkTemplate, MainTemplate, ModuleTemplate, ModuleTemplateKind,
    ModuleTemplates,
};

/// Name of the chunk holding the entry modules.
pub const MAIN_CHUNK: &str = "main";

/// The module factories shared by a compilation.
#[derive(Debug, Clone)]
pub struct CompilationParams {
    /// Factory for statically imported modules.
    pub normal_module_factory: Arc<NormalModuleFactory>,
    /// Factory for lazily imported modules.
    pub context_module_factory: Arc<ContextModuleFactory>,
}

/// A group of modules emitted as one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Chunk name.
    pub name: String,
    /// Requests of the modules in this chunk.
    pub modules: Vec<String>,
}

/// Hooks exposed by a [`Compilation`].
#[derive(Debug)]
pub struct CompilationHooks {
    /// Fired with each entry request.
    pub add_entry: Hook<String, ()>,
    /// Fired before a module is parsed.
    pub build_module: Hook<Arc<Module>, ()>,
    /// Fired after a module is parsed.
    pub succeed_module: Hook<Arc<Module>, ()>,
    /// Fired with all built modules once building is complete.
    pub finish_modules: Hook<Vec<Arc<Module>>, ()>,
    /// Fired when sealing starts.
    pub seal: Hook<(), ()>,
    /// Fired at the start of optimization.
    pub optimize: Hook<(), ()>,
    /// Fired with the chunk names to optimize.
    pub optimize_chunks: Hook<Vec<String>, ()>,
    /// Fired after chunks are rendered, to add extra assets.
    pub additional_assets: Hook<(), ()>,
    /// Fired when sealing is complete.
    pub after_seal: Hook<(), ()>,
}

/// One compilation pass over the module graph.
///
/// Templates are created with the compilation. The hot update chunk
/// template and the WebAssembly module template only exist when the
/// configuration enables them.
#[derive(Debug)]
pub struct Compilation {
    /// Hooks fired by this compilation.
    pub hooks: CompilationHooks,
    /// Template for entry chunks.
    pub main_template: MainTemplate,
    /// Template for non-entry chunks.
    pub chunk_template: ChunkTemplate,
    /// Template for hot update chunks.
    pub hot_update_chunk_template: Option<HotUpdateChunkTemplate>,
    /// Templates for individual modules.
    pub module_templates: ModuleTemplates,
    params: CompilationParams,
    modules: Mutex<Vec<Arc<Module>>>,
    chunks: Mutex<Vec<Chunk>>,
    assets: Mutex<Vec<String>>,
}

struct PendingModule {
    request: String,
    chunk: String,
    lazy: bool,
}

impl Compilation {
    /// Creates a compilation.
    #[must_use]
    pub fn new(config: &PipelineConfig, params: CompilationParams) -> Self {
        Self {
            hooks: CompilationHooks {
                add_entry: Hook::new("addEntry"),
                build_module: Hook::new("buildModule"),
                succeed_module: Hook::new("succeedModule"),
                finish_modules: Hook::new("finishModules"),
                seal: Hook::new("seal"),
                optimize: Hook::new("optimize"),
                optimize_chunks: Hook::new("optimizeChunks"),
                additional_assets: Hook::new("additionalAssets"),
                after_seal: Hook::new("afterSeal"),
            },
            main_template: MainTemplate::new(),
            chunk_template: ChunkTemplate::new(),
            hot_update_chunk_template: config.hot().then(HotUpdateChunkTemplate::new),
            module_templates: ModuleTemplates {
                javascript: ModuleTemplate::new(ModuleTemplateKind::JavaScript),
                webassembly: config
                    .webassembly()
                    .then(|| ModuleTemplate::new(ModuleTemplateKind::WebAssembly)),
            },
            params,
            modules: Mutex::new(Vec::new()),
            chunks: Mutex::new(Vec::new()),
            assets: Mutex::new(Vec::new()),
        }
    }

    /// Returns the factories this compilation builds with.
    #[must_use]
    pub fn params(&self) -> &CompilationParams {
        &self.params
    }

    /// Returns the built modules in build order.
    #[must_use]
    pub fn modules(&self) -> Vec<Arc<Module>> {
        self.modules.lock().clone()
    }

    /// Returns the chunks in creation order.
    #[must_use]
    pub fn chunks(&self) -> Vec<Chunk> {
        self.chunks.lock().clone()
    }

    /// Returns the emitted asset names.
    #[must_use]
    pub fn assets(&self) -> Vec<String> {
        self.assets.lock().clone()
    }

    /// Builds the module graph reachable from `entries`.
    ///
    /// Static imports join their importer's chunk; every lazy import starts
    /// a new chunk and is resolved through the context module factory first.
    pub async fn build_entries(&self, entries: &[String]) -> Result<(), PipelineError> {
        if entries.is_empty() {
            return Err(PipelineError::NoEntry);
        }

        let mut queue = VecDeque::new();
        for entry in entries {
            self.hooks.add_entry.call(entry.clone())?;
            queue.push_back(PendingModule {
                request: entry.clone(),
                chunk: MAIN_CHUNK.to_owned(),
                lazy: false,
            });
        }

        let mut seen = HashSet::new();
        let mut lazy_chunks = 0usize;
        while let Some(pending) = queue.pop_front() {
            if !seen.insert(pending.request.clone()) {
                continue;
            }

            if pending.lazy {
                self.params
                    .context_module_factory
                    .resolve(&pending.request)
                    .await?;
            }
            let module = self
                .params
                .normal_module_factory
                .create(&pending.request)
                .await?;
            self.build_module(&module)?;
            self.add_to_chunk(&pending.chunk, &module.request);

            for request in &module.imports {
                queue.push_back(PendingModule {
                    request: request.clone(),
                    chunk: pending.chunk.clone(),
                    lazy: false,
                });
            }
            for request in &module.lazy_imports {
                lazy_chunks += 1;
                queue.push_back(PendingModule {
                    request: request.clone(),
                    chunk: lazy_chunks.to_string(),
                    lazy: true,
                });
            }
        }
        Ok(())
    }

    /// Parses a module and records it as built.
    pub fn build_module(&self, module: &Arc<Module>) -> Result<(), PipelineError> {
        self.hooks.build_module.call(Arc::clone(module))?;

        let parser = self
            .params
            .normal_module_factory
            .parser_for(&module.module_type)?;
        parser.parse(module)?;

        self.hooks.succeed_module.call(Arc::clone(module))?;
        self.modules.lock().push(Arc::clone(module));
        Ok(())
    }

    /// Signals that all modules are built.
    pub async fn finish(&self) -> Result<(), PipelineError> {
        self.hooks.finish_modules.call_async(self.modules()).await?;
        Ok(())
    }

    /// Optimizes chunks and renders every chunk and module into assets.
    pub async fn seal(&self) -> Result<(), PipelineError> {
        self.hooks.seal.call(())?;
        self.hooks.optimize.call(())?;

        let chunks = self.chunks();
        self.hooks
            .optimize_chunks
            .call(chunks.iter().map(|chunk| chunk.name.clone()).collect())?;

        for chunk in &chunks {
            let asset = if chunk.name == MAIN_CHUNK {
                self.main_template.render(&chunk.name)?
            } else {
                self.chunk_template.render(&chunk.name)?
            };
            self.assets.lock().push(asset);

            if let Some(template) = &self.hot_update_chunk_template {
                let asset = template.render(&chunk.name)?;
                self.assets.lock().push(asset);
            }
        }

        for module in self.modules() {
            self.module_template_for(&module).render(&module.request)?;
        }

        self.hooks.additional_assets.call_async(()).await?;
        self.hooks.after_seal.call_async(()).await?;
        Ok(())
    }

    fn module_template_for(&self, module: &Module) -> &ModuleTemplate {
        match &self.module_templates.webassembly {
            Some(template) if module.module_type == WEBASSEMBLY_EXPERIMENTAL => template,
            _ => &self.module_templates.javascript,
        }
    }

    fn add_to_chunk(&self, chunk: &str, request: &str) {
        let mut chunks = self.chunks.lock();
        match chunks.iter_mut().find(|existing| existing.name == chunk) {
            Some(existing) => existing.modules.push(request.to_owned()),
            None => chunks.push(Chunk {
                name: chunk.to_owned(),
                modules: vec![request.to_owned()],
            }),
        }
    }
}
