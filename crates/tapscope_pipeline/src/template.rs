//! Templates that render chunks and modules into output.

use tapscope_hooks::Hook;

use crate::error::PipelineError;

/// Hooks exposed by the [`MainTemplate`].
#[derive(Debug)]
pub struct MainTemplateHooks {
    /// Fired with the chunk name before the runtime bootstrap is rendered.
    pub bootstrap: Hook<String, ()>,
    /// Fired with the chunk name when the entry chunk is rendered.
    pub render: Hook<String, ()>,
    /// Fired with the chunk name when the chunk hash is computed.
    pub hash: Hook<String, ()>,
}

/// Renders entry chunks, including the runtime.
#[derive(Debug)]
pub struct MainTemplate {
    /// Hooks fired by this template.
    pub hooks: MainTemplateHooks,
}

impl MainTemplate {
    /// Creates the template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: MainTemplateHooks {
                bootstrap: Hook::new("bootstrap"),
                render: Hook::new("render"),
                hash: Hook::new("hash"),
            },
        }
    }

    /// Renders an entry chunk.
    pub fn render(&self, chunk: &str) -> Result<String, PipelineError> {
        self.hooks.bootstrap.call(chunk.to_owned())?;
        self.hooks.render.call(chunk.to_owned())?;
        self.hooks.hash.call(chunk.to_owned())?;
        Ok(format!("{chunk}.bundle.js"))
    }
}

impl Default for MainTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// Hooks exposed by the [`ChunkTemplate`].
#[derive(Debug)]
pub struct ChunkTemplateHooks {
    /// Fired with the chunk name when a non-entry chunk is rendered.
    pub render: Hook<String, ()>,
    /// Fired with the chunk name when the chunk hash is computed.
    pub hash: Hook<String, ()>,
}

/// Renders non-entry chunks.
#[derive(Debug)]
pub struct ChunkTemplate {
    /// Hooks fired by this template.
    pub hooks: ChunkTemplateHooks,
}

impl ChunkTemplate {
    /// Creates the template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: ChunkTemplateHooks {
                render: Hook::new("render"),
                hash: Hook::new("hash"),
            },
        }
    }

    /// Renders a non-entry chunk.
    pub fn render(&self, chunk: &str) -> Result<String, PipelineError> {
        self.hooks.render.call(chunk.to_owned())?;
        self.hooks.hash.call(chunk.to_owned())?;
        Ok(format!("{chunk}.bundle.js"))
    }
}

impl Default for ChunkTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// Hooks exposed by the [`HotUpdateChunkTemplate`].
#[derive(Debug)]
pub struct HotUpdateChunkTemplateHooks {
    /// Fired with the chunk name when a hot update chunk is rendered.
    pub render: Hook<String, ()>,
}

/// Renders hot update chunks. Only present when hot updates are enabled.
#[derive(Debug)]
pub struct HotUpdateChunkTemplate {
    /// Hooks fired by this template.
    pub hooks: HotUpdateChunkTemplateHooks,
}

impl HotUpdateChunkTemplate {
    /// Creates the template.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hooks: HotUpdateChunkTemplateHooks {
                render: Hook::new("render"),
            },
        }
    }

    /// Renders the hot update for a chunk.
    pub fn render(&self, chunk: &str) -> Result<String, PipelineError> {
        self.hooks.render.call(chunk.to_owned())?;
        Ok(format!("{chunk}.hot-update.js"))
    }
}

impl Default for HotUpdateChunkTemplate {
    fn default() -> Self {
        Self::new()
    }
}

/// Which kind of modules a [`ModuleTemplate`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleTemplateKind {
    /// JavaScript and JSON modules.
    JavaScript,
    /// WebAssembly modules.
    WebAssembly,
}

/// Hooks exposed by a [`ModuleTemplate`].
#[derive(Debug)]
pub struct ModuleTemplateHooks {
    /// Fired with the module request when its content is generated.
    pub content: Hook<String, ()>,
    /// Fired with the module request when it is wrapped for output.
    pub render: Hook<String, ()>,
}

/// Renders individual modules.
#[derive(Debug)]
pub struct ModuleTemplate {
    /// Hooks fired by this template.
    pub hooks: ModuleTemplateHooks,
    kind: ModuleTemplateKind,
}

impl ModuleTemplate {
    /// Creates a template for the given kind of modules.
    #[must_use]
    pub fn new(kind: ModuleTemplateKind) -> Self {
        Self {
            hooks: ModuleTemplateHooks {
                content: Hook::new("content"),
                render: Hook::new("render"),
            },
            kind,
        }
    }

    /// Returns the kind of modules this template renders.
    #[must_use]
    pub fn kind(&self) -> ModuleTemplateKind {
        self.kind
    }

    /// Renders a module.
    pub fn render(&self, request: &str) -> Result<(), PipelineError> {
        self.hooks.content.call(request.to_owned())?;
        self.hooks.render.call(request.to_owned())?;
        Ok(())
    }
}

/// The module templates of a compilation.
#[derive(Debug)]
pub struct ModuleTemplates {
    /// Template for JavaScript and JSON modules.
    pub javascript: ModuleTemplate,
    /// Template for WebAssembly modules, when WebAssembly is enabled.
    pub webassembly: Option<ModuleTemplate>,
}
