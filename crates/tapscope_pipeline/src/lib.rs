//! A hook-driven module build pipeline.
//!
//! `tapscope_pipeline` is a small multi-stage build pipeline whose every
//! stage is exposed as a [`Hook`](tapscope_hooks::Hook). It exists as the
//! host that Tapscope's profiler instruments, and is structured as a tree
//! of hook-bearing components:
//!
//! - [`Compiler`] - root; owns the [`ResolverFactory`]
//! - [`Compilation`] - created per run; owns the templates
//! - [`NormalModuleFactory`] / [`ContextModuleFactory`] - created per run
//! - [`Parser`] - created lazily, once per module type
//! - [`MainTemplate`], [`ChunkTemplate`], [`HotUpdateChunkTemplate`],
//!   [`ModuleTemplate`] - render chunks and modules
//!
//! # Example
//!
//! ```no_run
//! use tapscope_pipeline::{Compiler, PipelineConfig};
//! use tapscope_pipeline::config::{JAVASCRIPT_AUTO, ModuleSpec};
//!
//! # async fn example() -> Result<(), tapscope_pipeline::PipelineError> {
//! let config = PipelineConfig::new()
//!     .with_entry("./src")
//!     .with_module(ModuleSpec::new("./src", JAVASCRIPT_AUTO).with_source("run();"));
//!
//! let compiler = Compiler::new(config);
//! let stats = compiler.run().await?;
//! println!("emitted {:?}", stats.assets);
//! # Ok(())
//! # }
//! ```

pub mod compilation;
pub mod compiler;
pub mod config;
pub mod error;
pub mod factory;
pub mod module;
pub mod parser;
pub mod plugin;
pub mod resolver;
pub mod template;

pub use compilation::{Chunk, Compilation, CompilationParams};
pub use compiler::{Compiler, Stats};
pub use config::{ModuleSpec, PipelineConfig};
pub use error::PipelineError;
pub use factory::{ContextModuleFactory, NormalModuleFactory};
pub use module::Module;
pub use parser::{Parser, ParserOptions};
pub use plugin::Plugin;
pub use resolver::ResolverFactory;
pub use template::{
    ChunkTemplate, HotUpdateChunkTemplate, MainTemplate, ModuleTemplate, ModuleTemplateKind,
    ModuleTemplates,
};
