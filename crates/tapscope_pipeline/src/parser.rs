//! Per-module-type parsers.

use std::sync::Arc;

use tapscope_hooks::Hook;

use crate::error::PipelineError;
use crate::module::Module;

/// Options a parser was created with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Whether the parser treats sources as strict ES modules.
    pub strict: bool,
}

/// Hooks exposed by a [`Parser`].
#[derive(Debug)]
pub struct ParserHooks {
    /// Fired once per parsed module, before any statement.
    pub program: Hook<Arc<Module>, ()>,
    /// Fired once per non-empty source line.
    pub statement: Hook<String, ()>,
    /// Fired once per static import.
    pub import: Hook<String, ()>,
    /// Fired once per lazy import expression.
    pub import_call: Hook<String, ()>,
}

/// Parses modules of one module type.
#[derive(Debug)]
pub struct Parser {
    /// Hooks fired by this parser.
    pub hooks: ParserHooks,
    module_type: String,
    options: ParserOptions,
}

impl Parser {
    /// Creates a parser for `module_type`.
    #[must_use]
    pub fn new(module_type: impl Into<String>, options: ParserOptions) -> Self {
        Self {
            hooks: ParserHooks {
                program: Hook::new("program"),
                statement: Hook::new("statement"),
                import: Hook::new("import"),
                import_call: Hook::new("importCall"),
            },
            module_type: module_type.into(),
            options,
        }
    }

    /// Returns the module type this parser handles.
    #[must_use]
    pub fn module_type(&self) -> &str {
        &self.module_type
    }

    /// Returns the options this parser was created with.
    #[must_use]
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Walks a module, firing the parser hooks.
    pub fn parse(&self, module: &Arc<Module>) -> Result<(), PipelineError> {
        self.hooks.program.call(Arc::clone(module))?;

        for line in module.source.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.hooks.statement.call(line.to_owned())?;
        }
        for request in &module.imports {
            self.hooks.import.call(request.clone())?;
        }
        for request in &module.lazy_imports {
            self.hooks.import_call.call(request.clone())?;
        }
        Ok(())
    }
}
