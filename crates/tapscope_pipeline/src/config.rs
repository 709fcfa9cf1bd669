//! Pipeline configuration.

use hashbrown::HashMap;

/// Module type for plain JavaScript with automatic module detection.
pub const JAVASCRIPT_AUTO: &str = "javascript/auto";
/// Module type for ECMAScript modules.
pub const JAVASCRIPT_ESM: &str = "javascript/esm";
/// Module type for JSON documents.
pub const JSON: &str = "json";
/// Module type for WebAssembly binaries.
pub const WEBASSEMBLY_EXPERIMENTAL: &str = "webassembly/experimental";

/// A module known to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    /// Request string that resolves to this module.
    pub request: String,
    /// Module type, which selects the parser.
    pub module_type: String,
    /// Source text.
    pub source: String,
    /// Statically imported requests.
    pub imports: Vec<String>,
    /// Lazily imported requests; each becomes its own chunk.
    pub lazy_imports: Vec<String>,
}

impl ModuleSpec {
    /// Creates a module with no source and no imports.
    #[must_use]
    pub fn new(request: impl Into<String>, module_type: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            module_type: module_type.into(),
            source: String::new(),
            imports: Vec::new(),
            lazy_imports: Vec::new(),
        }
    }

    /// Sets the source text.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Adds static imports.
    #[must_use]
    pub fn with_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports.extend(imports.into_iter().map(Into::into));
        self
    }

    /// Adds lazy imports.
    #[must_use]
    pub fn with_lazy_imports<I, S>(mut self, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lazy_imports.extend(imports.into_iter().map(Into::into));
        self
    }
}

/// Configuration of a pipeline run.
///
/// # Example
///
/// ```
/// use tapscope_pipeline::config::{JAVASCRIPT_AUTO, ModuleSpec, PipelineConfig};
///
/// let config = PipelineConfig::new()
///     .with_entry("./src")
///     .with_module(ModuleSpec::new("./src", JAVASCRIPT_AUTO).with_imports(["./a"]))
///     .with_module(ModuleSpec::new("./a", JAVASCRIPT_AUTO));
///
/// assert_eq!(config.entries(), ["./src"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    entries: Vec<String>,
    modules: HashMap<String, ModuleSpec>,
    hot: bool,
    webassembly: bool,
}

impl PipelineConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry request.
    #[must_use]
    pub fn with_entry(mut self, request: impl Into<String>) -> Self {
        self.entries.push(request.into());
        self
    }

    /// Registers a module.
    #[must_use]
    pub fn with_module(mut self, module: ModuleSpec) -> Self {
        self.modules.insert(module.request.clone(), module);
        self
    }

    /// Enables hot updates, which adds a hot update chunk template.
    #[must_use]
    pub fn with_hot(mut self, enabled: bool) -> Self {
        self.hot = enabled;
        self
    }

    /// Enables WebAssembly support, which adds a WebAssembly module template.
    #[must_use]
    pub fn with_webassembly(mut self, enabled: bool) -> Self {
        self.webassembly = enabled;
        self
    }

    /// Returns the entry requests.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Looks up a module by request.
    #[must_use]
    pub fn module(&self, request: &str) -> Option<&ModuleSpec> {
        self.modules.get(request)
    }

    /// Returns whether hot updates are enabled.
    #[must_use]
    pub fn hot(&self) -> bool {
        self.hot
    }

    /// Returns whether WebAssembly support is enabled.
    #[must_use]
    pub fn webassembly(&self) -> bool {
        self.webassembly
    }
}
