//! Modules produced by the normal module factory.

/// A resolved, created module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// The request the module was created from.
    pub request: String,
    /// The resolved resource path.
    pub resource: String,
    /// Module type, which selects the parser.
    pub module_type: String,
    /// Source text.
    pub source: String,
    /// Statically imported requests.
    pub imports: Vec<String>,
    /// Lazily imported requests.
    pub lazy_imports: Vec<String>,
}

/// A request on its way through a module factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveData {
    /// The request string.
    pub request: String,
    /// The resolved resource, once known.
    pub resource: Option<String>,
}

impl ResolveData {
    /// Creates unresolved data for `request`.
    #[must_use]
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            resource: None,
        }
    }
}
