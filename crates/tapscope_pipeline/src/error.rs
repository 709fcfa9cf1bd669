//! Error types for pipeline runs.

use tapscope_hooks::{HookError, TapError};
use thiserror::Error;

/// Errors that can abort a pipeline run.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A hook failed while firing.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// No module matches the request.
    #[error("Module not found: {request}")]
    ModuleNotFound {
        /// The unresolved request.
        request: String,
    },

    /// The configuration has no entry point.
    #[error("No entry point configured")]
    NoEntry,
}

impl PipelineError {
    /// Creates a [`ModuleNotFound`](Self::ModuleNotFound).
    pub fn module_not_found(request: impl Into<String>) -> Self {
        Self::ModuleNotFound {
            request: request.into(),
        }
    }
}

impl From<PipelineError> for TapError {
    fn from(error: PipelineError) -> Self {
        TapError::new(error)
    }
}
