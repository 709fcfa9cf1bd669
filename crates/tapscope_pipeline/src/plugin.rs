//! Plugins extend a [`Compiler`] by tapping its hooks.

use crate::compiler::Compiler;

/// A unit of functionality applied to a compiler before it runs.
///
/// # Example
///
/// ```
/// use tapscope_pipeline::{Compiler, Plugin, PipelineConfig};
///
/// struct LogDone;
///
/// impl Plugin for LogDone {
///     fn name(&self) -> &'static str {
///         "LogDone"
///     }
///
///     fn apply(&self, compiler: &Compiler) {
///         compiler.hooks.done.tap(self.name(), |stats| {
///             println!("built {} modules", stats.modules.len());
///             Ok(())
///         });
///     }
/// }
///
/// let compiler = Compiler::new(PipelineConfig::new());
/// compiler.apply(&LogDone);
/// ```
pub trait Plugin: Send + Sync {
    /// Name used for the plugin's taps.
    fn name(&self) -> &'static str;

    /// Taps the compiler's hooks.
    fn apply(&self, compiler: &Compiler);
}
