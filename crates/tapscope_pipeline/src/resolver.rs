//! Request resolution.

use std::sync::Arc;

use hashbrown::HashSet;
use parking_lot::Mutex;
use tapscope_hooks::Hook;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Resolver kind used for module requests.
pub const NORMAL_RESOLVER: &str = "normal";
/// Resolver kind used for context (lazy) requests.
pub const CONTEXT_RESOLVER: &str = "context";

/// A request handed to the `resolve` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveRequest {
    /// Which resolver is asking.
    pub kind: String,
    /// The request to resolve.
    pub request: String,
}

/// Hooks exposed by the [`ResolverFactory`].
#[derive(Debug)]
pub struct ResolverFactoryHooks {
    /// Fired once per resolver kind, before it is first used.
    pub resolve_options: Hook<String, ()>,
    /// Fired once per resolver kind, when it is created.
    pub resolver: Hook<String, ()>,
    /// Asks taps to resolve a request. The first `Some` wins.
    pub resolve: Hook<ResolveRequest, Option<String>>,
}

/// Creates resolvers and resolves requests to resources.
///
/// The factory installs `ModuleResolverPlugin` on its own `resolve` hook,
/// which resolves any request the configuration declares a module for.
#[derive(Debug)]
pub struct ResolverFactory {
    /// Hooks fired by this factory.
    pub hooks: ResolverFactoryHooks,
    created: Mutex<HashSet<String>>,
}

impl ResolverFactory {
    /// Creates a factory resolving against `config`.
    #[must_use]
    pub fn new(config: Arc<PipelineConfig>) -> Self {
        let factory = Self {
            hooks: ResolverFactoryHooks {
                resolve_options: Hook::new("resolveOptions"),
                resolver: Hook::new("resolver"),
                resolve: Hook::new("resolve"),
            },
            created: Mutex::new(HashSet::new()),
        };

        factory
            .hooks
            .resolve
            .tap_promise("ModuleResolverPlugin", move |request: ResolveRequest| {
                let config = Arc::clone(&config);
                Box::pin(async move {
                    Ok(config
                        .module(&request.request)
                        .map(|module| resource_path(&module.request)))
                })
            });

        factory
    }

    /// Resolves `request` with the resolver of the given kind.
    pub async fn resolve(&self, kind: &str, request: &str) -> Result<String, PipelineError> {
        self.ensure_resolver(kind)?;

        let results = self
            .hooks
            .resolve
            .call_async(ResolveRequest {
                kind: kind.to_owned(),
                request: request.to_owned(),
            })
            .await?;

        results
            .into_iter()
            .flatten()
            .next()
            .ok_or_else(|| PipelineError::module_not_found(request))
    }

    fn ensure_resolver(&self, kind: &str) -> Result<(), PipelineError> {
        if !self.created.lock().insert(kind.to_owned()) {
            return Ok(());
        }
        tracing::debug!(kind, "creating resolver");
        self.hooks.resolve_options.call(kind.to_owned())?;
        self.hooks.resolver.call(kind.to_owned())?;
        Ok(())
    }
}

fn resource_path(request: &str) -> String {
    let trimmed = request.trim_start_matches("./");
    if trimmed.contains('.') {
        format!("/project/{trimmed}")
    } else {
        format!("/project/{trimmed}/index.js")
    }
}
