//! Module factories.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use tapscope_hooks::{Hook, HookMap};

use crate::config::{JAVASCRIPT_ESM, PipelineConfig};
use crate::error::PipelineError;
use crate::module::{Module, ResolveData};
use crate::parser::{Parser, ParserOptions};
use crate::resolver::{CONTEXT_RESOLVER, NORMAL_RESOLVER, ResolverFactory};

// ─────────────────────────────────────────────────────────────────────────────
// NormalModuleFactory
// ─────────────────────────────────────────────────────────────────────────────

/// Hooks exposed by the [`NormalModuleFactory`].
#[derive(Debug)]
pub struct NormalModuleFactoryHooks {
    /// Fired before a request is resolved.
    pub before_resolve: Hook<ResolveData, ()>,
    /// Fired after a request is resolved.
    pub after_resolve: Hook<ResolveData, ()>,
    /// Fired before a module is created from resolved data.
    pub create_module: Hook<ResolveData, ()>,
    /// Fired with every created module.
    pub module: Hook<Arc<Module>, ()>,
    /// Fired with each new parser, keyed by module type.
    pub parser: HookMap<(Arc<Parser>, ParserOptions), ()>,
}

/// Resolves requests and creates modules from them.
///
/// Parsers are created lazily, once per module type, and reused for every
/// later module of that type.
#[derive(Debug)]
pub struct NormalModuleFactory {
    /// Hooks fired by this factory.
    pub hooks: NormalModuleFactoryHooks,
    config: Arc<PipelineConfig>,
    resolver_factory: Arc<ResolverFactory>,
    parsers: Mutex<HashMap<String, Arc<Parser>>>,
}

impl NormalModuleFactory {
    /// Creates a factory.
    #[must_use]
    pub fn new(config: Arc<PipelineConfig>, resolver_factory: Arc<ResolverFactory>) -> Self {
        Self {
            hooks: NormalModuleFactoryHooks {
                before_resolve: Hook::new("beforeResolve"),
                after_resolve: Hook::new("afterResolve"),
                create_module: Hook::new("createModule"),
                module: Hook::new("module"),
                parser: HookMap::new("parser"),
            },
            config,
            resolver_factory,
            parsers: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves `request` and creates its module.
    pub async fn create(&self, request: &str) -> Result<Arc<Module>, PipelineError> {
        let data = ResolveData::new(request);
        self.hooks.before_resolve.call_async(data.clone()).await?;

        let resource = self
            .resolver_factory
            .resolve(NORMAL_RESOLVER, request)
            .await?;
        let data = ResolveData {
            resource: Some(resource.clone()),
            ..data
        };
        self.hooks.after_resolve.call_async(data.clone()).await?;
        self.hooks.create_module.call(data)?;

        let spec = self
            .config
            .module(request)
            .ok_or_else(|| PipelineError::module_not_found(request))?;
        let module = Arc::new(Module {
            request: spec.request.clone(),
            resource,
            module_type: spec.module_type.clone(),
            source: spec.source.clone(),
            imports: spec.imports.clone(),
            lazy_imports: spec.lazy_imports.clone(),
        });

        self.hooks.module.call(Arc::clone(&module))?;
        tracing::debug!(request, module_type = %module.module_type, "created module");
        Ok(module)
    }

    /// Returns the parser for `module_type`, creating it on first use.
    pub fn parser_for(&self, module_type: &str) -> Result<Arc<Parser>, PipelineError> {
        if let Some(parser) = self.parsers.lock().get(module_type) {
            return Ok(Arc::clone(parser));
        }

        let options = ParserOptions {
            strict: module_type == JAVASCRIPT_ESM,
        };
        let parser = Arc::new(Parser::new(module_type, options.clone()));
        self.hooks
            .parser
            .for_key(module_type)
            .call((Arc::clone(&parser), options))?;

        tracing::debug!(module_type, "created parser");
        self.parsers
            .lock()
            .insert(module_type.to_owned(), Arc::clone(&parser));
        Ok(parser)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ContextModuleFactory
// ─────────────────────────────────────────────────────────────────────────────

/// Hooks exposed by the [`ContextModuleFactory`].
#[derive(Debug)]
pub struct ContextModuleFactoryHooks {
    /// Fired before a lazy request is resolved.
    pub before_resolve: Hook<ResolveData, ()>,
    /// Fired after a lazy request is resolved.
    pub after_resolve: Hook<ResolveData, ()>,
}

/// Resolves lazy (context) requests.
#[derive(Debug)]
pub struct ContextModuleFactory {
    /// Hooks fired by this factory.
    pub hooks: ContextModuleFactoryHooks,
    resolver_factory: Arc<ResolverFactory>,
}

impl ContextModuleFactory {
    /// Creates a factory.
    #[must_use]
    pub fn new(resolver_factory: Arc<ResolverFactory>) -> Self {
        Self {
            hooks: ContextModuleFactoryHooks {
                before_resolve: Hook::new("beforeResolve"),
                after_resolve: Hook::new("afterResolve"),
            },
            resolver_factory,
        }
    }

    /// Resolves a lazy request.
    pub async fn resolve(&self, request: &str) -> Result<String, PipelineError> {
        let data = ResolveData::new(request);
        self.hooks.before_resolve.call_async(data.clone()).await?;

        let resource = self
            .resolver_factory
            .resolve(CONTEXT_RESOLVER, request)
            .await?;
        self.hooks
            .after_resolve
            .call_async(ResolveData {
                resource: Some(resource.clone()),
                ..data
            })
            .await?;
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{JAVASCRIPT_AUTO, JSON, ModuleSpec};

    fn factory() -> NormalModuleFactory {
        let config = Arc::new(
            PipelineConfig::new()
                .with_module(ModuleSpec::new("./src", JAVASCRIPT_AUTO).with_imports(["./data.json"]))
                .with_module(ModuleSpec::new("./data.json", JSON)),
        );
        let resolver = Arc::new(ResolverFactory::new(Arc::clone(&config)));
        NormalModuleFactory::new(config, resolver)
    }

    #[tokio::test]
    async fn create_builds_module_from_config() {
        let factory = factory();
        let module = factory.create("./src").await.unwrap();

        assert_eq!(module.resource, "/project/src/index.js");
        assert_eq!(module.module_type, JAVASCRIPT_AUTO);
        assert_eq!(module.imports, vec!["./data.json"]);
    }

    #[test]
    fn parser_is_created_once_per_type() {
        let factory = factory();
        let created = Arc::new(Mutex::new(Vec::new()));
        let created_clone = Arc::clone(&created);
        factory
            .hooks
            .parser
            .for_key(JSON)
            .tap("Counter", move |(parser, _options): (Arc<Parser>, ParserOptions)| {
                created_clone.lock().push(parser.module_type().to_owned());
                Ok(())
            });

        let first = factory.parser_for(JSON).unwrap();
        let second = factory.parser_for(JSON).unwrap();
        factory.parser_for(JAVASCRIPT_AUTO).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*created.lock(), vec![JSON]);
    }

    #[tokio::test]
    async fn context_factory_resolves_lazy_requests() {
        let config = Arc::new(PipelineConfig::new().with_module(ModuleSpec::new("./lazy", JAVASCRIPT_AUTO)));
        let factory = ContextModuleFactory::new(Arc::new(ResolverFactory::new(config)));

        assert_eq!(factory.resolve("./lazy").await.unwrap(), "/project/lazy/index.js");
        assert!(factory.resolve("./gone").await.is_err());
    }
}
