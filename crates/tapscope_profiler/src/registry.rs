//! Hook discovery across the pipeline's component tree.
//!
//! Components expose their hooks through [`Component::visit_hooks`]. The
//! [`ComponentRegistry`] walks them, attaches one [`ProfilingInterceptor`] to
//! every hook it has not seen before, and keeps the list of what it found.
//!
//! Some components only exist after a parent fires a setup hook. Parsers are
//! created per module type and announced on a keyed hook
//! ([`HookMap`]); [`ComponentRegistry::probe`] registers a tap on each key
//! that discovers the announced component when it arrives.

use std::sync::Arc;

use hashbrown::HashSet;
use parking_lot::Mutex;
use tapscope_hooks::{Hook, HookId, HookMap, HookMapId};
use tapscope_pipeline::{
    ChunkTemplate, Compilation, Compiler, ContextModuleFactory, HotUpdateChunkTemplate,
    MainTemplate, ModuleTemplate, ModuleTemplateKind, NormalModuleFactory, Parser, ParserOptions,
    ResolverFactory,
};

use crate::identity::{Rgb, labels};
use crate::interceptor::{InterceptorFactory, PLUGIN_NAME, ProfilingInterceptor};

// ─────────────────────────────────────────────────────────────────────────────
// Visitor surface
// ─────────────────────────────────────────────────────────────────────────────

/// A hook, with its argument and result types erased.
pub trait Instrumentable {
    /// The hook's unique ID.
    fn hook_id(&self) -> HookId;
    /// The hook's name, as used in trace lines and timing ids.
    fn hook_name(&self) -> &str;
    /// Attaches `interceptor` to the hook.
    fn instrument(&self, interceptor: ProfilingInterceptor);
}

impl<A, R> Instrumentable for Hook<A, R>
where
    A: Clone + Send + 'static,
    R: Send + 'static,
{
    fn hook_id(&self) -> HookId {
        self.id()
    }

    fn hook_name(&self) -> &str {
        self.name()
    }

    fn instrument(&self, interceptor: ProfilingInterceptor) {
        self.intercept(interceptor);
    }
}

/// Receives each hook a component exposes.
pub trait HookVisitor {
    /// Called once per hook.
    fn visit(&mut self, hook: &dyn Instrumentable);
}

/// A hook-bearing structure in the pipeline.
pub trait Component {
    /// Label used for the trace identity of this component's hooks.
    fn label(&self) -> &str;

    /// Calls `visitor` once per hook this component owns.
    fn visit_hooks(&self, visitor: &mut dyn HookVisitor);
}

macro_rules! visit_hooks {
    ($visitor:expr, $hooks:expr => $($field:ident),+ $(,)?) => {
        $( $visitor.visit(&$hooks.$field); )+
    };
}

impl Component for Compiler {
    fn label(&self) -> &str {
        labels::COMPILER
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks =>
            environment,
            after_environment,
            before_run,
            run,
            normal_module_factory,
            context_module_factory,
            before_compile,
            compile,
            this_compilation,
            compilation,
            make,
            after_compile,
            emit,
            after_emit,
            done,
            failed,
        );
    }
}

impl Component for ResolverFactory {
    fn label(&self) -> &str {
        labels::RESOLVER
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks => resolve_options, resolver, resolve);
    }
}

impl Component for Compilation {
    fn label(&self) -> &str {
        labels::COMPILATION
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks =>
            add_entry,
            build_module,
            succeed_module,
            finish_modules,
            seal,
            optimize,
            optimize_chunks,
            additional_assets,
            after_seal,
        );
    }
}

impl Component for NormalModuleFactory {
    fn label(&self) -> &str {
        labels::NORMAL_MODULE_FACTORY
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks => before_resolve, after_resolve, create_module, module);
    }
}

impl Component for ContextModuleFactory {
    fn label(&self) -> &str {
        labels::CONTEXT_MODULE_FACTORY
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks => before_resolve, after_resolve);
    }
}

impl Component for Parser {
    fn label(&self) -> &str {
        labels::PARSER
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks => program, statement, import, import_call);
    }
}

impl Component for MainTemplate {
    fn label(&self) -> &str {
        labels::MAIN_TEMPLATE
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks => bootstrap, render, hash);
    }
}

impl Component for ChunkTemplate {
    fn label(&self) -> &str {
        labels::CHUNK_TEMPLATE
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks => render, hash);
    }
}

impl Component for HotUpdateChunkTemplate {
    fn label(&self) -> &str {
        labels::HOT_UPDATE_CHUNK_TEMPLATE
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks => render);
    }
}

impl Component for ModuleTemplate {
    fn label(&self) -> &str {
        match self.kind() {
            ModuleTemplateKind::JavaScript => labels::JAVASCRIPT_MODULE_TEMPLATE,
            ModuleTemplateKind::WebAssembly => labels::WEBASSEMBLY_MODULE_TEMPLATE,
        }
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visit_hooks!(visitor, self.hooks => content, render);
    }
}

/// Extracts the parser announced on `normalModuleFactory.hooks.parser`.
#[must_use]
pub fn announced_parser(args: &(Arc<Parser>, ParserOptions)) -> &Parser {
    &args.0
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// A hook the registry has instrumented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredHook {
    /// Label of the owning component.
    pub label: String,
    /// Trace depth resolved for the label.
    pub depth: usize,
    /// Trace color resolved for the label.
    pub color: Rgb,
    /// Name of the hook.
    pub hook_name: String,
    /// ID used to skip the hook on rediscovery.
    pub hook_id: HookId,
}

#[derive(Default)]
struct DiscoveryState {
    instrumented: HashSet<HookId>,
    discovered: Vec<DiscoveredHook>,
    probes: HashSet<(HookMapId, String)>,
    seen: HashSet<(HookMapId, String)>,
}

/// Instruments every hook of the components it is given, once.
pub struct ComponentRegistry {
    factory: InterceptorFactory,
    state: Mutex<DiscoveryState>,
}

impl ComponentRegistry {
    /// Creates a registry that builds interceptors with `factory`.
    #[must_use]
    pub fn new(factory: InterceptorFactory) -> Self {
        Self {
            factory,
            state: Mutex::new(DiscoveryState::default()),
        }
    }

    /// The factory interceptors are made with.
    #[must_use]
    pub fn factory(&self) -> &InterceptorFactory {
        &self.factory
    }

    /// Instruments every hook of `component` not already instrumented.
    ///
    /// Returns the number of newly instrumented hooks.
    pub fn discover(&self, component: &dyn Component) -> usize {
        let mut collector = Collector {
            registry: self,
            label: component.label(),
            added: 0,
        };
        component.visit_hooks(&mut collector);

        tracing::debug!(
            label = collector.label,
            added = collector.added,
            "discovered component"
        );
        collector.added
    }

    /// Instruments a compilation and every template reachable from it.
    ///
    /// Templates the compilation does not carry are skipped.
    pub fn discover_compilation(&self, compilation: &Compilation) -> usize {
        let mut added = self.discover(compilation);
        added += self.discover(&compilation.main_template);
        added += self.discover(&compilation.chunk_template);
        if let Some(hot) = &compilation.hot_update_chunk_template {
            added += self.discover(hot);
        }
        added += self.discover(&compilation.module_templates.javascript);
        if let Some(webassembly) = &compilation.module_templates.webassembly {
            added += self.discover(webassembly);
        }
        added
    }

    /// Discovers `component` unless the `(map, key)` discriminant was
    /// already handled.
    ///
    /// Returns whether discovery ran.
    pub fn discover_keyed(&self, map: HookMapId, key: &str, component: &dyn Component) -> bool {
        if !self.state.lock().seen.insert((map, key.to_owned())) {
            tracing::trace!(key, "discriminant already discovered");
            return false;
        }
        self.discover(component);
        true
    }

    /// Registers one probe tap per key on `map`. When the keyed hook fires,
    /// the probe discovers the component `child` extracts from the
    /// arguments.
    ///
    /// Keys that already carry a probe are skipped. Returns the number of
    /// probes registered.
    pub fn probe<A, C>(
        self: &Arc<Self>,
        map: &HookMap<A, ()>,
        keys: &[String],
        child: fn(&A) -> &C,
    ) -> usize
    where
        A: Clone + Send + 'static,
        C: Component + 'static,
    {
        let map_id = map.id();
        let mut registered = 0;

        for key in keys {
            if !self.state.lock().probes.insert((map_id, key.clone())) {
                continue;
            }

            let registry = Arc::clone(self);
            let discriminant = key.clone();
            map.for_key(key).tap(PLUGIN_NAME, move |args| {
                registry.discover_keyed(map_id, &discriminant, child(&args));
                Ok(())
            });
            registered += 1;
        }

        tracing::debug!(map = map.name(), registered, "registered discovery probes");
        registered
    }

    /// Probes `factory` for the parsers of each module type.
    pub fn probe_parsers(self: &Arc<Self>, factory: &NormalModuleFactory, module_types: &[String]) -> usize {
        self.probe(&factory.hooks.parser, module_types, announced_parser)
    }

    /// Every hook instrumented so far, in discovery order.
    #[must_use]
    pub fn discovered(&self) -> Vec<DiscoveredHook> {
        self.state.lock().discovered.clone()
    }

    /// Whether the hook with ID `hook` carries an interceptor from this
    /// registry.
    #[must_use]
    pub fn is_instrumented(&self, hook: HookId) -> bool {
        self.state.lock().instrumented.contains(&hook)
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ComponentRegistry")
            .field("instrumented", &state.instrumented.len())
            .field("probes", &state.probes.len())
            .finish_non_exhaustive()
    }
}

struct Collector<'a> {
    registry: &'a ComponentRegistry,
    label: &'a str,
    added: usize,
}

impl HookVisitor for Collector<'_> {
    fn visit(&mut self, hook: &dyn Instrumentable) {
        let factory = &self.registry.factory;
        let identity = factory.identity(self.label);

        {
            let mut state = self.registry.state.lock();
            if !state.instrumented.insert(hook.hook_id()) {
                return;
            }
            state.discovered.push(DiscoveredHook {
                label: self.label.to_owned(),
                depth: identity.depth,
                color: identity.color,
                hook_name: hook.hook_name().to_owned(),
                hook_id: hook.hook_id(),
            });
        }

        hook.instrument(factory.make(self.label, hook.hook_name()));
        self.added += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use tapscope_pipeline::{CompilationParams, PipelineConfig};

    use super::*;
    use crate::clock::{Clock, MockClock};
    use crate::emitter::{TraceEmitter, TraceStyle};
    use crate::identity::IdentityTable;
    use crate::sink::MemorySink;
    use crate::timing::TimingRecorder;

    fn registry(sink: &MemorySink) -> Arc<ComponentRegistry> {
        let mock = Arc::new(MockClock::stepping(Instant::now(), Duration::from_millis(1)));
        Arc::new(ComponentRegistry::new(InterceptorFactory::new(
            Arc::new(IdentityTable::builtin()),
            Arc::new(TraceEmitter::new(Arc::new(sink.clone()), TraceStyle::Plain)),
            Arc::new(TimingRecorder::new(Clock::with_provider(mock))),
        )))
    }

    fn hook_names(found: &[DiscoveredHook], label: &str) -> Vec<String> {
        found
            .iter()
            .filter(|hook| hook.label == label)
            .map(|hook| hook.hook_name.clone())
            .collect()
    }

    #[test]
    fn discovers_every_compiler_hook() {
        let registry = registry(&MemorySink::new());
        let compiler = Compiler::new(PipelineConfig::new());

        let added = registry.discover(&compiler);

        assert_eq!(added, 16);
        let found = registry.discovered();
        assert_eq!(found.len(), 16);
        assert!(found.iter().all(|hook| hook.label == "Compiler" && hook.depth == 0));
        assert!(hook_names(&found, "Compiler").contains(&"thisCompilation".to_owned()));
    }

    #[test]
    fn discovery_is_idempotent() {
        let registry = registry(&MemorySink::new());
        let compiler = Compiler::new(PipelineConfig::new());

        let first = registry.discover(&compiler);
        let second = registry.discover(&compiler);
        let again = registry.discover(&*compiler.resolver_factory);

        assert_eq!(first, 16);
        assert_eq!(second, 0);
        assert_eq!(again, 3);
        assert_eq!(registry.discovered().len(), 19);
        assert_eq!(compiler.hooks.run.interceptor_count(), 1);
    }

    #[test]
    fn optional_templates_are_skipped() {
        let registry = registry(&MemorySink::new());
        let compiler = Compiler::new(PipelineConfig::new());
        let compilation = Compilation::new(compiler.config(), params(&compiler));

        let added = registry.discover_compilation(&compilation);

        let found = registry.discovered();
        assert_eq!(added, found.len());
        assert!(hook_names(&found, labels::HOT_UPDATE_CHUNK_TEMPLATE).is_empty());
        assert!(hook_names(&found, labels::WEBASSEMBLY_MODULE_TEMPLATE).is_empty());
        assert_eq!(
            hook_names(&found, labels::MAIN_TEMPLATE),
            vec!["bootstrap", "render", "hash"]
        );
        assert_eq!(
            hook_names(&found, labels::JAVASCRIPT_MODULE_TEMPLATE),
            vec!["content", "render"]
        );
    }

    #[test]
    fn optional_templates_are_discovered_when_present() {
        let registry = registry(&MemorySink::new());
        let compiler = Compiler::new(PipelineConfig::new().with_hot(true).with_webassembly(true));
        let compilation = Compilation::new(compiler.config(), params(&compiler));

        registry.discover_compilation(&compilation);

        let found = registry.discovered();
        assert_eq!(hook_names(&found, labels::HOT_UPDATE_CHUNK_TEMPLATE), vec!["render"]);
        assert_eq!(
            hook_names(&found, labels::WEBASSEMBLY_MODULE_TEMPLATE),
            vec!["content", "render"]
        );
    }

    #[test]
    fn parser_probe_is_registered_once_per_module_type() {
        let registry = registry(&MemorySink::new());
        let compiler = Compiler::new(PipelineConfig::new());
        let params = params(&compiler);
        let types = vec!["javascript/auto".to_owned(), "json".to_owned()];

        let first = registry.probe_parsers(&params.normal_module_factory, &types);
        let second = registry.probe_parsers(&params.normal_module_factory, &types);

        assert_eq!(first, 2);
        assert_eq!(second, 0);
        assert_eq!(
            params
                .normal_module_factory
                .hooks
                .parser
                .for_key("json")
                .tap_count(),
            1
        );
    }

    #[test]
    fn probe_instruments_parser_once_per_discriminant() {
        let sink = MemorySink::new();
        let registry = registry(&sink);
        let compiler = Compiler::new(PipelineConfig::new());
        let params = params(&compiler);
        let types = vec!["javascript/auto".to_owned()];
        registry.probe_parsers(&params.normal_module_factory, &types);

        let parser = params
            .normal_module_factory
            .parser_for("javascript/auto")
            .unwrap();
        let again = Arc::new(Parser::new("javascript/auto", ParserOptions::default()));
        params
            .normal_module_factory
            .hooks
            .parser
            .for_key("javascript/auto")
            .call((Arc::clone(&again), ParserOptions::default()))
            .unwrap();

        let parsers = hook_names(&registry.discovered(), labels::PARSER);
        assert_eq!(parsers, vec!["program", "statement", "import", "importCall"]);
        assert_eq!(parser.hooks.program.interceptor_count(), 1);
        assert_eq!(again.hooks.program.interceptor_count(), 0);
    }

    #[test]
    fn unprobed_module_type_is_not_instrumented() {
        let registry = registry(&MemorySink::new());
        let compiler = Compiler::new(PipelineConfig::new());
        let params = params(&compiler);
        registry.probe_parsers(&params.normal_module_factory, &["json".to_owned()]);

        let parser = params
            .normal_module_factory
            .parser_for("javascript/esm")
            .unwrap();

        assert_eq!(parser.hooks.statement.interceptor_count(), 0);
        assert!(hook_names(&registry.discovered(), labels::PARSER).is_empty());
    }

    fn params(compiler: &Compiler) -> CompilationParams {
        let config = Arc::new(compiler.config().clone());
        CompilationParams {
            normal_module_factory: Arc::new(NormalModuleFactory::new(
                config,
                Arc::clone(&compiler.resolver_factory),
            )),
            context_module_factory: Arc::new(ContextModuleFactory::new(Arc::clone(
                &compiler.resolver_factory,
            ))),
        }
    }
}
