//! Interceptors that trace firings and time taps.

use std::sync::Arc;

use tapscope_hooks::{Intercept, Tap};

use crate::emitter::TraceEmitter;
use crate::identity::{Identity, IdentityTable};
use crate::timing::TimingRecorder;
use crate::wrapper::wrap_tap;

/// Tap name used by the profiler's own taps. Taps with this name are left
/// unwrapped.
pub const PLUGIN_NAME: &str = "ProfilingPlugin";

/// Builds one [`ProfilingInterceptor`] per `(label, hook)` pair.
///
/// All interceptors made by one factory share the same identity table,
/// emitter and timing recorder.
#[derive(Debug, Clone)]
pub struct InterceptorFactory {
    identities: Arc<IdentityTable>,
    emitter: Arc<TraceEmitter>,
    recorder: Arc<TimingRecorder>,
}

impl InterceptorFactory {
    /// Creates a factory whose interceptors share one emitter and one
    /// recorder.
    #[must_use]
    pub fn new(
        identities: Arc<IdentityTable>,
        emitter: Arc<TraceEmitter>,
        recorder: Arc<TimingRecorder>,
    ) -> Self {
        Self {
            identities,
            emitter,
            recorder,
        }
    }

    /// Identity for a component label.
    #[must_use]
    pub fn identity(&self, label: &str) -> Identity {
        self.identities.resolve(label)
    }

    /// The store wrapped taps record into.
    #[must_use]
    pub fn recorder(&self) -> &Arc<TimingRecorder> {
        &self.recorder
    }

    /// Interceptor for the hook `hook_name` owned by the component `label`.
    #[must_use]
    pub fn make(&self, label: &str, hook_name: &str) -> ProfilingInterceptor {
        ProfilingInterceptor {
            label: Arc::from(label),
            hook_name: Arc::from(hook_name),
            identity: self.identity(label),
            emitter: Arc::clone(&self.emitter),
            recorder: Arc::clone(&self.recorder),
        }
    }
}

/// Emits a trace line on every firing and wraps every tap with timing.
///
/// Implements [`Intercept`] for any argument and result types, so the same
/// interceptor shape serves every hook in the pipeline.
#[derive(Debug, Clone)]
pub struct ProfilingInterceptor {
    label: Arc<str>,
    hook_name: Arc<str>,
    identity: Identity,
    emitter: Arc<TraceEmitter>,
    recorder: Arc<TimingRecorder>,
}

impl ProfilingInterceptor {
    /// Label of the component owning the hook.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Name of the intercepted hook.
    #[must_use]
    pub fn hook_name(&self) -> &str {
        &self.hook_name
    }

    /// Color and depth of this hook's trace lines.
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.identity
    }
}

impl<A, R> Intercept<A, R> for ProfilingInterceptor
where
    A: Send + 'static,
    R: Send + 'static,
{
    fn register(&self, tap: Tap<A, R>) -> Tap<A, R> {
        if tap.name == PLUGIN_NAME {
            return tap;
        }
        wrap_tap(&self.hook_name, tap, &self.recorder)
    }

    fn call(&self, _args: &A) {
        self.emitter
            .emit_call(&self.label, &self.hook_name, self.identity);
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use parking_lot::Mutex;
    use tapscope_hooks::Hook;

    use super::*;
    use crate::clock::{Clock, MockClock};
    use crate::emitter::TraceStyle;
    use crate::identity::labels;
    use crate::sink::MemorySink;

    fn factory(sink: &MemorySink) -> InterceptorFactory {
        let mock = Arc::new(MockClock::stepping(
            Instant::now(),
            Duration::from_millis(5),
        ));
        InterceptorFactory::new(
            Arc::new(IdentityTable::builtin()),
            Arc::new(TraceEmitter::new(Arc::new(sink.clone()), TraceStyle::Plain)),
            Arc::new(TimingRecorder::new(Clock::with_provider(mock))),
        )
    }

    #[test]
    fn make_resolves_identity() {
        let factory = factory(&MemorySink::new());

        let interceptor = factory.make(labels::PARSER, "statement");

        assert_eq!(interceptor.label(), "Parser");
        assert_eq!(interceptor.hook_name(), "statement");
        assert_eq!(interceptor.identity().depth, 2);
    }

    #[test]
    fn trace_line_precedes_taps() {
        let sink = MemorySink::new();
        let factory = factory(&sink);
        let hook: Hook<(), ()> = Hook::new("run");
        let observed = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&observed);
        let lines = sink.clone();
        hook.tap("Logger", move |()| {
            seen.lock().push(lines.lines().len());
            Ok(())
        });
        hook.intercept(factory.make(labels::COMPILER, "run"));

        hook.call(()).unwrap();

        assert_eq!(sink.lines(), vec!["Intercepting call from Compiler: run hook"]);
        assert_eq!(*observed.lock(), vec![1]);
        assert_eq!(factory.recorder().len(), 1);
    }

    #[test]
    fn own_taps_are_not_wrapped() {
        let sink = MemorySink::new();
        let factory = factory(&sink);
        let hook: Hook<u32, ()> = Hook::new("compilation");
        hook.intercept(factory.make(labels::COMPILER, "compilation"));
        hook.tap(PLUGIN_NAME, |_| Ok(()));
        hook.tap("Other", |_| Ok(()));

        hook.call(7).unwrap();

        let ids: Vec<_> = factory
            .recorder()
            .records()
            .into_iter()
            .map(|record| record.id.to_string())
            .collect();
        assert_eq!(ids, vec!["compilation-Other"]);
    }

    #[test]
    fn call_emits_once_per_firing_even_without_taps() {
        let sink = MemorySink::new();
        let factory = factory(&sink);
        let hook: Hook<(), ()> = Hook::new("afterEmit");
        hook.intercept(factory.make(labels::COMPILER, "afterEmit"));

        hook.call(()).unwrap();
        hook.call(()).unwrap();

        assert_eq!(sink.lines().len(), 2);
        assert!(factory.recorder().is_empty());
    }

    #[test]
    fn unknown_label_uses_default_identity() {
        let sink = MemorySink::new();
        let factory = factory(&sink);
        let hook: Hook<(), ()> = Hook::new("custom");
        hook.intercept(factory.make("Custom Component", "custom"));

        hook.call(()).unwrap();

        assert_eq!(
            sink.lines(),
            vec!["Intercepting call from Custom Component: custom hook"]
        );
    }
}
