//! Interception behavior on hand-built components.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tapscope_hooks::{Hook, HookError, HookMap, TapError};
use tapscope_profiler::{
    Clock, Component, ComponentRegistry, HookVisitor, IdentityTable, InterceptorFactory,
    MemorySink, MockClock, TimingRecorder, TraceEmitter, TraceStyle, labels,
};

struct Engine {
    registry: Arc<ComponentRegistry>,
    recorder: Arc<TimingRecorder>,
    emitter: Arc<TraceEmitter>,
    sink: MemorySink,
}

impl Engine {
    fn new() -> Self {
        let sink = MemorySink::new();
        let clock = Arc::new(MockClock::stepping(Instant::now(), Duration::from_millis(2)));
        let recorder = Arc::new(TimingRecorder::new(Clock::with_provider(clock)));
        let emitter = Arc::new(TraceEmitter::new(Arc::new(sink.clone()), TraceStyle::Plain));
        let factory = InterceptorFactory::new(
            Arc::new(IdentityTable::builtin()),
            Arc::clone(&emitter),
            Arc::clone(&recorder),
        );

        Self {
            registry: Arc::new(ComponentRegistry::new(factory)),
            recorder,
            emitter,
            sink,
        }
    }

    fn report(&self) -> Vec<String> {
        self.sink.clear();
        self.emitter.emit_report(&self.recorder.records());
        self.sink.lines()
    }
}

struct Runner {
    before_run: Hook<(), i32>,
}

impl Component for Runner {
    fn label(&self) -> &str {
        labels::COMPILER
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visitor.visit(&self.before_run);
    }
}

struct Lookup {
    resolve: Hook<String, String>,
}

impl Component for Lookup {
    fn label(&self) -> &str {
        labels::RESOLVER
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visitor.visit(&self.resolve);
    }
}

struct Child {
    walk: Hook<u32, ()>,
    leave: Hook<u32, ()>,
}

impl Child {
    fn new() -> Self {
        Self {
            walk: Hook::new("walk"),
            leave: Hook::new("leave"),
        }
    }
}

impl Component for Child {
    fn label(&self) -> &str {
        labels::PARSER
    }

    fn visit_hooks(&self, visitor: &mut dyn HookVisitor) {
        visitor.visit(&self.walk);
        visitor.visit(&self.leave);
    }
}

fn announced_child(args: &Arc<Child>) -> &Child {
    args
}

#[test]
fn sync_tap_is_traced_and_returns_its_value() {
    let engine = Engine::new();
    let runner = Runner {
        before_run: Hook::new("beforeRun"),
    };
    runner.before_run.tap("Answer", |()| Ok(42));

    engine.registry.discover(&runner);
    let results = runner.before_run.call(()).unwrap();

    assert_eq!(results, vec![42]);
    let lines = engine.sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Compiler"));
    assert!(lines[0].contains("beforeRun"));
    assert!(!lines[0].starts_with(' '));
}

#[tokio::test]
async fn callback_tap_forwards_result_and_is_recorded_once() {
    let engine = Engine::new();
    let lookup = Lookup {
        resolve: Hook::new("resolve"),
    };
    lookup.resolve.tap_async("DelayedLookup", |_request, done| {
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(5));
            done(Ok("found".to_owned()));
        });
    });
    engine.registry.discover(&lookup);

    let results = lookup.resolve.call_async("./a".to_owned()).await.unwrap();

    assert_eq!(results, vec!["found"]);
    let report = engine.report();
    assert_eq!(report.len(), 1);
    assert!(report[0].starts_with("resolve-DelayedLookup: "));
}

#[tokio::test]
async fn rejected_promise_reaches_caller_after_recording() {
    let engine = Engine::new();
    let lookup = Lookup {
        resolve: Hook::new("resolve"),
    };
    let rejection = TapError::msg("E");
    let thrown = rejection.clone();
    lookup.resolve.tap_promise("Rejecting", move |_request| {
        let thrown = thrown.clone();
        Box::pin(async move { Err(thrown) })
    });
    engine.registry.discover(&lookup);

    let error = lookup
        .resolve
        .call_async("./missing".to_owned())
        .await
        .unwrap_err();

    let HookError::Tap { tap, source, .. } = &error else {
        panic!("unexpected error: {error}");
    };
    assert_eq!(tap, "Rejecting");
    assert!(source.ptr_eq(&rejection));
    assert_eq!(engine.report(), vec!["resolve-Rejecting: 2.000ms"]);
}

#[test]
fn thrown_sync_error_is_identical_and_recorded() {
    let engine = Engine::new();
    let runner = Runner {
        before_run: Hook::new("beforeRun"),
    };
    let failure = TapError::msg("broken");
    let thrown = failure.clone();
    runner
        .before_run
        .tap("Broken", move |()| Err(thrown.clone()));
    engine.registry.discover(&runner);

    let error = runner.before_run.call(()).unwrap_err();

    assert!(error.tap_error().is_some_and(|source| source.ptr_eq(&failure)));
    assert_eq!(engine.report(), vec!["beforeRun-Broken: 2.000ms"]);
}

#[test]
fn keyed_discovery_instruments_each_discriminant_once() {
    let engine = Engine::new();
    let setup: HookMap<Arc<Child>, ()> = HookMap::new("setup");
    let keys = vec!["json".to_owned(), "esm".to_owned()];
    engine.registry.probe(&setup, &keys, announced_child);

    let json = Arc::new(Child::new());
    let esm = Arc::new(Child::new());
    setup.for_key("json").call(Arc::clone(&json)).unwrap();
    setup.for_key("esm").call(Arc::clone(&esm)).unwrap();

    let late = Arc::new(Child::new());
    setup.for_key("json").call(Arc::clone(&late)).unwrap();

    let discovered = engine.registry.discovered();
    assert_eq!(discovered.len(), 4);
    assert!(discovered.iter().all(|hook| hook.label == "Parser"));
    assert_eq!(json.walk.interceptor_count(), 1);
    assert_eq!(esm.leave.interceptor_count(), 1);
    assert_eq!(late.walk.interceptor_count(), 0);
}

#[test]
fn rediscovery_does_not_double_wrap() {
    let engine = Engine::new();
    let runner = Runner {
        before_run: Hook::new("beforeRun"),
    };
    runner.before_run.tap("Answer", |()| Ok(42));

    engine.registry.discover(&runner);
    let first = engine.registry.discovered();
    engine.registry.discover(&runner);
    let second = engine.registry.discovered();
    runner.before_run.call(()).unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.sink.lines().len(), 1);
    assert_eq!(engine.recorder.len(), 1);
}

#[test]
fn interceptor_fires_before_every_tap() {
    let engine = Engine::new();
    let child = Child::new();
    let order = Arc::new(Mutex::new(Vec::new()));
    for name in ["First", "Second"] {
        let order = Arc::clone(&order);
        let sink = engine.sink.clone();
        child.walk.tap(name, move |_| {
            order.lock().push((name, sink.lines().len()));
            Ok(())
        });
    }
    engine.registry.discover(&child);

    child.walk.call(1).unwrap();
    child.walk.call(2).unwrap();

    assert_eq!(
        *order.lock(),
        vec![("First", 1), ("Second", 1), ("First", 2), ("Second", 2)]
    );
    assert!(engine.sink.lines()[0].starts_with("        Intercepting call from Parser"));
}

#[test]
fn taps_registered_after_discovery_are_wrapped() {
    let engine = Engine::new();
    let child = Child::new();
    engine.registry.discover(&child);

    child.leave.tap("Late", |_| Ok(()));
    child.leave.call(0).unwrap();

    let ids: Vec<_> = engine
        .recorder
        .records()
        .into_iter()
        .map(|record| record.id.to_string())
        .collect();
    assert_eq!(ids, vec!["leave-Late"]);
}
