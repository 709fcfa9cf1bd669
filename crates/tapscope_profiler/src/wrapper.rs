//! Timing wrappers for the three tap invocation kinds.

use std::sync::Arc;

use tapscope_hooks::{Tap, TapFn};

use crate::timing::{TimingRecorder, timing_id};

/// Returns a tap that behaves exactly like `tap` but records a
/// [`TimingRecord`](crate::TimingRecord) for each firing.
///
/// The wrapped tap keeps the original name and invocation kind, receives the
/// same arguments, and yields the same result or error. The record is
/// finalized before the caller observes that result:
///
/// - **Sync**: when the callback returns, or unwinds.
/// - **Async**: inside the replacement continuation, before forwarding.
/// - **Promise**: when the original future settles. A future dropped before
///   settling leaves its record open and unreported.
pub fn wrap_tap<A, R>(hook_name: &str, tap: Tap<A, R>, recorder: &Arc<TimingRecorder>) -> Tap<A, R>
where
    A: Send + 'static,
    R: Send + 'static,
{
    let id: Arc<str> = Arc::from(timing_id(hook_name, &tap.name));
    let recorder = Arc::clone(recorder);
    let Tap { name, func } = tap;

    tracing::trace!(id = %id, kind = %func.kind(), "wrapping tap");

    match func {
        TapFn::Sync(f) => Tap::sync(name, move |args| {
            let _timing = recorder.start(&id).finish_on_drop();
            f(args)
        }),
        TapFn::Async(f) => Tap::callback(name, move |args, callback| {
            let timing = recorder.start(&id);
            f(
                args,
                Box::new(move |result| {
                    timing.finish();
                    callback(result);
                }),
            );
        }),
        TapFn::Promise(f) => Tap::promise(name, move |args| {
            let timing = recorder.start(&id);
            let pending = f(args);
            Box::pin(async move {
                let result = pending.await;
                timing.finish();
                result
            })
        }),
    }
}
