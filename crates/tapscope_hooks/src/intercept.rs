//! Interceptors observe a hook without modifying its taps' logic.

use crate::tap::Tap;

/// An observer attached to a [`Hook`](crate::Hook).
///
/// - [`register`](Intercept::register) runs for every tap on the hook, both
///   the ones already present when the interceptor is attached and every tap
///   registered afterwards. Whatever it returns is what the hook stores.
/// - [`call`](Intercept::call) runs once per firing, before any tap.
///
/// Both methods default to no-ops.
pub trait Intercept<A, R>: Send + Sync {
    /// Transforms a tap before it is installed.
    fn register(&self, tap: Tap<A, R>) -> Tap<A, R> {
        tap
    }

    /// Observes a firing of the hook.
    fn call(&self, _args: &A) {}
}
