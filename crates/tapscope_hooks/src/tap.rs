//! Taps: callbacks registered on a hook.

use core::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::TapError;

/// Continuation handed to an [`InvocationKind::Async`] tap.
///
/// The tap completes by calling it exactly once with its result.
pub type Callback<R> = Box<dyn FnOnce(Result<R, TapError>) + Send>;

/// Callback of a synchronous tap.
pub type SyncFn<A, R> = Arc<dyn Fn(A) -> Result<R, TapError> + Send + Sync>;

/// Callback of a continuation-style asynchronous tap.
pub type AsyncFn<A, R> = Arc<dyn Fn(A, Callback<R>) + Send + Sync>;

/// Callback of a future-style asynchronous tap.
pub type PromiseFn<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<R, TapError>> + Send + Sync>;

/// How a tap signals completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    /// Returns its result directly.
    Sync,
    /// Passes its result to a trailing continuation.
    Async,
    /// Returns a future resolving to its result.
    Promise,
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvocationKind::Sync => "sync",
            InvocationKind::Async => "async",
            InvocationKind::Promise => "promise",
        };
        f.write_str(name)
    }
}

/// The callback of a tap, tagged with its invocation kind.
pub enum TapFn<A, R> {
    /// See [`InvocationKind::Sync`].
    Sync(SyncFn<A, R>),
    /// See [`InvocationKind::Async`].
    Async(AsyncFn<A, R>),
    /// See [`InvocationKind::Promise`].
    Promise(PromiseFn<A, R>),
}

impl<A, R> TapFn<A, R> {
    /// Returns the invocation kind of this callback.
    #[must_use]
    pub fn kind(&self) -> InvocationKind {
        match self {
            TapFn::Sync(_) => InvocationKind::Sync,
            TapFn::Async(_) => InvocationKind::Async,
            TapFn::Promise(_) => InvocationKind::Promise,
        }
    }
}

impl<A, R> Clone for TapFn<A, R> {
    fn clone(&self) -> Self {
        match self {
            TapFn::Sync(f) => TapFn::Sync(Arc::clone(f)),
            TapFn::Async(f) => TapFn::Async(Arc::clone(f)),
            TapFn::Promise(f) => TapFn::Promise(Arc::clone(f)),
        }
    }
}

/// A named callback registered on a hook.
///
/// Tap names identify the contributor (usually a plugin) and need not be
/// unique within a hook.
pub struct Tap<A, R> {
    /// Name of the contributor.
    pub name: String,
    /// The callback.
    pub func: TapFn<A, R>,
}

impl<A, R> Tap<A, R> {
    /// Creates a synchronous tap.
    pub fn sync<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(A) -> Result<R, TapError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: TapFn::Sync(Arc::new(f)),
        }
    }

    /// Creates a continuation-style asynchronous tap.
    pub fn callback<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(A, Callback<R>) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: TapFn::Async(Arc::new(f)),
        }
    }

    /// Creates a future-style asynchronous tap.
    pub fn promise<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(A) -> BoxFuture<'static, Result<R, TapError>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: TapFn::Promise(Arc::new(f)),
        }
    }

    /// Returns the invocation kind of this tap.
    #[must_use]
    pub fn kind(&self) -> InvocationKind {
        self.func.kind()
    }
}

impl<A, R> Clone for Tap<A, R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            func: self.func.clone(),
        }
    }
}

impl<A, R> fmt::Debug for Tap<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tap")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}
