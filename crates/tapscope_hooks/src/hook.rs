//! The [`Hook`] extension point.

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::channel::oneshot;
use futures::future::BoxFuture;
use parking_lot::RwLock;

use crate::error::{HookError, TapError};
use crate::intercept::Intercept;
use crate::tap::{Callback, Tap, TapFn};

static NEXT_HOOK_ID: AtomicUsize = AtomicUsize::new(0);

/// Process-unique identifier of a hook instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HookId(usize);

impl HookId {
    fn next() -> Self {
        Self(NEXT_HOOK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hook_{}", self.0)
    }
}

struct HookState<A, R> {
    taps: Vec<Tap<A, R>>,
    interceptors: Vec<Arc<dyn Intercept<A, R>>>,
}

/// A named extension point holding an ordered list of taps.
///
/// `A` is the argument each tap receives (cloned per tap) and `R` is the
/// value each tap produces.
///
/// # Thread Safety
///
/// Registration and firing go through a [`RwLock`]. Firing snapshots the
/// taps and interceptors first, so a tap may register further taps or
/// interceptors on the same hook while it runs; those take effect from the
/// next firing.
pub struct Hook<A, R> {
    id: HookId,
    name: String,
    state: RwLock<HookState<A, R>>,
}

impl<A, R> Hook<A, R>
where
    A: Clone + Send + 'static,
    R: Send + 'static,
{
    /// Creates a hook with no taps.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: HookId::next(),
            name: name.into(),
            state: RwLock::new(HookState {
                taps: Vec::new(),
                interceptors: Vec::new(),
            }),
        }
    }

    /// Returns this hook's unique ID.
    #[must_use]
    pub fn id(&self) -> HookId {
        self.id
    }

    /// Returns the hook's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of registered taps.
    #[must_use]
    pub fn tap_count(&self) -> usize {
        self.state.read().taps.len()
    }

    /// Returns the number of attached interceptors.
    #[must_use]
    pub fn interceptor_count(&self) -> usize {
        self.state.read().interceptors.len()
    }

    /// Returns the names of the registered taps in registration order.
    #[must_use]
    pub fn tap_names(&self) -> Vec<String> {
        self.state
            .read()
            .taps
            .iter()
            .map(|tap| tap.name.clone())
            .collect()
    }

    /// Registers a synchronous tap.
    pub fn tap<F>(&self, name: impl Into<String>, f: F) -> &Self
    where
        F: Fn(A) -> Result<R, TapError> + Send + Sync + 'static,
    {
        self.register(Tap::sync(name, f))
    }

    /// Registers a tap that completes by calling a continuation.
    pub fn tap_async<F>(&self, name: impl Into<String>, f: F) -> &Self
    where
        F: Fn(A, Callback<R>) + Send + Sync + 'static,
    {
        self.register(Tap::callback(name, f))
    }

    /// Registers a tap that completes by resolving a future.
    pub fn tap_promise<F>(&self, name: impl Into<String>, f: F) -> &Self
    where
        F: Fn(A) -> BoxFuture<'static, Result<R, TapError>> + Send + Sync + 'static,
    {
        self.register(Tap::promise(name, f))
    }

    /// Registers a pre-built [`Tap`].
    ///
    /// Every attached interceptor's [`register`](Intercept::register) is
    /// applied, in attachment order, before the tap is stored.
    ///
    /// Interceptors run without the hook's lock held. An interceptor
    /// attached by another thread while the tap is being rewritten is
    /// applied too, before the tap is stored.
    pub fn register(&self, mut tap: Tap<A, R>) -> &Self {
        let mut applied = 0;
        loop {
            let pending: Vec<_> = self.state.read().interceptors[applied..].to_vec();
            for interceptor in &pending {
                tap = interceptor.register(tap);
            }
            applied += pending.len();

            // Interceptors are append-only, so an unchanged length means
            // `tap` has been through every one of them.
            let mut state = self.state.write();
            if state.interceptors.len() == applied {
                state.taps.push(tap);
                return self;
            }
        }
    }

    /// Attaches an interceptor.
    ///
    /// Taps that are already registered are passed through the interceptor's
    /// [`register`](Intercept::register) immediately.
    pub fn intercept(&self, interceptor: impl Intercept<A, R> + 'static) -> &Self {
        let interceptor: Arc<dyn Intercept<A, R>> = Arc::new(interceptor);

        let mut state = self.state.write();
        let taps = core::mem::take(&mut state.taps);
        state.taps = taps
            .into_iter()
            .map(|tap| interceptor.register(tap))
            .collect();
        state.interceptors.push(interceptor);
        self
    }

    /// Fires every tap synchronously, in registration order.
    ///
    /// Returns the taps' results, or the first error. All taps must be
    /// [`Sync`](crate::InvocationKind::Sync); otherwise nothing runs and
    /// [`HookError::UnsupportedTap`] is returned.
    pub fn call(&self, args: A) -> Result<Vec<R>, HookError> {
        let (taps, interceptors) = self.snapshot();

        if let Some(tap) = taps.iter().find(|tap| !matches!(tap.func, TapFn::Sync(_))) {
            return Err(HookError::UnsupportedTap {
                hook: self.name.clone(),
                tap: tap.name.clone(),
                kind: tap.kind(),
            });
        }

        tracing::trace!(hook = %self.name, taps = taps.len(), "calling hook");

        for interceptor in &interceptors {
            interceptor.call(&args);
        }

        let mut results = Vec::with_capacity(taps.len());
        for tap in taps {
            if let TapFn::Sync(f) = &tap.func {
                let result = f(args.clone()).map_err(|source| HookError::Tap {
                    hook: self.name.clone(),
                    tap: tap.name.clone(),
                    source,
                })?;
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Fires every tap in series, awaiting asynchronous taps one at a time.
    ///
    /// Taps and interceptors are snapshotted when this method is called.
    /// Interceptors are notified when the returned future is first polled,
    /// so a future dropped unpolled is not a firing. The future then runs
    /// the taps and yields their results, or the first error.
    pub fn call_async(&self, args: A) -> BoxFuture<'static, Result<Vec<R>, HookError>> {
        let (taps, interceptors) = self.snapshot();
        let hook = self.name.clone();

        Box::pin(async move {
            tracing::trace!(hook = %hook, taps = taps.len(), "calling hook asynchronously");

            for interceptor in &interceptors {
                interceptor.call(&args);
            }

            let mut results = Vec::with_capacity(taps.len());
            for tap in taps {
                let result = match &tap.func {
                    TapFn::Sync(f) => f(args.clone()),
                    TapFn::Async(f) => {
                        let (tx, rx) = oneshot::channel();
                        f(
                            args.clone(),
                            Box::new(move |result| {
                                let _ = tx.send(result);
                            }),
                        );
                        match rx.await {
                            Ok(result) => result,
                            Err(_) => {
                                return Err(HookError::CallbackDropped {
                                    hook,
                                    tap: tap.name.clone(),
                                });
                            }
                        }
                    }
                    TapFn::Promise(f) => f(args.clone()).await,
                };

                match result {
                    Ok(value) => results.push(value),
                    Err(source) => {
                        return Err(HookError::Tap {
                            hook,
                            tap: tap.name.clone(),
                            source,
                        });
                    }
                }
            }
            Ok(results)
        })
    }

    fn snapshot(&self) -> (Vec<Tap<A, R>>, Vec<Arc<dyn Intercept<A, R>>>) {
        let state = self.state.read();
        (state.taps.clone(), state.interceptors.clone())
    }
}

impl<A, R> fmt::Debug for Hook<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Hook")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("taps", &state.taps)
            .field("interceptors", &state.interceptors.len())
            .finish()
    }
}
