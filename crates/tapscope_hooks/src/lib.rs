//! Named extension points for Tapscope pipelines.
//!
//! A [`Hook`] holds an ordered list of [`Tap`]s and fires them in
//! registration order. Every tap declares how it signals completion:
//!
//! - **Sync**: returns its result directly
//! - **Async**: hands its result to a trailing continuation ([`Callback`])
//! - **Promise**: returns a future that resolves to its result
//!
//! Hooks can be observed without touching the taps themselves by attaching
//! an [`Intercept`] implementation. Interceptors rewrite taps as they are
//! registered and are notified once per firing, before any tap runs.
//!
//! # Example
//!
//! ```
//! use tapscope_hooks::Hook;
//!
//! let hook: Hook<u32, u32> = Hook::new("double");
//! hook.tap("Doubler", |n| Ok(n * 2));
//!
//! assert_eq!(hook.call(21).unwrap(), vec![42]);
//! ```
//!
//! # Keyed hooks
//!
//! [`HookMap`] lazily creates one hook per discriminant (e.g. a module type),
//! so plugins can tap a single variant:
//!
//! ```
//! use tapscope_hooks::HookMap;
//!
//! let parsers: HookMap<String, ()> = HookMap::new("parser");
//! parsers.for_key("json").tap("JsonPlugin", |_source| Ok(()));
//! assert_eq!(parsers.for_key("json").tap_count(), 1);
//! ```

mod error;
mod hook;
mod hook_map;
mod intercept;
mod tap;

pub use error::{HookError, TapError};
pub use hook::{Hook, HookId};
pub use hook_map::{HookMap, HookMapId};
pub use intercept::Intercept;
pub use tap::{AsyncFn, Callback, InvocationKind, PromiseFn, SyncFn, Tap, TapFn};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::{
        Callback, Hook, HookError, HookId, HookMap, Intercept, InvocationKind, Tap, TapError,
        TapFn,
    };
}
