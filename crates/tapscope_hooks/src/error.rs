//! Error types for hook firing.

use core::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::tap::InvocationKind;

// ─────────────────────────────────────────────────────────────────────────────
// TapError
// ─────────────────────────────────────────────────────────────────────────────

/// An error produced by a tap's own logic.
///
/// The underlying error is reference-counted so that the exact value a tap
/// failed with can travel through wrappers and be compared by identity with
/// [`TapError::ptr_eq`].
#[derive(Clone)]
pub struct TapError(Arc<dyn core::error::Error + Send + Sync>);

impl TapError {
    /// Wraps any error type.
    pub fn new(error: impl core::error::Error + Send + Sync + 'static) -> Self {
        Self(Arc::new(error))
    }

    /// Creates an error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(Arc::new(MessageError(message.into())))
    }

    /// Returns `true` if both errors share the same underlying allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &TapError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the wrapped error.
    #[must_use]
    pub fn inner(&self) -> &(dyn core::error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Debug for TapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TapError").field(&self.0).finish()
    }
}

impl fmt::Display for TapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl core::error::Error for TapError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::error::Error for MessageError {}

// ─────────────────────────────────────────────────────────────────────────────
// HookError
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while firing a hook.
#[derive(Debug, Clone, Error)]
pub enum HookError {
    /// A tap failed. The tap's error is carried unchanged.
    #[error("tap '{tap}' on hook '{hook}' failed: {source}")]
    Tap {
        /// The hook being fired.
        hook: String,
        /// The failing tap.
        tap: String,
        /// The error produced by the tap.
        source: TapError,
    },

    /// A tap's invocation kind cannot be driven by the firing method used.
    #[error("hook '{hook}' cannot call {kind} tap '{tap}' synchronously")]
    UnsupportedTap {
        /// The hook being fired.
        hook: String,
        /// The offending tap.
        tap: String,
        /// The tap's declared invocation kind.
        kind: InvocationKind,
    },

    /// A callback tap dropped its continuation without calling it.
    #[error("tap '{tap}' on hook '{hook}' dropped its callback without completing")]
    CallbackDropped {
        /// The hook being fired.
        hook: String,
        /// The tap that never completed.
        tap: String,
    },
}

impl HookError {
    /// Returns the tap error if this is a [`HookError::Tap`].
    #[must_use]
    pub fn tap_error(&self) -> Option<&TapError> {
        match self {
            HookError::Tap { source, .. } => Some(source),
            _ => None,
        }
    }
}
