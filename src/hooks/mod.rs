//! Global hooks for teaching chain traversal about more status types.
//!
//! # Quick Start
//!
//! ```rust
//! use causemeta::{
//!     MetadataError, hooks::Hooks, metadata, status::{RpcStatus, StatusSource},
//!     to_status,
//! };
//! use tonic::Code;
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("quota exceeded")]
//! struct QuotaExceeded;
//!
//! impl StatusSource for QuotaExceeded {
//!     fn rpc_status(&self) -> RpcStatus {
//!         RpcStatus::new(Code::ResourceExhausted, "quota exceeded")
//!     }
//! }
//!
//! Hooks::new()
//!     .status_source::<QuotaExceeded>()
//!     .install()
//!     .expect("failed to install hooks");
//!
//! let err = MetadataError::new(QuotaExceeded, metadata!["tenant", "acme"]);
//! assert_eq!(to_status(&err).code(), Code::ResourceExhausted);
//! ```
//!
//! # When to Use Hooks
//!
//! [`tonic::Status`] and [`RpcStatus`] are recognized out of the box. Register
//! a status source when your own error types carry a status code that should
//! survive [`to_status`](crate::to_status), or when a foreign error type can
//! be mapped to one with a function
//! ([`Hooks::status_source_fn`]).
//!
//! Hooks are consulted while a read lock is held. A status source must not
//! install or replace hooks itself.

use alloc::{boxed::Box, vec::Vec};
use core::{error::Error, fmt, marker::PhantomData};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::status::{RpcStatus, StatusSource};

/// Builder for configuring and installing hooks globally.
///
/// # Examples
///
/// Mapping a foreign error type:
/// ```rust
/// use causemeta::{hooks::Hooks, status::RpcStatus};
/// use tonic::Code;
///
/// let previous = Hooks::new()
///     .status_source_fn(|err: &std::io::Error| {
///         let code = match err.kind() {
///             std::io::ErrorKind::NotFound => Code::NotFound,
///             std::io::ErrorKind::PermissionDenied => Code::PermissionDenied,
///             _ => Code::Internal,
///         };
///         RpcStatus::new(code, err.to_string())
///     })
///     .replace();
/// ```
pub struct Hooks(HookData);

impl Default for Hooks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field(
                "status_sources",
                &self
                    .0
                    .status_sources
                    .iter()
                    .map(|source| source.type_name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

struct HookData {
    status_sources: Vec<Box<dyn StoredStatusSource>>,
}

/// Error returned by [`Hooks::install`] when hooks are already installed.
///
/// Holds the rejected hooks so they can be inspected or passed to
/// [`Hooks::replace`].
pub struct HooksAlreadyInstalledError(pub Hooks);

impl fmt::Debug for HooksAlreadyInstalledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HooksAlreadyInstalledError").finish()
    }
}

impl fmt::Display for HooksAlreadyInstalledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hooks are already installed globally")
    }
}

impl Error for HooksAlreadyInstalledError {}

impl Hooks {
    /// Creates an empty set of hooks.
    #[must_use]
    pub fn new() -> Self {
        Self(HookData {
            status_sources: Vec::new(),
        })
    }

    /// Recognizes `E` as status-bearing through its [`StatusSource`] impl.
    #[must_use]
    pub fn status_source<E>(self) -> Self
    where
        E: Error + StatusSource + 'static,
    {
        self.status_source_fn(|err: &E| err.rpc_status())
    }

    /// Recognizes `E` as status-bearing through a mapping function.
    #[must_use]
    pub fn status_source_fn<E, F>(mut self, f: F) -> Self
    where
        E: Error + 'static,
        F: Fn(&E) -> RpcStatus + Send + Sync + 'static,
    {
        self.0.status_sources.push(Box::new(TypedStatusSource {
            f,
            _error: PhantomData,
        }));
        self
    }

    /// Installs these hooks globally.
    ///
    /// Fails if hooks were already installed; use [`Hooks::replace`] to
    /// overwrite them.
    pub fn install(self) -> Result<(), HooksAlreadyInstalledError> {
        let mut slot = write_hooks();
        if slot.is_some() {
            return Err(HooksAlreadyInstalledError(self));
        }
        *slot = Some(self.0);
        Ok(())
    }

    /// Installs these hooks globally, returning the previously installed
    /// ones.
    pub fn replace(self) -> Option<Hooks> {
        write_hooks().replace(self.0).map(Hooks)
    }

    /// Removes the globally installed hooks, if any.
    pub fn uninstall() -> Option<Hooks> {
        write_hooks().take().map(Hooks)
    }
}

trait StoredStatusSource: Send + Sync + 'static {
    fn probe(&self, err: &(dyn Error + 'static)) -> Option<RpcStatus>;

    fn type_name(&self) -> &'static str;
}

struct TypedStatusSource<E, F> {
    f: F,
    _error: PhantomData<fn(&E)>,
}

impl<E, F> StoredStatusSource for TypedStatusSource<E, F>
where
    E: Error + 'static,
    F: Fn(&E) -> RpcStatus + Send + Sync + 'static,
{
    fn probe(&self, err: &(dyn Error + 'static)) -> Option<RpcStatus> {
        err.downcast_ref::<E>().map(&self.f)
    }

    fn type_name(&self) -> &'static str {
        core::any::type_name::<E>()
    }
}

static HOOKS: RwLock<Option<HookData>> = RwLock::new(None);

// Every write replaces the slot as a whole, so a poisoned lock still holds a
// consistent value.
fn read_hooks() -> RwLockReadGuard<'static, Option<HookData>> {
    HOOKS.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_hooks() -> RwLockWriteGuard<'static, Option<HookData>> {
    HOOKS.write().unwrap_or_else(PoisonError::into_inner)
}

/// Asks the installed status sources for a status view of `err`.
pub(crate) fn probe_status_sources(err: &(dyn Error + 'static)) -> Option<RpcStatus> {
    let guard = read_hooks();
    guard
        .as_ref()?
        .status_sources
        .iter()
        .find_map(|source| source.probe(err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hooks_send_sync() {
        static_assertions::assert_impl_all!(Hooks: Send, Sync);
    }

    #[test]
    fn test_debug_lists_types() {
        #[derive(Debug, thiserror::Error)]
        #[error("custom")]
        struct Custom;

        let hooks = Hooks::new().status_source_fn(|_: &Custom| RpcStatus::ok());
        let rendered = alloc::format!("{hooks:?}");
        assert!(rendered.contains("Custom"));
    }

    #[test]
    fn test_registry_survives_poisoning() {
        let poisoner = std::thread::spawn(|| {
            let _slot = write_hooks();
            panic!("status source registration failed");
        });
        assert!(poisoner.join().is_err());
        assert!(HOOKS.is_poisoned());

        #[derive(Debug, thiserror::Error)]
        #[error("poisoned")]
        struct Poisoned;

        assert!(probe_status_sources(&Poisoned).is_none());

        Hooks::new()
            .status_source_fn(|_: &Poisoned| RpcStatus::new(tonic::Code::Aborted, "poisoned"))
            .replace();
        let status = probe_status_sources(&Poisoned).unwrap();
        assert_eq!(status.code(), tonic::Code::Aborted);
        assert!(Hooks::uninstall().is_some());
    }
}
