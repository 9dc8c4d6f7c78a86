//! Retry classification markers.
//!
//! A failure is classified by wrapping it in a [`Classified<K>`], where `K` is
//! a zero-sized kind marker such as [`Retryable`] or [`NonRetryable`]. The
//! classification can be queried from anywhere above the marker, no matter
//! how many plain wrapping layers have been added since.
//!
//! This module only records the classification. Deciding whether and how to
//! retry is left to the caller.
//!
//! # Examples
//!
//! ```
//! use causemeta::{
//!     MetadataError, get_metadata, metadata,
//!     markers::{as_retryable, is_non_retryable, is_retryable},
//! };
//!
//! let err = as_retryable(std::io::Error::other("timed out"), metadata!["attempt", 1]);
//! let err = MetadataError::new(err, metadata!["service", "billing"]);
//!
//! assert!(is_retryable(&err));
//! assert!(!is_non_retryable(&err));
//! assert_eq!(get_metadata(&err).len(), 4);
//! ```
//!
//! # Adding a kind
//!
//! New kinds only need a marker type; the chain search is shared.
//!
//! ```
//! use causemeta::markers::{ClassKind, Classified, is_classified};
//!
//! #[derive(Debug)]
//! struct Throttled;
//!
//! impl ClassKind for Throttled {
//!     const NAME: &'static str = "throttled";
//! }
//!
//! let err = Classified::<Throttled>::new("slow down");
//! assert!(is_classified::<Throttled>(&err));
//! ```

use core::{error::Error, fmt, marker::PhantomData};

use crate::{BoxError, MetadataError, chain::Chain, metadata::Metadata};

/// A classification kind.
pub trait ClassKind: Send + Sync + 'static {
    /// A short, human-readable name for the kind.
    const NAME: &'static str;
}

/// Marks a failure as safe to retry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Retryable;

impl ClassKind for Retryable {
    const NAME: &'static str = "retryable";
}

/// Marks a failure as not worth retrying.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NonRetryable;

impl ClassKind for NonRetryable {
    const NAME: &'static str = "non-retryable";
}

/// A failure tagged with the classification `K`.
///
/// The marker carries no metadata of its own and is transparent to message
/// rendering.
pub struct Classified<K: ClassKind> {
    source: BoxError,
    _kind: PhantomData<fn() -> K>,
}

impl<K: ClassKind> Classified<K> {
    /// Tags `err` with the kind `K`.
    pub fn new(err: impl Into<BoxError>) -> Self {
        Self {
            source: err.into(),
            _kind: PhantomData,
        }
    }

    /// Unwraps into the tagged error.
    #[must_use]
    pub fn into_source(self) -> BoxError {
        self.source
    }
}

impl<K: ClassKind> fmt::Debug for Classified<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classified")
            .field("kind", &K::NAME)
            .field("source", &self.source)
            .finish()
    }
}

impl<K: ClassKind> fmt::Display for Classified<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl<K: ClassKind> Error for Classified<K> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

/// Attaches `metadata` to `err` and marks the result as [`Retryable`].
pub fn as_retryable(err: impl Into<BoxError>, metadata: impl Into<Metadata>) -> Classified<Retryable> {
    Classified::new(MetadataError::new(err, metadata))
}

/// Attaches `metadata` to `err` and marks the result as [`NonRetryable`].
pub fn as_non_retryable(
    err: impl Into<BoxError>,
    metadata: impl Into<Metadata>,
) -> Classified<NonRetryable> {
    Classified::new(MetadataError::new(err, metadata))
}

/// Returns `true` if a [`Classified<K>`] marker appears anywhere in the
/// chain of `err`.
#[must_use]
pub fn is_classified<K: ClassKind>(err: &(dyn Error + 'static)) -> bool {
    Chain::new(err).any(|node| node.is::<Classified<K>>())
}

/// Returns `true` if the chain of `err` contains a [`Retryable`] marker.
#[must_use]
pub fn is_retryable(err: &(dyn Error + 'static)) -> bool {
    is_classified::<Retryable>(err)
}

/// Returns `true` if the chain of `err` contains a [`NonRetryable`] marker.
#[must_use]
pub fn is_non_retryable(err: &(dyn Error + 'static)) -> bool {
    is_classified::<NonRetryable>(err)
}
