//! The error wrapper that carries metadata.

use core::{error::Error, fmt};

use crate::{BoxError, metadata::Metadata, status::RpcStatus};

/// An error paired with key/value metadata.
///
/// Wrapping is invisible to plain message rendering: [`Display`] delegates to
/// the wrapped error, and [`Error::source`] returns it. The metadata is only
/// observable through [`get_metadata`](crate::get_metadata),
/// [`to_status`](crate::to_status) or [`MetadataError::metadata`].
///
/// A `MetadataError` is never mutated after construction. Attaching more
/// metadata wraps it again.
///
/// [`Display`]: fmt::Display
///
/// # Examples
///
/// ```
/// use causemeta::{MetadataError, get_metadata, metadata};
///
/// let io = std::io::Error::other("disk full");
/// let err = MetadataError::new(io, metadata!["path", "/var/data"]);
///
/// assert_eq!(err.to_string(), "disk full");
/// assert_eq!(get_metadata(&err).len(), 2);
/// ```
#[derive(Debug)]
pub struct MetadataError {
    source: BoxError,
    metadata: Metadata,
}

impl MetadataError {
    /// Wraps `err` with the given metadata.
    pub fn new(err: impl Into<BoxError>, metadata: impl Into<Metadata>) -> Self {
        Self {
            source: err.into(),
            metadata: metadata.into(),
        }
    }

    /// The metadata attached at this level only.
    ///
    /// Use [`get_metadata`](crate::get_metadata) to collect the metadata of
    /// the whole chain.
    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The wrapped error.
    #[must_use]
    pub fn inner(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.source
    }

    /// Unwraps into the wrapped error, discarding this level's metadata.
    #[must_use]
    pub fn into_source(self) -> BoxError {
        self.source
    }

    /// Converts the whole chain into a protocol status.
    ///
    /// Shorthand for [`to_status`](crate::to_status).
    #[must_use]
    pub fn to_status(&self) -> RpcStatus {
        crate::status::to_status(self)
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.source, f)
    }
}

impl Error for MetadataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}

/// Attaches metadata to an optional error.
///
/// Attachment never creates an error out of nothing: `None` yields `None`.
///
/// # Examples
///
/// ```
/// use causemeta::{attach, metadata};
///
/// let none: Option<std::io::Error> = None;
/// assert!(attach(none, metadata!["k", "v"]).is_none());
///
/// let some = Some(std::io::Error::other("boom"));
/// let err = attach(some, metadata!["k1"]).unwrap();
/// assert_eq!(err.metadata().len(), 2);
/// ```
pub fn attach<E>(err: Option<E>, metadata: impl Into<Metadata>) -> Option<MetadataError>
where
    E: Into<BoxError>,
{
    err.map(|err| MetadataError::new(err, metadata))
}
