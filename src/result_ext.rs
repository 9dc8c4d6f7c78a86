use crate::{
    BoxError, MetadataError,
    markers::{Classified, NonRetryable, Retryable, as_non_retryable, as_retryable},
    metadata::Metadata,
};

mod sealed {
    pub trait Sealed {}
    impl<A, E> Sealed for Result<A, E> {}
}

/// Extension methods for attaching metadata and classifications to the error
/// of a `Result`.
///
/// `Ok` values pass through untouched, so attaching to a successful result
/// never creates an error.
///
/// # Examples
///
/// ```
/// use causemeta::{get_metadata, metadata, prelude::*};
///
/// fn read(path: &str) -> Result<String, MetadataError> {
///     std::fs::read_to_string(path).with_metadata(metadata!["path", path])
/// }
///
/// let err = read("/definitely/not/here").unwrap_err();
/// assert_eq!(get_metadata(&err).len(), 2);
/// ```
pub trait ResultExt<V, E>: sealed::Sealed {
    /// Wraps the error with `metadata`.
    fn with_metadata(self, metadata: impl Into<Metadata>) -> Result<V, MetadataError>
    where
        E: Into<BoxError>;

    /// Wraps the error with metadata built only if there is an error.
    fn with_metadata_lazy<F>(self, metadata: F) -> Result<V, MetadataError>
    where
        E: Into<BoxError>,
        F: FnOnce() -> Metadata;

    /// Attaches `metadata` and marks the error as retryable.
    fn retryable(self, metadata: impl Into<Metadata>) -> Result<V, Classified<Retryable>>
    where
        E: Into<BoxError>;

    /// Attaches `metadata` and marks the error as non-retryable.
    fn non_retryable(self, metadata: impl Into<Metadata>) -> Result<V, Classified<NonRetryable>>
    where
        E: Into<BoxError>;
}

impl<V, E> ResultExt<V, E> for Result<V, E> {
    #[inline]
    fn with_metadata(self, metadata: impl Into<Metadata>) -> Result<V, MetadataError>
    where
        E: Into<BoxError>,
    {
        self.map_err(|err| MetadataError::new(err, metadata))
    }

    #[inline]
    fn with_metadata_lazy<F>(self, metadata: F) -> Result<V, MetadataError>
    where
        E: Into<BoxError>,
        F: FnOnce() -> Metadata,
    {
        self.map_err(|err| MetadataError::new(err, metadata()))
    }

    #[inline]
    fn retryable(self, metadata: impl Into<Metadata>) -> Result<V, Classified<Retryable>>
    where
        E: Into<BoxError>,
    {
        self.map_err(|err| as_retryable(err, metadata))
    }

    #[inline]
    fn non_retryable(self, metadata: impl Into<Metadata>) -> Result<V, Classified<NonRetryable>>
    where
        E: Into<BoxError>,
    {
        self.map_err(|err| as_non_retryable(err, metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{get_metadata, markers::is_retryable, metadata};

    #[derive(Debug, thiserror::Error)]
    #[error("failed")]
    struct Failed;

    #[test]
    fn test_ok_passes_through() {
        let ok: Result<u8, Failed> = Ok(1);
        assert_eq!(ok.with_metadata(metadata!["k", "v"]).unwrap(), 1);

        let ok: Result<u8, Failed> = Ok(2);
        let value = ok
            .with_metadata_lazy(|| unreachable!("metadata built for Ok"))
            .unwrap();
        assert_eq!(value, 2);
    }

    #[test]
    fn test_err_is_wrapped() {
        let err: Result<(), Failed> = Err(Failed);
        let err = err.with_metadata(metadata!["k", "v"]).unwrap_err();
        assert_eq!(err.to_string(), "failed");
        assert_eq!(get_metadata(&err).len(), 2);
    }

    #[test]
    fn test_retryable() {
        let err: Result<(), Failed> = Err(Failed);
        let err = err.retryable(metadata!["attempt", 2]).unwrap_err();
        assert!(is_retryable(&err));
    }
}
