//! Walking error chains and collecting their metadata.

use alloc::vec::Vec;
use core::{error::Error, iter::FusedIterator};

use crate::{MetadataError, status, value::Value};

/// The maximum number of chain nodes visited by any traversal.
///
/// Chains are acyclic by construction; this only bounds the damage of an
/// error type whose `source()` points back into its own chain.
pub const MAX_CHAIN_DEPTH: usize = 1024;

/// An iterator over an error and its transitive sources, outermost first.
///
/// # Examples
///
/// ```
/// use causemeta::{Chain, MetadataError, metadata};
///
/// let err = MetadataError::new(std::io::Error::other("inner"), metadata!["k", "v"]);
/// let nodes: Vec<_> = Chain::new(&err).collect();
///
/// assert_eq!(nodes.len(), 2);
/// assert!(nodes[0].is::<MetadataError>());
/// assert!(nodes[1].is::<std::io::Error>());
/// ```
#[derive(Clone)]
#[must_use]
pub struct Chain<'a> {
    next: Option<&'a (dyn Error + 'static)>,
    remaining: usize,
}

impl<'a> Chain<'a> {
    /// Starts a walk at `err`.
    pub fn new(err: &'a (dyn Error + 'static)) -> Self {
        Self {
            next: Some(err),
            remaining: MAX_CHAIN_DEPTH,
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            next: None,
            remaining: 0,
        }
    }
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let cur = self.next.take()?;
        self.remaining -= 1;
        self.next = cur.source();
        Some(cur)
    }
}

impl FusedIterator for Chain<'_> {}

/// Collects the metadata of every level of an error chain.
///
/// The result is a flat, even-length sequence of alternating keys and values,
/// ordered innermost first: metadata attached closest to the root cause comes
/// first, and metadata attached by outer wrappers comes last. A consumer that
/// collapses the sequence into a map with "last value wins" therefore sees
/// the most specific value for each key. Duplicate keys are kept.
///
/// Besides [`MetadataError`] levels, any status-bearing level (a
/// [`tonic::Status`], an [`RpcStatus`](crate::status::RpcStatus) or a type
/// registered through [`hooks`](crate::hooks)) contributes the entries of its
/// metadata detail payload.
///
/// # Examples
///
/// ```
/// use causemeta::{MetadataError, Value, get_metadata, metadata};
///
/// let root = std::io::Error::other("root");
/// let inner = MetadataError::new(root, metadata!["k1", "v1"]);
/// let outer = MetadataError::new(inner, metadata!["k2", "v2"]);
///
/// assert_eq!(
///     get_metadata(&outer),
///     vec![
///         Value::from("k1"),
///         Value::from("v1"),
///         Value::from("k2"),
///         Value::from("v2"),
///     ]
/// );
/// ```
#[must_use]
pub fn get_metadata(err: &(dyn Error + 'static)) -> Vec<Value> {
    collect(Chain::new(err))
}

/// Like [`get_metadata`], but accepts the absence of an error, which yields an
/// empty sequence.
#[must_use]
pub fn get_metadata_opt(err: Option<&(dyn Error + 'static)>) -> Vec<Value> {
    collect(err.map_or_else(Chain::empty, Chain::new))
}

fn collect(chain: Chain<'_>) -> Vec<Value> {
    let nodes: Vec<_> = chain.collect();
    let mut metadata = Vec::new();

    for node in nodes.into_iter().rev() {
        if let Some(wrapper) = node.downcast_ref::<MetadataError>() {
            metadata.extend_from_slice(wrapper.metadata().as_slice());
        } else if let Some(status) = status::probe(node) {
            if let Some(fields) = status.metadata() {
                for (key, value) in fields {
                    metadata.push(Value::String(key));
                    metadata.push(value);
                }
            }
        }
    }

    metadata
}

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, vec};

    use super::*;
    use crate::{BoxError, metadata};

    #[derive(Debug, thiserror::Error)]
    #[error("root")]
    struct Root;

    #[derive(Debug, thiserror::Error)]
    #[error("{message}: {source}")]
    struct Wrapped {
        message: &'static str,
        #[source]
        source: BoxError,
    }

    fn wrapped(message: &'static str, source: impl Into<BoxError>) -> Wrapped {
        Wrapped {
            message,
            source: source.into(),
        }
    }

    #[derive(Debug)]
    struct Loop;

    impl core::fmt::Display for Loop {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            f.write_str("loop")
        }
    }

    impl Error for Loop {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            static LOOP: Loop = Loop;
            Some(&LOOP)
        }
    }

    fn strings(values: &[&str]) -> Vec<Value> {
        values.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn test_chain_order() {
        let err = wrapped("outer", MetadataError::new(Root, metadata!["k", "v"]));
        let names: Vec<_> = Chain::new(&err).map(|e| e.to_string()).collect();
        assert_eq!(names, vec!["outer: root", "root", "root"]);
    }

    #[test]
    fn test_chain_depth_is_bounded() {
        assert_eq!(Chain::new(&Loop).count(), MAX_CHAIN_DEPTH);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(get_metadata_opt(None).is_empty());
        assert!(get_metadata(&Root).is_empty());
        assert!(get_metadata(&wrapped("foo", wrapped("bar", Root))).is_empty());
        assert!(get_metadata(&MetadataError::new(Root, metadata![])).is_empty());
    }

    #[test]
    fn test_metadata_in_the_middle_of_the_chain() {
        let err = wrapped(
            "foo",
            MetadataError::new(wrapped("bar", Root), metadata!["k1", "v1"]),
        );
        assert_eq!(get_metadata(&err), strings(&["k1", "v1"]));
    }

    #[test]
    fn test_metadata_at_both_ends_of_the_chain() {
        let err = MetadataError::new(
            wrapped("foo", MetadataError::new(Root, metadata!["k1", "v1"])),
            metadata!["k2", "v2"],
        );
        assert_eq!(get_metadata(&err), strings(&["k1", "v1", "k2", "v2"]));
    }

    #[test]
    fn test_reused_keys_are_kept() {
        let err = MetadataError::new(
            MetadataError::new(Root, metadata!["reused_key", "inner_value"]),
            metadata!["reused_key", "outer_value"],
        );
        assert_eq!(
            get_metadata(&err),
            strings(&["reused_key", "inner_value", "reused_key", "outer_value"])
        );
    }

    #[test]
    fn test_boxed_wrapper_is_found() {
        let boxed: BoxError = Box::new(MetadataError::new(Root, metadata!["k", "v"]));
        let err = wrapped("outer", boxed);
        assert_eq!(get_metadata(&err), strings(&["k", "v"]));
    }
}
