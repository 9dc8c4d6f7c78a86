//! The flat key/value metadata container.
//!
//! Metadata is never stored as a map. It is a flat sequence of alternating
//! keys and values so that insertion order and duplicate keys both survive
//! until a consumer decides what to do with them. A key without a value is
//! paired with [`MISSING_VALUE`].
//!
//! # Examples
//!
//! ```
//! use causemeta::{Metadata, Value, metadata};
//!
//! let base = metadata!["function", "load_config"];
//! let extended = base.extend(metadata!["attempt"]);
//!
//! assert_eq!(
//!     extended.as_slice(),
//!     &[
//!         Value::from("function"),
//!         Value::from("load_config"),
//!         Value::from("attempt"),
//!         Value::from("<missing>"),
//!     ]
//! );
//! // The receiver is untouched.
//! assert_eq!(base.len(), 2);
//! ```

use alloc::{
    collections::BTreeMap,
    vec::{self, Vec},
};
use core::{
    fmt,
    hash::{BuildHasher, Hash},
};
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{BoxError, MetadataError, value::Value};

/// The value paired with a key that was attached without one.
pub const MISSING_VALUE: &str = "<missing>";

/// A single argument to an attachment call.
///
/// Each argument is resolved once into one of three shapes. Sequences are
/// spliced into the metadata in order; maps are spliced as alternating
/// key/value elements in the map's own iteration order, which for hash maps
/// is unspecified.
#[derive(Clone, Debug, PartialEq)]
pub enum MetadataArg {
    /// A single element.
    Scalar(Value),
    /// Elements spliced in place, in order.
    Seq(Vec<Value>),
    /// Key/value pairs spliced in place as alternating elements.
    Map(Vec<(Value, Value)>),
}

impl MetadataArg {
    fn flatten_into(self, out: &mut Vec<Value>) {
        match self {
            MetadataArg::Scalar(value) => out.push(value),
            MetadataArg::Seq(values) => out.extend(values),
            MetadataArg::Map(pairs) => {
                out.reserve(pairs.len() * 2);
                for (key, value) in pairs {
                    out.push(key);
                    out.push(value);
                }
            }
        }
    }
}

macro_rules! impl_scalar_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for MetadataArg {
                #[inline]
                fn from(value: $ty) -> Self {
                    MetadataArg::Scalar(Value::from(value))
                }
            }
        )*
    };
}

impl_scalar_arg!(
    bool, char, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, &str, &String,
    alloc::string::String, alloc::borrow::Cow<'_, str>, ()
);

impl From<Value> for MetadataArg {
    fn from(value: Value) -> Self {
        MetadataArg::Scalar(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for MetadataArg {
    fn from(value: Option<T>) -> Self {
        MetadataArg::Scalar(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for MetadataArg {
    fn from(values: Vec<T>) -> Self {
        MetadataArg::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for MetadataArg {
    fn from(values: &[T]) -> Self {
        MetadataArg::Seq(values.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for MetadataArg {
    fn from(values: [T; N]) -> Self {
        MetadataArg::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for MetadataArg
where
    K: Into<Value> + Eq + Hash,
    V: Into<Value>,
    S: BuildHasher,
{
    fn from(map: HashMap<K, V, S>) -> Self {
        MetadataArg::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V> From<BTreeMap<K, V>> for MetadataArg
where
    K: Into<Value> + Ord,
    V: Into<Value>,
{
    fn from(map: BTreeMap<K, V>) -> Self {
        MetadataArg::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V, S> From<IndexMap<K, V, S>> for MetadataArg
where
    K: Into<Value> + Eq + Hash,
    V: Into<Value>,
    S: BuildHasher,
{
    fn from(map: IndexMap<K, V, S>) -> Self {
        MetadataArg::Map(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<Metadata> for MetadataArg {
    fn from(metadata: Metadata) -> Self {
        MetadataArg::Seq(metadata.entries)
    }
}

/// An immutable, flat sequence of alternating metadata keys and values.
///
/// A `Metadata` always has an even number of elements: construction pads a
/// trailing key with [`MISSING_VALUE`]. [`extend`](Metadata::extend) never
/// mutates its receiver, which makes a `Metadata` usable as a reusable
/// context shared by several attachment sites.
#[derive(Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<Value>,
}

impl Metadata {
    /// Creates an empty container.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Normalizes attachment arguments into a container.
    ///
    /// Usually called through the [`metadata!`](crate::metadata) macro.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = MetadataArg>,
    {
        let mut entries = Vec::new();
        for arg in args {
            arg.flatten_into(&mut entries);
        }
        Self::from_values(entries)
    }

    /// Builds a container from an already flat sequence.
    pub fn from_values(mut entries: Vec<Value>) -> Self {
        pad_missing_value(&mut entries);
        Self { entries }
    }

    /// Returns a new container holding this container's pairs followed by
    /// `other`'s pairs.
    ///
    /// Each side is padded on its own before concatenation, so a dangling key
    /// on the left never swallows the first key on the right.
    #[must_use]
    pub fn extend(&self, other: impl Into<Metadata>) -> Metadata {
        let other = other.into();
        let mut entries = Vec::with_capacity(self.entries.len() + other.entries.len() + 1);
        entries.extend_from_slice(&self.entries);
        pad_missing_value(&mut entries);
        entries.extend(other.entries);
        Self::from_values(entries)
    }

    /// Attaches this container's pairs to `err`.
    pub fn wrap(&self, err: impl Into<BoxError>) -> MetadataError {
        MetadataError::new(err, self.clone())
    }

    /// Attaches this container's pairs, followed by `extra`, to `err`.
    pub fn wrap_with(&self, err: impl Into<BoxError>, extra: impl Into<Metadata>) -> MetadataError {
        MetadataError::new(err, self.extend(extra))
    }

    /// The flat element sequence.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        &self.entries
    }

    /// Number of elements, which is twice the number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order, duplicates
    /// included.
    pub fn pairs(&self) -> impl Iterator<Item = (&Value, &Value)> + '_ {
        self.entries.chunks_exact(2).map(|pair| (&pair[0], &pair[1]))
    }

    /// Consumes the container and returns the flat sequence.
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.entries
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.pairs()).finish()
    }
}

impl From<Vec<MetadataArg>> for Metadata {
    fn from(args: Vec<MetadataArg>) -> Self {
        Self::from_args(args)
    }
}

impl<const N: usize> From<[MetadataArg; N]> for Metadata {
    fn from(args: [MetadataArg; N]) -> Self {
        Self::from_args(args)
    }
}

impl From<&Metadata> for Metadata {
    fn from(metadata: &Metadata) -> Self {
        metadata.clone()
    }
}

impl IntoIterator for Metadata {
    type Item = Value;
    type IntoIter = vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

pub(crate) fn pad_missing_value(entries: &mut Vec<Value>) {
    if entries.len() % 2 != 0 {
        entries.push(Value::from(MISSING_VALUE));
    }
}
