//! The value type stored in error metadata.
//!
//! Metadata is a flat sequence of [`Value`]s, alternating between keys and
//! values. Keys are normally [`Value::String`], but nothing enforces that:
//! non-string keys survive attachment and chain traversal, and are only
//! dropped when the metadata is encoded into a status detail payload.
//!
//! # Examples
//!
//! ```
//! use causemeta::Value;
//!
//! assert_eq!(Value::from("id"), Value::String("id".to_string()));
//! assert_eq!(Value::from(42u32), Value::UInt(42));
//! assert_eq!(Value::from(None::<i64>), Value::Null);
//! assert_eq!(Value::from(1.5).to_string(), "1.5");
//! ```

use alloc::{borrow::Cow, string::String, sync::Arc, vec::Vec};
use core::fmt;

use indexmap::IndexMap;

/// A single metadata element.
///
/// The set of variants is closed. Everything except [`Value::Opaque`] can be
/// represented as a `google.protobuf.Value`.
#[derive(Clone, Debug)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// An ordered list of values.
    ///
    /// Unlike a sequence passed as an attachment argument, a list value is
    /// kept as a single element and never flattened.
    List(Vec<Value>),
    /// A string-keyed map of values.
    Map(IndexMap<String, Value>),
    /// A value that can be rendered for logging, but has no protocol
    /// representation.
    Opaque(Arc<dyn fmt::Debug + Send + Sync>),
}

impl Value {
    /// Wraps an arbitrary debuggable value.
    ///
    /// Opaque values show up in [`get_metadata`](crate::get_metadata) and in
    /// logs, but are dropped from status detail payloads.
    pub fn opaque<T>(value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        Value::Opaque(Arc::new(value))
    }

    /// Returns the string contents if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::UInt(a), Value::UInt(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // Opaque values have no equality of their own.
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => fmt::Display::fmt(b, f),
            Value::Int(i) => fmt::Display::fmt(i, f),
            Value::UInt(u) => fmt::Display::fmt(u, f),
            Value::Float(x) => fmt::Display::fmt(x, f),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Opaque(value) => fmt::Debug::fmt(value, f),
        }
    }
}

macro_rules! impl_from {
    ($variant:ident as $target:ty: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value as $target)
                }
            }
        )*
    };
}

impl_from!(Int as i64: i8, i16, i32, i64, isize);
impl_from!(UInt as u64: u8, u16, u32, u64, usize);
impl_from!(Float as f64: f32, f64);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::String(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.into())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(value: Cow<'_, str>) -> Self {
        Value::String(value.into_owned())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(value: IndexMap<String, Value>) -> Self {
        Value::Map(value)
    }
}
