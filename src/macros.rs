/// Builds a [`Metadata`] container from a list of attachment arguments.
///
/// Every argument is converted with [`MetadataArg::from`], so scalars,
/// sequences and maps can be mixed freely. Sequences and maps are spliced into
/// the flat key/value list; a trailing key without a value is paired with
/// `"<missing>"`.
///
/// [`Metadata`]: crate::Metadata
/// [`MetadataArg::from`]: crate::MetadataArg
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use causemeta::{Value, metadata};
///
/// let md = metadata!["user_id", 42, "region", "eu-west-1"];
/// assert_eq!(md.len(), 4);
///
/// let mut labels = BTreeMap::new();
/// labels.insert("tier", "gold");
/// let md = metadata!["request", "r-1", labels, "dangling"];
/// assert_eq!(
///     md.as_slice(),
///     &[
///         Value::from("request"),
///         Value::from("r-1"),
///         Value::from("tier"),
///         Value::from("gold"),
///         Value::from("dangling"),
///         Value::from("<missing>"),
///     ]
/// );
///
/// assert!(metadata![].is_empty());
/// ```
#[macro_export]
macro_rules! metadata {
    () => {
        $crate::Metadata::new()
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::Metadata::from_args([$($crate::MetadataArg::from($arg)),+])
    };
}
