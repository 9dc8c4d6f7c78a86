use alloc::string::{String, ToString};
use core::error::Error;

use indexmap::IndexMap;
use tonic::Code;

use super::{METADATA_MARKER, RpcStatus, codec, probe};
use crate::{MetadataError, chain::Chain, get_metadata, value::Value};

/// Converts an error chain into a protocol status carrying its metadata.
///
/// The first status-bearing level of the chain (ignoring [`MetadataError`]
/// levels) provides the code, message and existing details, all of which are
/// kept. If there is none, the status is [`Code::Unknown`] with the rendered
/// message of `err`.
///
/// The metadata of the whole chain is collapsed with "last value wins" and
/// merged into the status's metadata detail: an existing metadata detail is
/// replaced in place by one holding its old entries plus the new ones, with
/// the new ones winning on key collisions. Other details are untouched.
///
/// Pairs whose key is not a string, or whose value has no protobuf
/// representation, are left out of the detail. If nothing representable
/// remains, the base status is returned unchanged.
///
/// A base status whose details could not be decoded (see
/// [`RpcStatus::raw_details`]) is also returned unchanged: its payload is
/// passed through verbatim and the metadata stays local.
///
/// # Examples
///
/// ```
/// use causemeta::{MetadataError, metadata, to_status};
/// use tonic::Code;
///
/// let err = MetadataError::new(
///     MetadataError::new(tonic::Status::not_found("m"), metadata!["k", "inner"]),
///     metadata!["k", "outer"],
/// );
/// let status = to_status(&err);
///
/// assert_eq!(status.code(), Code::NotFound);
/// assert_eq!(status.message(), "m");
/// assert_eq!(status.metadata().unwrap()["k"], causemeta::Value::from("outer"));
/// ```
#[must_use]
pub fn to_status(err: &(dyn Error + 'static)) -> RpcStatus {
    let base = find_status_source(err)
        .unwrap_or_else(|| RpcStatus::new(Code::Unknown, err.to_string()));

    let metadata = get_metadata(err);
    if metadata.is_empty() {
        return base;
    }

    merge_metadata(base, collapse(metadata))
}

/// Like [`to_status`], but the absence of an error yields [`RpcStatus::ok`].
#[must_use]
pub fn to_status_opt(err: Option<&(dyn Error + 'static)>) -> RpcStatus {
    err.map_or_else(RpcStatus::ok, to_status)
}

fn find_status_source(err: &(dyn Error + 'static)) -> Option<RpcStatus> {
    Chain::new(err)
        .filter(|node| !node.is::<MetadataError>())
        .find_map(probe)
}

/// Collapses a flat metadata sequence into protobuf fields, last value wins.
fn collapse(metadata: alloc::vec::Vec<Value>) -> IndexMap<String, prost_types::Value> {
    let mut fields = IndexMap::new();
    let mut entries = metadata.into_iter();

    while let (Some(key), Some(value)) = (entries.next(), entries.next()) {
        let key = match key {
            Value::String(key) => key,
            other => {
                tracing::debug!(key = %other, "dropping metadata pair with a non-string key");
                continue;
            }
        };
        if key == METADATA_MARKER {
            tracing::debug!(%key, "dropping metadata pair that shadows the marker field");
            continue;
        }
        match codec::encode_value(&value) {
            Some(encoded) => {
                fields.insert(key, encoded);
            }
            None => {
                tracing::debug!(%key, "dropping metadata value without a protobuf representation");
            }
        }
    }

    fields
}

fn merge_metadata(mut base: RpcStatus, fields: IndexMap<String, prost_types::Value>) -> RpcStatus {
    if fields.is_empty() {
        return base;
    }
    if base.raw_details.is_some() {
        tracing::debug!(
            code = ?base.code,
            "not merging metadata into undecodable status details"
        );
        return base;
    }

    match base.metadata_detail() {
        Some((idx, existing)) => {
            let mut merged: IndexMap<String, prost_types::Value> = existing
                .fields
                .into_iter()
                .filter(|(key, _)| key.as_str() != METADATA_MARKER)
                .collect();
            merged.extend(fields);
            base.details[idx] = codec::encode_metadata_detail(merged);
        }
        None => base.details.push(codec::encode_metadata_detail(fields)),
    }

    base
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::metadata;

    #[derive(Debug, thiserror::Error)]
    #[error("plain error")]
    struct Plain;

    #[test]
    fn test_collapse_last_wins() {
        let fields = collapse(vec![
            Value::from("k"),
            Value::from("a"),
            Value::from("other"),
            Value::from(1),
            Value::from("k"),
            Value::from("b"),
        ]);
        assert_eq!(fields.len(), 2);
        assert_eq!(codec::decode_value(&fields["k"]), Value::from("b"));
        // First insertion position is kept.
        assert_eq!(fields.get_index_of("k"), Some(0));
    }

    #[test]
    fn test_collapse_drops_unrepresentable_pairs() {
        let fields = collapse(vec![
            Value::from(1),
            Value::from("int key"),
            Value::from("handle"),
            Value::opaque(()),
            Value::from(METADATA_MARKER),
            Value::from(false),
            Value::from("kept"),
            Value::from(true),
        ]);
        assert_eq!(fields.keys().collect::<alloc::vec::Vec<_>>(), ["kept"]);
    }

    #[test]
    fn test_plain_error_without_metadata() {
        assert_eq!(to_status(&Plain), RpcStatus::new(Code::Unknown, "plain error"));
    }

    #[test]
    fn test_only_unrepresentable_metadata() {
        let err = MetadataError::new(Plain, metadata!["handle", Value::opaque(())]);
        assert_eq!(to_status(&err), RpcStatus::new(Code::Unknown, "plain error"));
    }

    #[test]
    fn test_none_is_ok() {
        assert_eq!(to_status_opt(None), RpcStatus::ok());
    }
}
