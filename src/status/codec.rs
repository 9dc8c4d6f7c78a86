//! Protobuf encodings used by the status bridge.
//!
//! The status details travel in the `grpc-status-details-bin` trailer as a
//! serialized `google.rpc.Status`. The metadata detail is one of its
//! `google.protobuf.Any` entries, wrapping a `google.protobuf.Struct`.

use alloc::{string::String, vec::Vec};

use indexmap::IndexMap;
use prost::Message;
use prost_types::{Any, ListValue, Struct, value::Kind};

use super::METADATA_MARKER;
use crate::value::Value;

/// Type URL of a packed `google.protobuf.Struct`.
pub(crate) const STRUCT_TYPE_URL: &str = "type.googleapis.com/google.protobuf.Struct";

/// The `google.rpc.Status` message.
#[derive(Clone, PartialEq, Message)]
pub(crate) struct RpcStatusProto {
    #[prost(int32, tag = "1")]
    pub(crate) code: i32,
    #[prost(string, tag = "2")]
    pub(crate) message: String,
    #[prost(message, repeated, tag = "3")]
    pub(crate) details: Vec<Any>,
}

/// Converts a metadata value into its protobuf form.
///
/// Returns `None` for values that have no protobuf representation. A list or
/// map is unrepresentable as a whole if any element is.
pub(crate) fn encode_value(value: &Value) -> Option<prost_types::Value> {
    let kind = match value {
        Value::Null => Kind::NullValue(prost_types::NullValue::NullValue as i32),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Int(i) => Kind::NumberValue(*i as f64),
        Value::UInt(u) => Kind::NumberValue(*u as f64),
        Value::Float(x) => Kind::NumberValue(*x),
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::List(items) => Kind::ListValue(ListValue {
            values: items.iter().map(encode_value).collect::<Option<Vec<_>>>()?,
        }),
        Value::Map(map) => {
            let mut fields = Struct::default();
            for (key, value) in map {
                fields.fields.insert(key.clone(), encode_value(value)?);
            }
            Kind::StructValue(fields)
        }
        Value::Opaque(_) => return None,
    };
    Some(prost_types::Value { kind: Some(kind) })
}

/// Converts a protobuf value back into a metadata value.
///
/// Numbers always come back as [`Value::Float`].
pub(crate) fn decode_value(value: &prost_types::Value) -> Value {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(*b),
        Some(Kind::NumberValue(x)) => Value::Float(*x),
        Some(Kind::StringValue(s)) => Value::String(s.clone()),
        Some(Kind::ListValue(list)) => Value::List(list.values.iter().map(decode_value).collect()),
        Some(Kind::StructValue(fields)) => Value::Map(
            fields
                .fields
                .iter()
                .map(|(key, value)| (key.clone(), decode_value(value)))
                .collect(),
        ),
    }
}

/// Decodes `detail` if it is a metadata payload carrying the marker field.
pub(crate) fn decode_metadata_detail(detail: &Any) -> Option<Struct> {
    if detail.type_url != STRUCT_TYPE_URL {
        return None;
    }
    let payload = Struct::decode(detail.value.as_slice()).ok()?;
    let marked = matches!(
        payload.fields.get(METADATA_MARKER),
        Some(prost_types::Value {
            kind: Some(Kind::BoolValue(true))
        })
    );
    marked.then_some(payload)
}

/// Packs entries into a marked metadata payload.
pub(crate) fn encode_metadata_detail(entries: IndexMap<String, prost_types::Value>) -> Any {
    let mut payload = Struct::default();
    payload.fields.extend(entries);
    payload.fields.insert(
        METADATA_MARKER.into(),
        prost_types::Value {
            kind: Some(Kind::BoolValue(true)),
        },
    );
    Any {
        type_url: STRUCT_TYPE_URL.into(),
        value: payload.encode_to_vec(),
    }
}

/// The business entries of a metadata payload, marker excluded.
pub(crate) fn metadata_entries(payload: &Struct) -> IndexMap<String, Value> {
    payload
        .fields
        .iter()
        .filter(|(key, _)| key.as_str() != METADATA_MARKER)
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}
