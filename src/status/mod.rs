//! Bridging error chains into gRPC statuses.
//!
//! # Overview
//!
//! [`to_status`] turns an error chain into an [`RpcStatus`]: the code,
//! message and details of the first status found in the chain are kept as
//! they are, and the metadata of the whole chain is merged into a single
//! marked `google.protobuf.Struct` detail. On the receiving side, the same
//! detail is read back by [`get_metadata`](crate::get_metadata), so metadata
//! survives any number of process hops.
//!
//! ```
//! use causemeta::{MetadataError, metadata, status::RpcStatus};
//! use tonic::Code;
//!
//! let remote = tonic::Status::not_found("no such user");
//! let err = MetadataError::new(remote, metadata!["user_id", "u-7"]);
//!
//! let status: RpcStatus = err.to_status();
//! assert_eq!(status.code(), Code::NotFound);
//! assert_eq!(status.message(), "no such user");
//! assert_eq!(
//!     status.metadata().unwrap()["user_id"],
//!     causemeta::Value::from("u-7")
//! );
//!
//! // Ready for the wire.
//! let wire: tonic::Status = status.into_tonic();
//! assert_eq!(wire.code(), Code::NotFound);
//! ```
//!
//! # Status sources
//!
//! A chain level is status-bearing if it is a [`tonic::Status`], an
//! [`RpcStatus`], or a type registered with
//! [`Hooks::status_source`](crate::hooks::Hooks::status_source).

mod bridge;
pub(crate) mod codec;

use alloc::{string::String, vec::Vec};
use core::{error::Error, fmt};

use bytes::Bytes;
use indexmap::IndexMap;
use prost::Message;
use prost_types::Any;
use tonic::Code;

pub use self::bridge::{to_status, to_status_opt};
use self::codec::RpcStatusProto;
use crate::{hooks, value::Value};

/// Name of the boolean field that marks a `google.protobuf.Struct` detail as
/// error metadata.
///
/// This is a wire constant shared by every producer and consumer of the
/// status. Changing it is a protocol version change.
pub const METADATA_MARKER: &str = "causemeta.metadata.v1";

/// A gRPC status with decoded details.
///
/// This is the `google.rpc.Status` shape: a code, a message and an ordered
/// list of typed detail payloads. It converts to and from [`tonic::Status`]
/// and is itself an error, so it can sit in an error chain as a status
/// source.
///
/// A status received with details that do not decode as `google.rpc.Status`
/// keeps those bytes as they are (see [`RpcStatus::raw_details`]) and sends
/// them back out unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct RpcStatus {
    code: Code,
    message: String,
    details: Vec<Any>,
    raw_details: Option<Bytes>,
}

/// Failure to decode the details of a [`tonic::Status`].
#[derive(Debug, thiserror::Error)]
pub enum StatusDecodeError {
    /// The details bytes are not a valid `google.rpc.Status`.
    #[error("malformed status details")]
    Details(#[from] prost::DecodeError),
}

impl RpcStatus {
    /// Creates a status without details.
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: Vec::new(),
            raw_details: None,
        }
    }

    /// The status of a successful call.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(Code::Ok, String::new())
    }

    /// Returns a copy of this status with `detail` appended.
    #[must_use]
    pub fn with_detail(mut self, detail: Any) -> Self {
        self.details.push(detail);
        self
    }

    /// The status code.
    #[must_use]
    pub fn code(&self) -> Code {
        self.code
    }

    /// The status message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The detail payloads, in order.
    #[must_use]
    pub fn details(&self) -> &[Any] {
        &self.details
    }

    /// Details bytes that could not be decoded, kept verbatim.
    ///
    /// Only set by [`RpcStatus::from_tonic`] when the received details are
    /// malformed.
    #[must_use]
    pub fn raw_details(&self) -> Option<&[u8]> {
        self.raw_details.as_deref()
    }

    /// Returns `true` for [`Code::Ok`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    /// Reads the metadata detail back as business data.
    ///
    /// The marker field is not part of the result. Returns `None` if there is
    /// no metadata detail.
    #[must_use]
    pub fn metadata(&self) -> Option<IndexMap<String, Value>> {
        self.metadata_detail()
            .map(|(_, payload)| codec::metadata_entries(&payload))
    }

    pub(crate) fn metadata_detail(&self) -> Option<(usize, prost_types::Struct)> {
        self.details
            .iter()
            .enumerate()
            .find_map(|(idx, detail)| codec::decode_metadata_detail(detail).map(|p| (idx, p)))
    }

    /// Decodes a [`tonic::Status`], failing on malformed details.
    pub fn try_from_tonic(status: &tonic::Status) -> Result<Self, StatusDecodeError> {
        let details = if status.details().is_empty() {
            Vec::new()
        } else {
            RpcStatusProto::decode(status.details())?.details
        };
        Ok(Self {
            code: status.code(),
            message: status.message().into(),
            details,
            raw_details: None,
        })
    }

    /// Decodes a [`tonic::Status`], keeping malformed details as opaque
    /// bytes.
    #[must_use]
    pub fn from_tonic(status: &tonic::Status) -> Self {
        Self::try_from_tonic(status).unwrap_or_else(|error| {
            tracing::debug!(%error, code = ?status.code(), "keeping undecodable status details verbatim");
            Self {
                raw_details: Some(Bytes::copy_from_slice(status.details())),
                ..Self::new(status.code(), status.message())
            }
        })
    }

    /// Encodes into a [`tonic::Status`], packing details into the
    /// `grpc-status-details-bin` slot.
    ///
    /// Undecodable details received earlier are sent out unchanged as long as
    /// no decoded detail was added. Only code, message and details are
    /// carried: the custom metadata trailers of a received
    /// [`tonic::Status`] are not part of an `RpcStatus` and do not survive a
    /// second hop.
    #[must_use]
    pub fn into_tonic(self) -> tonic::Status {
        if self.details.is_empty() {
            return match self.raw_details {
                Some(raw) => tonic::Status::with_details(self.code, self.message, raw),
                None => tonic::Status::new(self.code, self.message),
            };
        }
        if self.raw_details.is_some() {
            tracing::debug!(code = ?self.code, "replacing undecodable status details with decoded ones");
        }
        let proto = RpcStatusProto {
            code: self.code as i32,
            message: self.message.clone(),
            details: self.details,
        };
        tonic::Status::with_details(self.code, self.message, Bytes::from(proto.encode_to_vec()))
    }
}

impl fmt::Display for RpcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rpc error: code = {:?} desc = {}", self.code, self.message)
    }
}

impl Error for RpcStatus {}

impl From<RpcStatus> for tonic::Status {
    fn from(status: RpcStatus) -> Self {
        status.into_tonic()
    }
}

impl From<&tonic::Status> for RpcStatus {
    fn from(status: &tonic::Status) -> Self {
        RpcStatus::from_tonic(status)
    }
}

impl From<crate::MetadataError> for tonic::Status {
    fn from(err: crate::MetadataError) -> Self {
        err.to_status().into_tonic()
    }
}

/// An error type that can present itself as a protocol status.
///
/// Implemented for [`tonic::Status`] and [`RpcStatus`]. Other types become
/// visible to chain traversal once registered through
/// [`Hooks::status_source`](crate::hooks::Hooks::status_source).
pub trait StatusSource {
    /// The status view of this error.
    fn rpc_status(&self) -> RpcStatus;
}

impl StatusSource for tonic::Status {
    fn rpc_status(&self) -> RpcStatus {
        RpcStatus::from_tonic(self)
    }
}

impl StatusSource for RpcStatus {
    fn rpc_status(&self) -> RpcStatus {
        self.clone()
    }
}

/// The status view of a single chain level, if it has one.
pub(crate) fn probe(err: &(dyn Error + 'static)) -> Option<RpcStatus> {
    if let Some(status) = err.downcast_ref::<tonic::Status>() {
        return Some(status.rpc_status());
    }
    if let Some(status) = err.downcast_ref::<RpcStatus>() {
        return Some(status.rpc_status());
    }
    hooks::probe_status_sources(err)
}
