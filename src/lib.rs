#![deny(
    missing_docs,
    unsafe_code,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Structured key/value error metadata that survives error chains and gRPC
//! status boundaries.
//!
//! ## Overview
//!
//! When an error travels up a call stack, each layer usually knows something
//! the layer below did not: the user being served, the shard being written,
//! the attempt number. This crate lets every layer attach that knowledge to
//! the error as key/value **metadata** without changing what the error is or
//! how it prints. A single handler at the top can then:
//!
//! - log the metadata of the whole chain with [`get_metadata`], or
//! - send it to another process inside a gRPC status with [`to_status`], where
//!   [`get_metadata`] on the receiving side recovers it.
//!
//! Independently, a layer can mark an error as **retryable** or
//! **non-retryable** ([`markers`]); the mark is found from anywhere above it.
//!
//! ## Quick Example
//!
//! ```
//! use causemeta::prelude::*;
//!
//! fn load_shard(shard: u32) -> Result<Vec<u8>, MetadataError> {
//!     std::fs::read(format!("/data/shard-{shard}")).with_metadata(metadata!["shard", shard])
//! }
//!
//! fn handle(collection: &str) -> Result<Vec<u8>, MetadataError> {
//!     load_shard(7).with_metadata(metadata!["collection", collection])
//! }
//!
//! let err = handle("products").unwrap_err();
//!
//! // Innermost first, duplicates kept: ready for a structured logger.
//! let fields = get_metadata(&err);
//! assert_eq!(fields[0], causemeta::Value::from("shard"));
//! assert_eq!(fields[2], causemeta::Value::from("collection"));
//!
//! // Ready for the wire.
//! let status: tonic::Status = err.into();
//! ```
//!
//! ## Core Concepts
//!
//! Metadata is a flat sequence of alternating keys and values, never a map.
//! Insertion order and duplicate keys are preserved until a consumer decides
//! what to do with them. A key attached without a value is paired with
//! [`MISSING_VALUE`].
//!
//! Ordering across a chain is **innermost first**: metadata attached closest
//! to the root cause comes first. Consumers that collapse the sequence with
//! "last value wins", including [`to_status`], therefore keep the value
//! attached by the outermost, most specific layer.
//!
//! Wrapping is transparent. [`MetadataError`] and
//! [`Classified`](markers::Classified) display exactly like the error they
//! wrap and expose it through [`Error::source`](core::error::Error::source).
//!
//! ## Ecosystem
//!
//! - **[`causemeta-tracing`]** - emits error metadata as fields of
//!   [`tracing`] events.
//!
//! [`causemeta-tracing`]: https://docs.rs/causemeta-tracing
//! [`tracing`]: https://docs.rs/tracing

extern crate alloc;

#[macro_use]
mod macros;

pub mod hooks;
pub mod markers;
pub mod metadata;
pub mod prelude;
pub mod status;

mod chain;
mod result_ext;
mod value;
mod wrap;

pub use self::{
    chain::{Chain, MAX_CHAIN_DEPTH, get_metadata, get_metadata_opt},
    metadata::{MISSING_VALUE, Metadata, MetadataArg},
    result_ext::ResultExt,
    status::{to_status, to_status_opt},
    value::Value,
    wrap::{MetadataError, attach},
};

/// A boxed, thread-safe error: the owned cause of every wrapper in this crate.
pub type BoxError = alloc::boxed::Box<dyn core::error::Error + Send + Sync + 'static>;
