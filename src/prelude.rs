//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use causemeta::prelude::*;
//!
//! fn connect(addr: &str) -> Result<(), Classified<markers::Retryable>> {
//!     Err(std::io::Error::other("connection refused")).retryable(metadata!["addr", addr])
//! }
//!
//! let err = connect("10.0.0.1:6334").unwrap_err();
//! assert!(is_retryable(&err));
//! assert_eq!(get_metadata(&err).len(), 2);
//! ```
//!
//! # What's Included
//!
//! - **[`MetadataError`]** and **[`Metadata`]**: the wrapper and its container
//! - **[`ResultExt`]**: extension methods for `Result` types
//! - **[`metadata!`]**: builds a [`Metadata`] from mixed arguments
//! - **[`get_metadata`]** and **[`to_status`]**: chain traversal and the status
//!   bridge
//! - **[`markers`]**: retry classification

pub use crate::{
    Metadata, MetadataError, get_metadata, markers,
    markers::{Classified, is_non_retryable, is_retryable},
    metadata,
    result_ext::ResultExt,
    to_status,
};
