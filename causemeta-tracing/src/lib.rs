#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    unused_doc_comments
)]

//! Structured logging of causemeta error metadata through `tracing`.
//!
//! This crate is the logging side of causemeta: it walks an error chain with
//! [`get_metadata`] and emits the result as a single `tracing` event, so the
//! key/value pairs attached at every layer end up next to the error message
//! in whatever subscriber you already use.
//!
//! # Quick Start
//!
//! ```
//! use causemeta::prelude::*;
//! use causemeta_tracing::LogErrorExt;
//!
//! fn load(shard: u32) -> Result<Vec<u8>, MetadataError> {
//!     std::fs::read(format!("/data/shard-{shard}")).with_metadata(metadata!["shard", shard])
//! }
//!
//! tracing_subscriber::fmt().init();
//!
//! // Logs the error with its metadata and hands the result back unchanged.
//! let _ = load(7).log_err();
//! ```
//!
//! Output:
//! ```text
//! ERROR causemeta_tracing: operation failed error=No such file or directory (os error 2) metadata=shard=7 classification="unclassified"
//! ```
//!
//! # Duplicate Keys
//!
//! By default every pair is logged in chain order, innermost first, duplicates
//! included. That is the full history of what each layer attached. Set
//! [`ErrorLogger::collapse`] (or the `collapsed` environment option) to log
//! each key once with the value attached by the outermost layer instead.
//!
//! # Environment Variables
//!
//! - `CAUSEMETA_TRACING` - Comma-separated options:
//!   - `collapsed` - Log each key once, last value wins
//!   - `level=<level>` - Event level (`trace`, `debug`, `info`, `warn` or
//!     `error`, default `error`)

use std::{error::Error, fmt, str::FromStr, sync::OnceLock};

use causemeta::{
    Value, get_metadata,
    markers::{is_non_retryable, is_retryable},
};
use indexmap::IndexMap;
use tracing::Level;

/// Display adapter rendering metadata pairs as `key=value` separated by
/// spaces.
///
/// String values that are empty or contain whitespace, `=` or `"` are
/// rendered quoted so the output stays parseable.
///
/// # Examples
///
/// ```
/// use causemeta::{MetadataError, metadata};
/// use causemeta_tracing::MetadataFields;
///
/// let err = MetadataError::new(
///     std::io::Error::other("boom"),
///     metadata!["user", "ada", "note", "two words"],
/// );
/// assert_eq!(
///     MetadataFields::raw(&err).to_string(),
///     r#"user=ada note="two words""#
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetadataFields {
    pairs: Vec<(Value, Value)>,
}

impl MetadataFields {
    /// Every pair of the chain, innermost first, duplicates included.
    pub fn raw(err: &(dyn Error + 'static)) -> Self {
        Self::from_values(get_metadata(err))
    }

    /// One pair per key: first position, last value.
    ///
    /// Keys are compared by their rendered form, since that is what ends up
    /// in the log line.
    pub fn collapsed(err: &(dyn Error + 'static)) -> Self {
        let mut fields = Self::raw(err);
        fields.collapse();
        fields
    }

    /// Builds the adapter from a flat key/value sequence.
    ///
    /// A trailing key without a value is dropped.
    pub fn from_values(values: Vec<Value>) -> Self {
        let mut pairs = Vec::with_capacity(values.len() / 2);
        let mut values = values.into_iter();
        while let (Some(key), Some(value)) = (values.next(), values.next()) {
            pairs.push((key, value));
        }
        Self { pairs }
    }

    /// The rendered pairs.
    pub fn pairs(&self) -> &[(Value, Value)] {
        &self.pairs
    }

    /// Returns `true` if there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn collapse(&mut self) {
        let mut collapsed: IndexMap<String, (Value, Value)> =
            IndexMap::with_capacity(self.pairs.len());
        for (key, value) in self.pairs.drain(..) {
            collapsed.insert(key.to_string(), (key, value));
        }
        self.pairs = collapsed.into_values().collect();
    }
}

impl fmt::Display for MetadataFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.pairs.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}=")?;
            match value {
                Value::String(s) if needs_quoting(s) => write!(f, "{s:?}")?,
                other => write!(f, "{other}")?,
            }
        }
        Ok(())
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c == '=' || c == '"')
}

#[derive(Debug, PartialEq)]
struct CausemetaTracingEnvOptions {
    collapsed: bool,
    level: Option<Level>,
}

impl CausemetaTracingEnvOptions {
    fn get() -> &'static Self {
        static CAUSEMETA_TRACING_FLAGS: OnceLock<CausemetaTracingEnvOptions> = OnceLock::new();

        CAUSEMETA_TRACING_FLAGS.get_or_init(|| match std::env::var_os("CAUSEMETA_TRACING") {
            Some(var) => Self::parse(&var.to_string_lossy()),
            None => Self::parse(""),
        })
    }

    fn parse(var: &str) -> Self {
        let mut collapsed = false;
        let mut level = None;

        for v in var.split(',').map(str::trim) {
            if v.eq_ignore_ascii_case("collapsed") {
                collapsed = true;
            } else if let Some((name, value)) = v.split_once('=')
                && name.trim().eq_ignore_ascii_case("level")
            {
                // Unknown levels keep the default.
                if let Ok(parsed) = Level::from_str(value.trim()) {
                    level = Some(parsed);
                }
            }
        }

        Self { collapsed, level }
    }
}

/// Emits one `tracing` event per error, carrying the error chain's metadata.
///
/// The event has three fields besides its message:
///
/// - `error`: the error's `Display` output
/// - `metadata`: the chain's metadata rendered by [`MetadataFields`]
/// - `classification`: `"retryable"`, `"non_retryable"` or `"unclassified"`
///
/// # Examples
///
/// ```
/// use causemeta::{MetadataError, metadata};
/// use causemeta_tracing::ErrorLogger;
///
/// let logger = ErrorLogger {
///     collapse: true,
///     level: tracing::Level::WARN,
/// };
///
/// let err = MetadataError::new(std::io::Error::other("boom"), metadata!["attempt", 3]);
/// logger.log(&err);
/// ```
#[derive(Copy, Clone, Debug)]
pub struct ErrorLogger {
    /// Whether duplicate keys are collapsed to their last value before
    /// logging.
    pub collapse: bool,
    /// The level of the emitted event.
    pub level: Level,
}

impl ErrorLogger {
    /// Creates a logger configured from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `CAUSEMETA_TRACING` - Comma-separated options:
    ///   - `collapsed` - Log each key once, last value wins
    ///   - `level=<level>` - Event level, default `error`
    pub fn new() -> Self {
        let env_options = CausemetaTracingEnvOptions::get();
        Self {
            collapse: env_options.collapsed,
            level: env_options.level.unwrap_or(Level::ERROR),
        }
    }

    /// The fields this logger would emit for `err`.
    pub fn fields(&self, err: &(dyn Error + 'static)) -> MetadataFields {
        if self.collapse {
            MetadataFields::collapsed(err)
        } else {
            MetadataFields::raw(err)
        }
    }

    /// Emits the event for `err`.
    pub fn log(&self, err: &(dyn Error + 'static)) {
        let metadata = self.fields(err);
        let classification = classification(err);

        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    error = %err,
                    metadata = %metadata,
                    classification,
                    "operation failed"
                )
            };
        }

        if self.level == Level::TRACE {
            emit!(Level::TRACE);
        } else if self.level == Level::DEBUG {
            emit!(Level::DEBUG);
        } else if self.level == Level::INFO {
            emit!(Level::INFO);
        } else if self.level == Level::WARN {
            emit!(Level::WARN);
        } else {
            emit!(Level::ERROR);
        }
    }
}

impl Default for ErrorLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn classification(err: &(dyn Error + 'static)) -> &'static str {
    if is_retryable(err) {
        "retryable"
    } else if is_non_retryable(err) {
        "non_retryable"
    } else {
        "unclassified"
    }
}

/// Extension trait for logging the error of a `Result` on the way past.
///
/// # Examples
///
/// ```
/// use causemeta::prelude::*;
/// use causemeta_tracing::LogErrorExt;
///
/// fn connect() -> Result<(), Classified<markers::Retryable>> {
///     Err(std::io::Error::other("refused")).retryable(metadata!["addr", "10.0.0.1"])
/// }
///
/// let result = connect().log_err();
/// assert!(result.is_err());
/// ```
pub trait LogErrorExt: Sized {
    /// Logs the error, if any, with an environment-configured
    /// [`ErrorLogger`].
    fn log_err(self) -> Self {
        self.log_err_with(&ErrorLogger::new())
    }

    /// Logs the error, if any, with `logger`.
    fn log_err_with(self, logger: &ErrorLogger) -> Self;
}

impl<V, E> LogErrorExt for Result<V, E>
where
    E: Error + 'static,
{
    fn log_err_with(self, logger: &ErrorLogger) -> Self {
        if let Err(err) = &self {
            logger.log(err);
        }
        self
    }
}
