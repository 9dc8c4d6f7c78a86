use causemeta::{
    MetadataError, Value, get_metadata, metadata,
    markers::{as_non_retryable, as_retryable, is_non_retryable, is_retryable},
    prelude::ResultExt,
    to_status,
};
use tonic::Code;

#[derive(Debug, thiserror::Error)]
#[error("{context}: {source}")]
struct Context {
    context: &'static str,
    source: causemeta::BoxError,
}

#[derive(Debug, thiserror::Error)]
#[error("lease expired")]
struct LeaseExpired;

#[test]
fn retryable_is_not_non_retryable() {
    let err = as_retryable(LeaseExpired, metadata!["lease", 42]);
    assert!(is_retryable(&err));
    assert!(!is_non_retryable(&err));

    let err = as_non_retryable(LeaseExpired, metadata!["lease", 42]);
    assert!(is_non_retryable(&err));
    assert!(!is_retryable(&err));
}

#[test]
fn classification_survives_further_wrapping() {
    let err = as_retryable(LeaseExpired, metadata!["lease", 42]);
    let err = MetadataError::new(err, metadata!["node", "n-3"]);
    let err = Context {
        context: "renew",
        source: Box::new(err),
    };
    let err = MetadataError::new(err, metadata!["tenant", "acme"]);

    assert!(is_retryable(&err));
    assert!(!is_non_retryable(&err));
    assert_eq!(err.to_string(), "renew: lease expired");
}

#[test]
fn unclassified_errors() {
    let err = MetadataError::new(LeaseExpired, metadata!["k", "v"]);
    assert!(!is_retryable(&err));
    assert!(!is_non_retryable(&err));
}

#[test]
fn classification_carries_metadata() {
    let err = as_retryable(LeaseExpired, metadata!["attempt", 2]);
    assert_eq!(err.to_string(), "lease expired");
    assert_eq!(get_metadata(&err), vec![Value::from("attempt"), Value::from(2)]);
}

#[test]
fn classified_status_keeps_its_code() {
    let err = as_non_retryable(
        tonic::Status::invalid_argument("bad vector dimension"),
        metadata!["expected", 768],
    );
    let status = to_status(&err);
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "bad vector dimension");
    assert!(status.metadata().unwrap().contains_key("expected"));
}

#[test]
fn result_helpers_classify() {
    let result: Result<(), LeaseExpired> = Err(LeaseExpired);
    let err = result.non_retryable(metadata!["reason", "revoked"]).unwrap_err();
    assert!(is_non_retryable(&err));

    let ok: Result<u8, LeaseExpired> = Ok(1);
    assert_eq!(ok.retryable(metadata!["unused"]).unwrap(), 1);
}
