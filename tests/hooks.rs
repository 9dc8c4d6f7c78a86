use causemeta::{
    MetadataError, Value, get_metadata,
    hooks::Hooks,
    metadata,
    status::{RpcStatus, StatusSource},
    to_status,
};
use tonic::Code;

#[derive(Debug, thiserror::Error)]
#[error("collection {name} does not exist")]
struct CollectionMissing {
    name: &'static str,
}

impl StatusSource for CollectionMissing {
    fn rpc_status(&self) -> RpcStatus {
        RpcStatus::new(Code::NotFound, self.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("disk quota exceeded")]
struct QuotaExceeded;

// Hooks are process-global, so every scenario lives in one test.
#[test]
fn status_sources() {
    let err = MetadataError::new(
        CollectionMissing { name: "products" },
        metadata!["collection", "products"],
    );

    Hooks::uninstall();
    assert_eq!(to_status(&err).code(), Code::Unknown);

    Hooks::new()
        .status_source::<CollectionMissing>()
        .install()
        .unwrap();
    let status = to_status(&err);
    assert_eq!(status.code(), Code::NotFound);
    assert_eq!(status.message(), "collection products does not exist");
    assert_eq!(
        status.metadata().unwrap()["collection"],
        Value::from("products")
    );

    let rejected = Hooks::new().install().unwrap_err();
    assert_eq!(rejected.to_string(), "hooks are already installed globally");

    let previous = Hooks::new()
        .status_source_fn(|_: &QuotaExceeded| RpcStatus::new(Code::ResourceExhausted, "quota"))
        .replace();
    assert!(format!("{previous:?}").contains("CollectionMissing"));

    let quota = MetadataError::new(QuotaExceeded, metadata!["volume", "v-1"]);
    let status = to_status(&quota);
    assert_eq!(status.code(), Code::ResourceExhausted);
    assert_eq!(status.message(), "quota");
    // The previous hooks are gone.
    assert_eq!(to_status(&err).code(), Code::Unknown);

    // Sources without a metadata detail contribute nothing to traversal.
    assert_eq!(get_metadata(&quota).len(), 2);

    assert!(Hooks::uninstall().is_some());
    assert_eq!(to_status(&quota).code(), Code::Unknown);
}
