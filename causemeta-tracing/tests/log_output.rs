use std::{
    io,
    sync::{Arc, Mutex},
};

use causemeta::{MetadataError, markers, metadata};
use causemeta_tracing::{ErrorLogger, LogErrorExt};
use tracing::Level;

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
struct DiskFull;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture(f: impl FnOnce()) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(Level::TRACE)
        .without_time()
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    captured.contents()
}

fn layered() -> MetadataError {
    let inner = MetadataError::new(DiskFull, metadata!["volume", "/var", "attempt", 1]);
    MetadataError::new(inner, metadata!["attempt", 2])
}

#[test]
fn raw_pairs_are_logged_by_default() {
    let logger = ErrorLogger {
        collapse: false,
        level: Level::ERROR,
    };
    let output = capture(|| logger.log(&layered()));

    assert!(output.contains("ERROR"), "{output}");
    assert!(output.contains("error=disk full"), "{output}");
    assert!(
        output.contains("metadata=volume=/var attempt=1 attempt=2"),
        "{output}"
    );
    assert!(output.contains("classification=\"unclassified\""), "{output}");
}

#[test]
fn collapsed_pairs_keep_last_value() {
    let logger = ErrorLogger {
        collapse: true,
        level: Level::WARN,
    };
    let output = capture(|| logger.log(&layered()));

    assert!(output.contains("WARN"), "{output}");
    assert!(output.contains("metadata=volume=/var attempt=2"), "{output}");
    assert!(!output.contains("attempt=1"), "{output}");
}

#[test]
fn classification_is_reported() {
    let logger = ErrorLogger {
        collapse: false,
        level: Level::INFO,
    };
    let err = markers::as_retryable(DiskFull, metadata!["shard", 4]);
    let output = capture(|| logger.log(&err));

    assert!(output.contains("INFO"), "{output}");
    assert!(output.contains("classification=\"retryable\""), "{output}");
}

#[test]
fn log_err_passes_results_through() {
    let logger = ErrorLogger {
        collapse: false,
        level: Level::ERROR,
    };

    let output = capture(|| {
        let ok: Result<u8, MetadataError> = Ok(5);
        assert_eq!(ok.log_err_with(&logger).unwrap(), 5);
    });
    assert!(output.is_empty(), "{output}");

    let output = capture(|| {
        let err: Result<u8, MetadataError> = Err(layered());
        let err = err.log_err_with(&logger).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    });
    assert!(output.contains("error=disk full"), "{output}");
}
