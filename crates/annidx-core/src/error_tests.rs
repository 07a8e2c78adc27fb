//! Tests for `error` module

use super::error::*;

#[test]
fn test_error_codes_are_unique() {
    let errors: Vec<Error> = vec![
        Error::DimensionMismatch {
            expected: 768,
            actual: 512,
        },
        Error::UnsupportedVectorType("varbit".into()),
        Error::ZeroVector,
        Error::NonFiniteNorm,
        Error::OptionOutOfRange {
            option: "m",
            value: 0,
            min: 2,
            max: 100,
        },
        Error::DimensionTooLowForSpherical { dimension: 1 },
        Error::ResourceExhausted("cannot extend relation".into()),
        Error::Corrupt {
            relation: "idx".into(),
            detail: "bad magic".into(),
        },
        Error::WorkerLaunchFailed("fork failed".into()),
        Error::Cancelled,
        Error::Io(std::io::Error::other("test")),
        Error::Serialization("test".into()),
        Error::Internal("test".into()),
    ];

    let codes: Vec<&str> = errors.iter().map(Error::code).collect();
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(
        codes.len(),
        unique_codes.len(),
        "every error variant must have a unique code"
    );
    for code in &codes {
        assert!(code.starts_with("ANNIDX-"));
    }
}

#[test]
fn test_corrupt_and_resource_exhausted_are_unrecoverable() {
    assert!(!Error::Corrupt {
        relation: "idx".into(),
        detail: "bad version".into()
    }
    .is_recoverable());
    assert!(!Error::ResourceExhausted("no space".into()).is_recoverable());
}

#[test]
fn test_validation_errors_are_recoverable() {
    assert!(Error::DimensionMismatch {
        expected: 2,
        actual: 3
    }
    .is_recoverable());
    assert!(Error::ZeroVector.is_recoverable());
    assert!(Error::DimensionTooLowForSpherical { dimension: 1 }.is_recoverable());
    assert!(Error::OptionOutOfRange {
        option: "lists",
        value: 0,
        min: 1,
        max: 32768
    }
    .is_recoverable());
}

#[test]
fn test_worker_launch_failed_is_recoverable() {
    // Never surfaced to a caller, but if it were, it must not poison the index.
    assert!(Error::WorkerLaunchFailed("spawn failed".into()).is_recoverable());
}

#[test]
fn test_display_includes_code() {
    let err = Error::ZeroVector;
    assert!(err.to_string().contains("ANNIDX-003"));
}

#[test]
fn test_io_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let err: Error = io_err.into();
    assert_eq!(err.code(), "ANNIDX-011");
}
