//! Tests for the error system.

use insur::auth::AuthError;
use insur::error::unified::*;
use insur::error::*;
use serde_json::json;

#[test]
fn error_http_creation() {
    let err = InsurError::http(404, Some(json!({ "message": "Not found" })));
    assert!(matches!(&err, InsurError::Http { status: 404, .. }));
    assert_eq!(err.to_string(), "HTTP error (status 404): Not found");
}

#[test]
fn error_helper_mappings_are_stable_for_major_variants() {
    struct Case {
        error: InsurError,
        expected_category: ErrorCategory,
        expected_recovery: RecoverySuggestion,
    }

    let io_error = std::io::Error::new(std::io::ErrorKind::Other, "disk");
    let serde_error = serde_json::from_str::<serde_json::Value>("{not-json}").unwrap_err();

    let cases = vec![
        Case {
            error: InsurError::Auth(AuthError::Unauthorized),
            expected_category: ErrorCategory::Authentication,
            expected_recovery: RecoverySuggestion::LogInAgain,
        },
        Case {
            error: InsurError::Network("connection refused".to_string()),
            expected_category: ErrorCategory::Network,
            expected_recovery: RecoverySuggestion::RetryLater,
        },
        Case {
            error: InsurError::Configuration("bad-config".to_string()),
            expected_category: ErrorCategory::Configuration,
            expected_recovery: RecoverySuggestion::CheckConfiguration,
        },
        Case {
            error: InsurError::Serialization(serde_error),
            expected_category: ErrorCategory::Serialization,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: InsurError::InvalidArgument("bad-arg".to_string()),
            expected_category: ErrorCategory::Validation,
            expected_recovery: RecoverySuggestion::FixInput,
        },
        Case {
            error: InsurError::http(403, None),
            expected_category: ErrorCategory::Authentication,
            expected_recovery: RecoverySuggestion::LogInAgain,
        },
        Case {
            error: InsurError::http(422, Some(json!({ "message": "Invalid amount" }))),
            expected_category: ErrorCategory::Validation,
            expected_recovery: RecoverySuggestion::FixInput,
        },
        Case {
            error: InsurError::http(503, None),
            expected_category: ErrorCategory::Server,
            expected_recovery: RecoverySuggestion::RetryLater,
        },
        Case {
            error: InsurError::http(418, None),
            expected_category: ErrorCategory::Api,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: InsurError::Operation {
                message: "Failed to fetch claims".to_string(),
                status: None,
            },
            expected_category: ErrorCategory::Unknown,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
        Case {
            error: InsurError::Io(io_error),
            expected_category: ErrorCategory::Unknown,
            expected_recovery: RecoverySuggestion::ContactSupport,
        },
    ];

    for case in cases {
        assert_eq!(
            case.error.category(),
            case.expected_category,
            "category for {:?}",
            case.error
        );
        assert_eq!(
            case.error.recovery_suggestion(),
            case.expected_recovery,
            "recovery for {:?}",
            case.error
        );
    }
}

#[test]
fn message_prefers_backend_payload() {
    let err = InsurError::http(400, Some(json!({ "error": "Username already taken" })));
    assert_eq!(err.message(), "Username already taken");

    let err = InsurError::Network("timed out".into());
    assert_eq!(err.message(), "Network error: timed out");
}

#[test]
fn auth_error_converts_into_insur_error() {
    let err: InsurError = AuthError::NoRefreshToken.into();
    assert!(err.requires_login());
    assert!(err.to_string().starts_with("Authentication error:"));
}
