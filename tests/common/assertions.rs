//! Custom assertion macros and utilities
//!
//! Provides enhanced assertion macros for better test output and
//! more descriptive error messages.

/// Assert that a result is ok and return the value
///
/// This macro unwraps a Result, providing a better error message
/// if the result is an error.
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that an error body has the expected status and kind
#[macro_export]
macro_rules! assert_error_body {
    ($body:expr, $status:expr, $kind:expr) => {{
        let body: &serde_json::Value = &$body;
        assert_eq!(body["status"], $status, "unexpected error body: {}", body);
        assert_eq!(body["kind"], $kind, "unexpected error body: {}", body);
        assert!(body["error"].is_string(), "error message missing: {}", body);
    }};
}

/// Assert that a string contains a substring
#[macro_export]
macro_rules! assert_contains {
    ($haystack:expr, $needle:expr) => {
        assert!(
            $haystack.contains($needle),
            "Expected '{}' to contain '{}'",
            $haystack,
            $needle
        );
    };
}
