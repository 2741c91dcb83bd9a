//! Error Type Tests.

use dtusim_core::common::{ConfigError, DtuError};
use pretty_assertions::assert_eq;

#[test]
fn dtu_error_messages_name_the_endpoint() {
    assert_eq!(
        DtuError::BufferOverflow { ep: 3 }.to_string(),
        "endpoint 3: receive buffer full"
    );
    assert_eq!(
        DtuError::MessageTooLarge {
            ep: 2,
            size: 128,
            max: 128
        }
        .to_string(),
        "endpoint 2: message of 128 bytes exceeds the limit of 128 bytes"
    );
    assert_eq!(DtuError::InvalidOpcode(3).to_string(), "invalid opcode 0x3");
}

#[test]
fn dtu_errors_compare_by_value() {
    assert_eq!(
        DtuError::EndpointBusy { ep: 1 },
        DtuError::EndpointBusy { ep: 1 }
    );
    assert_ne!(
        DtuError::EndpointBusy { ep: 1 },
        DtuError::EndpointBusy { ep: 2 }
    );
}

#[test]
fn config_error_wraps_parse_failures() {
    let err: ConfigError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("malformed configuration"));
}
