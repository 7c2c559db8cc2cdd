//! Integration tests for logging setup

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    assert!(
        init_logging(config.clone()).is_ok(),
        "First initialization should succeed"
    );

    tracing::info!(document = "music/song.md", "logging initialized");

    match init_logging(config) {
        Err(Error::Config(message)) => {
            assert!(message.contains("Failed to initialize logging"))
        }
        other => panic!("Second initialization should fail, got {:?}", other),
    }
}

#[test]
fn test_invalid_filter_is_config_error() {
    let config = LoggingConfig::default().with_filter("core_sync=[[[");

    // Filter validation happens before the global subscriber is touched
    assert!(matches!(init_logging(config), Err(Error::Config(_))));
}

#[test]
fn test_token_never_logged_verbatim() {
    let token = "ghp_abcdef0123456789";
    let redacted = redact_if_sensitive("GITHUB_TOKEN", token);
    assert_eq!(redacted, "[REDACTED]");
    assert!(!redacted.contains("ghp_"));
}
