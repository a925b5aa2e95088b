//! `AppError` display format and conversions.

use cache_intercom::AppError;

#[test]
fn display_prefixes_each_kind() {
    let cases = [
        (AppError::Config("x".into()), "config: x"),
        (AppError::Slack("x".into()), "slack: x"),
        (AppError::RequestTooLarge("x".into()), "request too large: x"),
        (AppError::PurgeTransport("x".into()), "purge transport: x"),
        (AppError::PurgeProtocol("x".into()), "purge protocol: x"),
        (AppError::QueueFull("x".into()), "queue full: x"),
    ];
    for (err, expected) in cases {
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn toml_errors_become_config_errors() {
    let toml_err = toml::from_str::<toml::Value>("not = [valid").unwrap_err();
    let err = AppError::from(toml_err);
    assert!(matches!(err, AppError::Config(ref msg) if msg.starts_with("invalid config")));
}

#[test]
fn json_errors_become_protocol_errors() {
    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(AppError::from(json_err), AppError::PurgeProtocol(_)));
}

#[test]
fn implements_std_error() {
    fn assert_error<E: std::error::Error>(_: &E) {}
    let err = AppError::QueueFull("full".into());
    assert_error(&err);
    assert!(format!("{err:?}").contains("QueueFull"));
}
