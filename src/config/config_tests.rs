//! Unit tests for configuration validation, loading, and change monitoring.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rstest::{fixture, rstest};

use super::*;

#[fixture]
fn valid() -> HecConfigBuilder {
    HecConfig::builder()
        .with_collector_url("https://splunk.example:8088/services/collector")
        .with_auth_token("token-123")
}

#[test]
fn defaults_match_documented_values() {
    let config = HecConfig::default();
    assert_eq!(config.timeout_ms, 1_500);
    assert_eq!(config.batch_interval_ms, 1_000);
    assert_eq!(config.batch_size, 50);
    assert_eq!(config.channel_id, ChannelIdMode::None);
    assert!(!config.use_token_as_query_string);
    assert!(!config.include_scopes);
    assert!(config.timestamp_format.is_none());
}

#[rstest]
fn builder_accepts_minimal_config(valid: HecConfigBuilder) {
    let config = valid.build().expect("minimal config should build");
    assert_eq!(config.auth_token, "token-123");
}

#[rstest]
fn rejects_missing_url() {
    let err = HecConfig::builder()
        .with_auth_token("t")
        .build()
        .expect_err("url is required");
    assert!(matches!(err, ConfigError::MissingCollectorUrl));
}

#[rstest]
fn rejects_missing_token() {
    let err = HecConfig::builder()
        .with_collector_url("http://localhost:8088")
        .build()
        .expect_err("token is required");
    assert!(matches!(err, ConfigError::MissingAuthToken));
}

#[rstest]
fn rejects_url_without_scheme() {
    let err = HecConfig::builder()
        .with_collector_url("localhost:8088")
        .with_auth_token("t")
        .build()
        .expect_err("scheme is required");
    assert!(matches!(err, ConfigError::InvalidUrl(_)));
}

#[rstest]
fn rejects_zero_batch_size(valid: HecConfigBuilder) {
    let err = valid
        .with_batch_size(0)
        .build()
        .expect_err("zero batch size");
    assert_eq!(
        err.to_string(),
        "invalid configuration: batch_size must be greater than zero"
    );
}

#[rstest]
fn rejects_unknown_timestamp_specifier(valid: HecConfigBuilder) {
    let err = valid
        .with_timestamp_format("%Q")
        .build()
        .expect_err("bad pattern");
    assert!(matches!(err, ConfigError::InvalidTimestampFormat(_)));
}

#[rstest]
#[case(0, Duration::from_secs(100))]
#[case(250, Duration::from_millis(250))]
fn timeout_falls_back_when_zero(
    valid: HecConfigBuilder,
    #[case] timeout_ms: u64,
    #[case] expected: Duration,
) {
    let config = valid.with_timeout_ms(timeout_ms).build().expect("build");
    assert_eq!(config.timeout(), expected);
}

#[rstest]
fn zero_interval_disables_time_trigger(valid: HecConfigBuilder) {
    let config = valid.with_batch_interval_ms(0).build().expect("build");
    assert_eq!(config.batch_settings().interval, None);
}

#[test]
fn parses_json_with_defaults() {
    let config = HecConfig::from_json_str(
        r#"{
            "collector_url": "https://h/collector",
            "auth_token": "abc",
            "channel_id": "query_string",
            "custom_headers": {"X-Team": "ops"},
            "min_level": "warning",
            "fields": {"env": "prod"}
        }"#,
    )
    .expect("valid json");
    assert_eq!(config.channel_id, ChannelIdMode::QueryString);
    assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    assert_eq!(config.min_level, HecLevel::Warn);
    assert_eq!(config.custom_headers.get("X-Team").map(String::as_str), Some("ops"));
    assert_eq!(config.fields.get("env").map(String::as_str), Some("prod"));
}

#[test]
fn json_rejects_unknown_fields() {
    let err = HecConfig::from_json_str(
        r#"{"collector_url": "https://h", "auth_token": "a", "batchsize": 5}"#,
    )
    .expect_err("unknown field");
    assert!(matches!(err, ConfigError::Json(_)));
}

#[rstest]
fn monitor_notifies_subscribers(valid: HecConfigBuilder) {
    let monitor = ConfigMonitor::new(valid.clone().build().expect("build")).expect("monitor");
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let id = monitor.subscribe(Arc::new(move |cfg: Arc<HecConfig>| {
        assert_eq!(cfg.batch_size, 7);
        seen.fetch_add(1, Ordering::SeqCst);
    }));

    monitor
        .update(valid.clone().with_batch_size(7).build().expect("build"))
        .expect("update");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(monitor.current().batch_size, 7);

    assert!(monitor.unsubscribe(id));
    assert!(!monitor.unsubscribe(id));
    monitor
        .update(valid.with_batch_size(7).build().expect("build"))
        .expect("update");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[rstest]
fn monitor_keeps_previous_snapshot_on_invalid_update(valid: HecConfigBuilder) {
    let monitor = ConfigMonitor::new(valid.build().expect("build")).expect("monitor");
    let before = monitor.current();
    let invalid = HecConfig {
        auth_token: String::new(),
        ..(*before).clone()
    };
    assert!(monitor.update(invalid).is_err());
    assert!(Arc::ptr_eq(&before, &monitor.current()));
}
