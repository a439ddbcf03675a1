//! Test-only helpers shared across unit and integration tests.
//!
//! Compiled for unit tests and, through the `test-util` feature, for the
//! integration tests under `tests/`.

pub mod recording_transport;

pub use recording_transport::{
    CapturedPost, FailingTransportFactory, RecordingTransportFactory, TransportEvent,
};

use crate::config::HecConfig;

pub const TEST_COLLECTOR_URL: &str = "https://hec.example.com:8088";
pub const TEST_TOKEN: &str = "00000000-0000-0000-0000-000000000001";

/// Valid configuration pointing at [`TEST_COLLECTOR_URL`] with size-only
/// batching of `batch_size` units.
pub fn test_config(batch_size: usize) -> HecConfig {
    HecConfig {
        collector_url: TEST_COLLECTOR_URL.to_string(),
        auth_token: TEST_TOKEN.to_string(),
        batch_size,
        batch_interval_ms: 0,
        ..HecConfig::default()
    }
}
