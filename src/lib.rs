//! Batched log shipping to the Splunk HTTP Event Collector.
//!
//! Records are serialized on the caller's thread, appended to a FIFO batch
//! queue, and posted by a single background worker when the batch size is
//! reached, the batch interval elapses, a flush is requested, or the
//! provider shuts down. Configuration changes published through a
//! [`ConfigMonitor`] rebuild the HTTP client without stopping the pipeline.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hec_logging::{ConfigMonitor, HecConfig, HecLoggerProvider, RawPayloadTransformer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HecConfig::builder()
//!     .with_collector_url("https://splunk.example.com:8088/services/collector")
//!     .with_auth_token("token")
//!     .build()?;
//! let monitor = Arc::new(ConfigMonitor::new(config)?);
//! let provider = HecLoggerProvider::new(monitor, RawPayloadTransformer::new())?;
//! provider.create_logger("app.http").info("listening")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod hec;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod log_record;
pub mod logger;
pub mod processor;
pub mod provider;
pub mod rate_limited_warner;
pub mod scope;
#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;
pub mod timestamp;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;
pub mod transform;

pub use config::{
    ChannelIdMode, ConfigError, ConfigMonitor, HecConfig, HecConfigBuilder, SubscriptionId,
};
pub use hec::{
    ClientError, ClientManager, DeliveryError, Endpoint, HecDelivery, HecResponse, HecTransport,
    TransportError, TransportFactory, UreqTransportFactory,
};
pub use level::{HecLevel, ParseLevelError};
#[cfg(feature = "log-compat")]
pub use log_compat::{HecLogAdapter, install_global_logger};
pub use log_record::{EventId, ExceptionInfo, HecLogRecord};
pub use logger::{HecLogger, LogError};
pub use processor::{BatchProcessor, BatchSettings, BatchSink, ProcessorError, WorkerState};
pub use provider::{HecLoggerProvider, ProviderError};
pub use scope::{
    NullScopeProvider, ScopeGuard, ScopeProvider, ScopeValue, ThreadLocalScopeProvider,
};
#[cfg(feature = "tracing-compat")]
pub use tracing_compat::HecLayer;
pub use transform::{
    JsonPayloadTransformer, PayloadCreator, PayloadTransformer, RawPayloadTransformer,
    SharedTransformer, TransformError,
};

/// Crates whose log output originates in the delivery path.
const TRANSPORT_CRATES: [&str; 3] = ["ureq", "native_tls", "rustls"];

fn in_crate(target: &str, krate: &str) -> bool {
    target
        .strip_prefix(krate)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

/// Whether `target` names this crate, the HTTP stack it sends through, or
/// one of their modules.
pub(crate) fn is_internal_target(target: &str) -> bool {
    in_crate(target, env!("CARGO_CRATE_NAME"))
        || TRANSPORT_CRATES.iter().any(|krate| in_crate(target, krate))
}

/// Whether a record must be kept out of the pipeline. Bridges skip records
/// with an internal target and anything raised while a batch is being
/// delivered, so the pipeline's own output can never feed back into it.
pub(crate) fn is_pipeline_record(target: &str) -> bool {
    processor::in_delivery() || is_internal_target(target)
}
