//! Test fixtures that build a complete provider over a recording transport,
//! so the pipeline can be exercised without a network.

use std::sync::Arc;

use hec_logging::test_utils::{RecordingTransportFactory, test_config};
use hec_logging::{ConfigMonitor, HecConfig, HecLoggerProvider, SharedTransformer};
use rstest::fixture;

/// A running provider plus handles to its monitor and transport.
pub struct Pipeline {
    pub monitor: Arc<ConfigMonitor>,
    pub transport: RecordingTransportFactory,
    pub provider: HecLoggerProvider,
}

/// Build a pipeline for `config` producing payloads with `transformer`.
pub fn pipeline_with(config: HecConfig, transformer: impl Into<SharedTransformer>) -> Pipeline {
    let monitor = Arc::new(ConfigMonitor::new(config).expect("valid config"));
    let transport = RecordingTransportFactory::new();
    let provider = HecLoggerProvider::with_transport_factory(
        Arc::clone(&monitor),
        transformer,
        Arc::new(transport.clone()),
    )
    .expect("provider");
    Pipeline {
        monitor,
        transport,
        provider,
    }
}

/// Raw-endpoint pipeline with size-only batching.
///
/// # Arguments
/// * `batch_size` - units per batch before the worker posts.
#[fixture]
pub fn raw_pipeline(#[default(10)] batch_size: usize) -> Pipeline {
    pipeline_with(
        test_config(batch_size),
        hec_logging::RawPayloadTransformer::new(),
    )
}
