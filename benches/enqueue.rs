//! Benchmarks for the producer side of the pipeline: serialization on the
//! caller thread plus the enqueue into the batch queue.

use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use hec_logging::hec::ClientSpec;
use hec_logging::test_utils::test_config;
use hec_logging::{
    BatchProcessor, BatchSettings, ClientError, ConfigMonitor, HecConfig, HecLevel,
    HecLogRecord, HecLoggerProvider, HecResponse, HecTransport, JsonPayloadTransformer,
    PayloadTransformer, RawPayloadTransformer, TransportError, TransportFactory,
};

/// Transport that accepts every request without sending it.
struct DiscardTransport;

impl HecTransport for DiscardTransport {
    fn post(
        &self,
        _url: &str,
        _headers: &[(String, String)],
        _content_type: &str,
        body: &str,
    ) -> Result<HecResponse, TransportError> {
        black_box(body);
        Ok(HecResponse {
            status: 200,
            body: String::new(),
        })
    }
}

struct DiscardFactory;

impl TransportFactory for DiscardFactory {
    fn build(&self, _spec: &ClientSpec) -> Result<Box<dyn HecTransport>, ClientError> {
        Ok(Box::new(DiscardTransport))
    }
}

fn bench_enqueue(c: &mut Criterion) {
    let processor = BatchProcessor::new(
        BatchSettings {
            batch_size: 512,
            interval: Some(Duration::from_millis(10)),
        },
        Arc::new(|batch: Vec<String>| {
            black_box(batch);
        }),
    )
    .expect("spawn worker");

    c.bench_function("processor_enqueue", |b| {
        b.iter(|| processor.enqueue(black_box("unit".to_string())))
    });
}

fn bench_transform(c: &mut Criterion) {
    let config = HecConfig {
        host: Some("bench-host".into()),
        source: Some("bench".into()),
        ..test_config(50)
    };
    let record = HecLogRecord::new("bench.transform", HecLevel::Info, "benchmark message");
    let raw = RawPayloadTransformer::new();
    let json = JsonPayloadTransformer::new();

    c.bench_function("transform_raw", |b| {
        b.iter(|| raw.transform(black_box(&record), &config))
    });
    c.bench_function("transform_json", |b| {
        b.iter(|| json.transform(black_box(&record), &config))
    });
}

fn bench_logger(c: &mut Criterion) {
    let monitor = Arc::new(ConfigMonitor::new(test_config(256)).expect("config"));
    let provider = HecLoggerProvider::with_transport_factory(
        monitor,
        RawPayloadTransformer::new(),
        Arc::new(DiscardFactory),
    )
    .expect("provider");
    let logger = provider.create_logger("bench.logger");

    c.bench_function("logger_info", |b| {
        b.iter(|| logger.info(black_box("benchmark message")))
    });
}

criterion_group!(benches, bench_enqueue, bench_transform, bench_logger);
criterion_main!(benches);
