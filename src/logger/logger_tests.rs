//! Unit tests for HecLogger.

use super::*;
use crate::processor::BatchSettings;
use crate::scope::{NullScopeProvider, ThreadLocalScopeProvider};
use crate::test_utils::test_config;
use crate::transform::{JsonPayloadTransformer, RawPayloadTransformer};
use crossbeam_channel::{Receiver, unbounded};
use rstest::rstest;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    logger: HecLogger,
    processor: Arc<BatchProcessor>,
    rx: Receiver<Vec<String>>,
}

impl Harness {
    fn units(&self) -> Vec<String> {
        assert!(self.processor.flush(WAIT), "flush timed out");
        self.rx.try_iter().flatten().collect()
    }
}

fn harness(config: HecConfig, transformer: SharedTransformer) -> Harness {
    let (tx, rx) = unbounded();
    let processor = Arc::new(
        BatchProcessor::new(
            BatchSettings {
                batch_size: 100,
                interval: None,
            },
            Arc::new(move |batch: Vec<String>| {
                let _ = tx.send(batch);
            }),
        )
        .expect("spawn worker"),
    );
    let logger = HecLogger::new(
        "app.orders",
        Arc::new(config),
        Arc::new(ThreadLocalScopeProvider::new()),
        transformer,
        Arc::clone(&processor),
    );
    Harness {
        logger,
        processor,
        rx,
    }
}

fn raw_harness(config: HecConfig) -> Harness {
    harness(config, RawPayloadTransformer::new().into())
}

#[test]
fn log_enqueues_transformed_unit() {
    let h = raw_harness(test_config(100));
    h.logger
        .log(HecLevel::Info, 7, "order placed", None)
        .expect("log");

    let units = h.units();
    assert_eq!(units.len(), 1);
    assert!(units[0].contains(": INFO: app.orders[7]\n"));
    assert!(units[0].ends_with("order placed\n"));
}

#[rstest]
#[case(HecLevel::Trace, HecLevel::Trace, true)]
#[case(HecLevel::Warn, HecLevel::Trace, false)]
#[case(HecLevel::Trace, HecLevel::Warn, false)]
#[case(HecLevel::Info, HecLevel::Info, true)]
fn level_filter_combines_logger_and_config(
    #[case] logger_level: HecLevel,
    #[case] min_level: HecLevel,
    #[case] info_enabled: bool,
) {
    let config = HecConfig {
        min_level,
        ..test_config(100)
    };
    let h = raw_harness(config);
    h.logger.set_level(logger_level);

    assert_eq!(h.logger.is_enabled(HecLevel::Info), info_enabled);
    h.logger.info("maybe").expect("log");
    assert_eq!(h.units().len(), usize::from(info_enabled));
}

#[test]
fn empty_message_without_exception_is_skipped() {
    let h = raw_harness(test_config(100));
    h.logger
        .log(HecLevel::Error, 0, "", None)
        .expect("log");
    assert!(h.units().is_empty());
}

#[test]
fn exception_without_message_is_logged() {
    let h = raw_harness(test_config(100));
    let err = std::io::Error::other("disk full");
    h.logger
        .log_error(HecLevel::Error, "", &err)
        .expect("log");

    let units = h.units();
    assert_eq!(units.len(), 1);
    assert!(units[0].ends_with("disk full\n"));
}

#[test]
fn scopes_are_captured_only_when_enabled() {
    let h = raw_harness(test_config(100));
    let _scope = h.logger.begin_scope("batch 9");
    h.logger.info("without").expect("log");

    h.logger.update_options(Arc::new(HecConfig {
        include_scopes: true,
        ..test_config(100)
    }));
    h.logger.info("with").expect("log");

    let units = h.units();
    assert!(!units[0].contains("=> batch 9"));
    assert!(units[1].contains("=> batch 9"));
}

#[test]
fn scope_fields_reach_json_fields() {
    let config = HecConfig {
        include_scopes: true,
        ..test_config(100)
    };
    let h = harness(config, JsonPayloadTransformer::new().into());
    {
        let _scope = h.logger.begin_scope([("order", "A-1")]);
        h.logger.warn("slow").expect("log");
    }
    h.logger.warn("after").expect("log");

    let units = h.units();
    let first: serde_json::Value = serde_json::from_str(&units[0]).expect("json");
    let second: serde_json::Value = serde_json::from_str(&units[1]).expect("json");
    assert_eq!(first["fields"]["order"], "A-1");
    assert!(second.get("fields").is_none());
}

#[test]
fn replacing_scope_provider_discards_old_stack() {
    let h = raw_harness(HecConfig {
        include_scopes: true,
        ..test_config(100)
    });
    let _scope = h.logger.begin_scope("old");
    h.logger.set_scope_provider(Arc::new(NullScopeProvider));
    h.logger.info("msg").expect("log");
    assert!(!h.units()[0].contains("=> old"));
}

#[test]
fn timestamp_format_comes_from_options() {
    let h = raw_harness(HecConfig {
        timestamp_format: Some("%Y".to_string()),
        ..test_config(100)
    });
    h.logger.info("msg").expect("log");
    let unit = h.units().remove(0);
    let year = unit.split(':').next().expect("timestamp");
    assert_eq!(year.len(), 4);
    assert!(year.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn logging_after_shutdown_reports_closed() {
    let h = raw_harness(test_config(100));
    h.processor.shutdown();
    let err = h.logger.info("late").expect_err("closed");
    assert!(matches!(err, LogError::Closed));
    assert_eq!(h.processor.dropped(), 1);
}

#[test]
fn convenience_methods_use_matching_level() {
    let h = raw_harness(test_config(100));
    h.logger.critical("boom").expect("log");
    h.logger.trace("detail").expect("log");
    let units = h.units();
    assert!(units[0].contains(": CRITICAL: "));
    assert!(units[1].contains(": TRACE: "));
}
