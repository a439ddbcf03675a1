//! Batch delivery for the raw and event endpoints.
//!
//! Delivery is best effort: a failed request is logged and the batch is
//! discarded. Nothing is retried or re-queued.

use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;

use super::Endpoint;
use super::client::{ClientManager, HecResponse, TransportError};
use super::url::raw_metadata_query;
use crate::processor::BatchSink;
use crate::rate_limited_warner::RateLimitedWarner;

/// Failure while delivering one batch.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("no active collector client")]
    Closed,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Join raw units with CRLF after trimming each one.
pub fn raw_body(batch: &[String]) -> String {
    batch
        .iter()
        .map(|unit| unit.trim())
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// Join serialized event documents with a single space.
pub fn json_body(batch: &[String]) -> String {
    batch.join(" ")
}

/// Human description of a collector status code.
pub fn describe_status(status: u16) -> &'static str {
    match status {
        200 => "Request completed successfully.",
        201 => "Create request completed successfully.",
        400 => "Request error. See response body for details.",
        401 => "Authentication failure, invalid access credentials.",
        402 => "In-use Splunk Enterprise license disables this feature.",
        403 => "Insufficient permission.",
        404 => "Requested endpoint does not exist.",
        409 => "Invalid operation for this endpoint. See response body for details.",
        500 => "Unspecified internal server error. See response body for details.",
        503 => "Feature is disabled in configuration file.",
        _ => "Unknown status code.",
    }
}

/// Sends batches through the active client of a [`ClientManager`].
pub struct HecDelivery {
    manager: Arc<ClientManager>,
    warner: RateLimitedWarner,
}

impl HecDelivery {
    pub fn new(manager: Arc<ClientManager>) -> Self {
        Self {
            manager,
            warner: RateLimitedWarner::default(),
        }
    }

    /// POST `batch` as one request. The client lock is held for the call.
    pub fn send(&self, batch: &[String]) -> Result<HecResponse, DeliveryError> {
        let endpoint = self.manager.endpoint();
        let outcome = self.manager.with_client(|client, config| match endpoint {
            Endpoint::Raw => {
                let query = raw_metadata_query(config, client.base_url());
                client.post(&query, endpoint.content_type(), &raw_body(batch))
            }
            Endpoint::Json => client.post("", endpoint.content_type(), &json_body(batch)),
        });
        match outcome {
            Some(result) => Ok(result?),
            None => Err(DeliveryError::Closed),
        }
    }

    fn report(&self, batch_len: usize, outcome: Result<HecResponse, DeliveryError>) {
        let label = self.manager.endpoint().label();
        match outcome {
            Ok(response) => {
                debug!(
                    "Splunk HEC {label} status {}: {}",
                    response.status,
                    describe_status(response.status)
                );
                if !response.body.is_empty() {
                    debug!("Splunk HEC {label} body: {}", response.body);
                }
                if !response.is_success() {
                    warn!(
                        "Splunk HEC {label} rejected a batch of {batch_len} with status {}: {}",
                        response.status,
                        describe_status(response.status)
                    );
                }
            }
            Err(err) => {
                warn!("Splunk HEC {label} delivery failed: {err}");
                for _ in 0..batch_len {
                    self.warner.record_drop();
                }
                self.warner.warn_if_due(|count| {
                    warn!("Splunk HEC {label} dropped {count} events after delivery failures");
                });
            }
        }
    }

    /// Events lost to transport failures so far.
    pub fn dropped(&self) -> u64 {
        self.warner.total()
    }
}

impl BatchSink for HecDelivery {
    fn deliver(&self, batch: Vec<String>) {
        let outcome = self.send(&batch);
        self.report(batch.len(), outcome);
    }
}
