//! Network client construction and lifecycle.
//!
//! [`ClientManager`] holds the active [`HecClient`] together with the
//! configuration snapshot it was built from. Deliveries run inside
//! [`ClientManager::with_client`], which holds the manager's lock for the whole
//! send; [`ClientManager::reload`] builds the replacement outside that lock,
//! swaps under it, and drops the previous client only after releasing it. A
//! client is therefore never torn down while a send is still using it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};
use uuid::Uuid;

use super::Endpoint;
use super::url::collector_url;
use crate::config::{ChannelIdMode, HecConfig};

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const CHANNEL_HEADER: &str = "x-splunk-request-channel";

/// Failure while constructing a transport.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to initialise TLS: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// Failure while performing a request.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("failed to read response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Status and body returned by the collector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HecResponse {
    pub status: u16,
    pub body: String,
}

impl HecResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fixed properties of one client, derived from a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientSpec {
    pub base_url: String,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
    pub channel_id: Uuid,
}

impl ClientSpec {
    /// Assemble the base address and default headers for `config`.
    ///
    /// Each call draws a fresh channel identifier.
    pub fn from_config(config: &HecConfig, segment: &str) -> Self {
        let channel_id = Uuid::new_v4();
        let base_url = collector_url(config, segment, &channel_id.to_string());

        let mut headers = vec![(
            AUTHORIZATION_HEADER.to_string(),
            format!("Splunk {}", config.auth_token),
        )];
        if config.channel_id == ChannelIdMode::Header {
            headers.push((CHANNEL_HEADER.to_string(), channel_id.to_string()));
        }
        headers.extend(
            config
                .custom_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Self {
            base_url,
            headers,
            timeout: config.timeout(),
            channel_id,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Blocking HTTP POST capability.
pub trait HecTransport: Send + Sync {
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        content_type: &str,
        body: &str,
    ) -> Result<HecResponse, TransportError>;
}

/// Builds a transport for each new client.
pub trait TransportFactory: Send + Sync {
    fn build(&self, spec: &ClientSpec) -> Result<Box<dyn HecTransport>, ClientError>;
}

/// Production factory backed by a `ureq` agent over native TLS.
#[derive(Debug, Default, Clone, Copy)]
pub struct UreqTransportFactory;

impl TransportFactory for UreqTransportFactory {
    fn build(&self, spec: &ClientSpec) -> Result<Box<dyn HecTransport>, ClientError> {
        let connector = native_tls::TlsConnector::new()?;
        let agent = AgentBuilder::new()
            .timeout(spec.timeout)
            .tls_connector(Arc::new(connector))
            .build();
        Ok(Box::new(UreqTransport { agent }))
    }
}

struct UreqTransport {
    agent: Agent,
}

impl HecTransport for UreqTransport {
    fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        content_type: &str,
        body: &str,
    ) -> Result<HecResponse, TransportError> {
        let mut req = self.agent.post(url);
        for (key, value) in headers {
            req = req.set(key, value);
        }
        req = req.set("Content-Type", content_type);

        let response = match req.send_string(body) {
            Ok(response) => response,
            // Non-2xx statuses are reported, not treated as transport failures.
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(err)) => {
                return Err(TransportError::Request {
                    url: url.to_string(),
                    reason: err.to_string(),
                });
            }
        };
        let status = response.status();
        let body = response
            .into_string()
            .map_err(|source| TransportError::Body {
                url: url.to_string(),
                source,
            })?;
        Ok(HecResponse { status, body })
    }
}

/// A built client: fixed address and headers plus the transport.
pub struct HecClient {
    spec: ClientSpec,
    transport: Box<dyn HecTransport>,
}

impl HecClient {
    pub fn new(spec: ClientSpec, factory: &dyn TransportFactory) -> Result<Self, ClientError> {
        let transport = factory.build(&spec)?;
        Ok(Self { spec, transport })
    }

    pub fn base_url(&self) -> &str {
        &self.spec.base_url
    }

    pub fn spec(&self) -> &ClientSpec {
        &self.spec
    }

    /// POST `body` to the base address followed by `path_and_query`.
    pub fn post(
        &self,
        path_and_query: &str,
        content_type: &str,
        body: &str,
    ) -> Result<HecResponse, TransportError> {
        let url = format!("{}{}", self.spec.base_url, path_and_query);
        self.transport
            .post(&url, &self.spec.headers, content_type, body)
    }
}

impl fmt::Debug for HecClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HecClient")
            .field("base_url", &self.spec.base_url)
            .field("channel_id", &self.spec.channel_id)
            .finish_non_exhaustive()
    }
}

struct Active {
    client: HecClient,
    config: Arc<HecConfig>,
}

/// Owner of the active client.
pub struct ClientManager {
    endpoint: Endpoint,
    factory: Arc<dyn TransportFactory>,
    active: Mutex<Option<Active>>,
}

impl ClientManager {
    /// Create the manager and build the first client from `config`.
    pub fn new(
        endpoint: Endpoint,
        factory: Arc<dyn TransportFactory>,
        config: Arc<HecConfig>,
    ) -> Result<Self, ClientError> {
        let manager = Self {
            endpoint,
            factory,
            active: Mutex::new(None),
        };
        manager.reload(config)?;
        Ok(manager)
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn segment<'a>(&self, config: &'a HecConfig) -> &'a str {
        config
            .endpoint_path
            .as_deref()
            .unwrap_or(self.endpoint.path_segment())
    }

    /// Build a client from `config` and make it the active one.
    ///
    /// On error the previous client stays active.
    pub fn reload(&self, config: Arc<HecConfig>) -> Result<(), ClientError> {
        let spec = ClientSpec::from_config(&config, self.segment(&config));
        let client = HecClient::new(spec, self.factory.as_ref())?;
        debug!(
            "HEC {} client rebuilt for {}",
            self.endpoint.label(),
            client.base_url()
        );
        let previous = {
            let mut active = self.active.lock();
            active.replace(Active { client, config })
        };
        // Dropped outside the lock, after any in-flight send has released it.
        drop(previous);
        Ok(())
    }

    /// Run `f` against the active client and the snapshot it was built from,
    /// holding the swap lock for the duration. Returns `None` once closed.
    pub fn with_client<R>(&self, f: impl FnOnce(&HecClient, &HecConfig) -> R) -> Option<R> {
        let active = self.active.lock();
        active
            .as_ref()
            .map(|active| f(&active.client, &active.config))
    }

    pub fn current_spec(&self) -> Option<ClientSpec> {
        self.with_client(|client, _| client.spec().clone())
    }

    /// Drop the active client. Later deliveries find no client.
    pub fn close(&self) {
        let previous = self.active.lock().take();
        drop(previous);
    }
}

impl fmt::Debug for ClientManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientManager")
            .field("endpoint", &self.endpoint)
            .field(
                "base_url",
                &self.active.try_lock().and_then(|active| {
                    active
                        .as_ref()
                        .map(|a| a.client.base_url().to_string())
                }),
            )
            .finish()
    }
}
