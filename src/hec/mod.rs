//! Splunk HTTP Event Collector wire protocol.
//!
//! This module owns everything between a finished batch and the network:
//!
//! - [`url`] builds the client base address and the raw metadata query.
//! - [`client`] assembles headers, owns the active [`HecClient`], and swaps it
//!   on reload under the same lock that deliveries hold.
//! - [`delivery`] turns a batch into one POST for either endpoint.
//!
//! # Endpoints
//!
//! - **Raw** (`/raw`): newline-separated plain text; metadata travels in the
//!   query string.
//! - **Event** (`/event`): space-separated JSON documents; metadata travels in
//!   each document.

pub mod client;
pub mod delivery;
pub mod url;
mod url_encoding;


pub use client::{
    ClientError, ClientManager, ClientSpec, HecClient, HecResponse, HecTransport,
    TransportError, TransportFactory, UreqTransportFactory,
};
pub use delivery::{DeliveryError, HecDelivery, describe_status};

/// Collector endpoint variant, fixed for a provider's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `services/collector/raw`
    Raw,
    /// `services/collector/event`
    Json,
}

impl Endpoint {
    /// Default path segment appended to the collector URL.
    pub const fn path_segment(self) -> &'static str {
        match self {
            Endpoint::Raw => "raw",
            Endpoint::Json => "event",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Endpoint::Raw => "text/plain; charset=utf-8",
            Endpoint::Json => "application/json",
        }
    }

    /// Label used in diagnostics.
    pub const fn label(self) -> &'static str {
        match self {
            Endpoint::Raw => "raw",
            Endpoint::Json => "json",
        }
    }
}
