//! XML API client for the manager and the devices behind it.
//!
//! [`ApiClient`] owns one configuration and one API key slot. The key is
//! resolved lazily on the first request, either from the configuration or by
//! a key exchange with username and password, then reused for every later
//! request of the same client. Concurrent first requests share a single key
//! exchange.
//!
//! # Main Components
//!
//! - [`ApiClient`] - Authentication, request execution and domain operations
//! - [`Transport`] - Seam between the client and the wire
//! - [`HttpTransport`] - HTTPS transport built on reqwest
//! - [`ReplayTransport`] - Replays recorded exchanges without a network
//! - [`DeviceSummary`] / [`ConnectivityReport`] - Device directory records

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use log::{debug, info, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use crate::config::ClientConfig;
use crate::error::PanosError;
use crate::filters::escape_xml;
use crate::xml::{ABSENT, NormalizedResponse, XmlValue, parse_response};

pub use auth::key_fingerprint;
pub use operations::RUNNING_CONFIG;
pub use replay::{RecordedExchange, ReplayTransport};
pub use transport::HttpTransport;

/// HTTP method of an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// One request to the `/api/` endpoint, before transport encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    /// Query parameters in insertion order.
    pub params: Vec<(String, String)>,
    /// Form-urlencoded body for POST requests.
    pub body: Option<String>,
}

impl ApiRequest {
    /// Value of the first query parameter called `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// The request `type` parameter (`op`, `export`, `keygen`, ...).
    pub fn request_type(&self) -> Option<&str> {
        self.param("type")
    }

    /// The command-like parameter of the request: `cmd`, `category` or `action`.
    pub fn command(&self) -> Option<&str> {
        self.param("cmd")
            .or_else(|| self.param("category"))
            .or_else(|| self.param("action"))
    }
}

/// Undecoded HTTP answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

/// Moves an [`ApiRequest`] to the appliance and brings back the raw answer.
///
/// Implementations map transport failures to
/// [`PanosError::Connection`]. HTTP status handling and XML decoding are done
/// by the client.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<RawResponse, PanosError>> + Send;
}

/// Authentication state of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No key yet, or a key exchange is still in flight.
    Unauthenticated,
    /// A key is cached and attached to every request.
    Authenticated,
}

/// API client bound to one manager.
pub struct ApiClient<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
    api_key: OnceCell<String>,
}

/// Summary of one managed device from the manager's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DeviceSummary {
    pub hostname: String,
    /// Serial number, used as routing target for forwarded commands.
    pub serial: String,
    pub ip_address: String,
    pub model: String,
    pub sw_version: String,
    /// Whether the device currently holds a connection to the manager.
    pub connected: bool,
    /// HA state reported by the manager, `standalone` when absent.
    pub ha_state: String,
    /// Serial of the HA peer, empty when absent.
    pub ha_peer_serial: String,
    /// The directory entry the summary was built from.
    pub raw: XmlValue,
}

/// Outcome of a connectivity probe. Never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConnectivityReport {
    pub connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable error code when the probe failed with a client error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Builds an owned parameter list from borrowed pairs.
fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

mod auth;
mod devices;
mod operations;
mod replay;
mod request;
mod transport;
