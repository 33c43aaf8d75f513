//! Client configuration and defaults.
//!
//! [`ClientConfig`] collects everything the client needs to reach the
//! manager: address, credentials, timeouts and the certificate policy. It can
//! be built in code or loaded from a JSON or YAML document, which is how
//! automation inventories usually carry it.

use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PanosError;

/// Default HTTPS port of the management interface.
pub const DEFAULT_PORT: u16 = 443;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default delay between two job status polls, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default ceiling for waiting on a job, in seconds.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 1800;

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_job_timeout_secs() -> u64 {
    DEFAULT_JOB_TIMEOUT_SECS
}

fn default_validate_certs() -> bool {
    true
}

/// Connection and authentication settings for one manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClientConfig {
    /// Manager hostname or IPv4 address.
    pub host: String,

    /// HTTPS port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// API user, used only when `api_key` is absent.
    #[serde(default)]
    pub username: Option<String>,

    /// API password, used only when `api_key` is absent.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Pre-generated API key.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Verify the server certificate chain and hostname.
    ///
    /// Turning this off is meant for lab appliances with self-signed
    /// certificates.
    #[serde(default = "default_validate_certs")]
    pub validate_certs: bool,

    /// Delay between job status polls in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Maximum time to wait on a job in seconds.
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,
}

impl ClientConfig {
    /// Creates a configuration for `host` with every other field defaulted.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            password: None,
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            validate_certs: true,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            job_timeout_secs: DEFAULT_JOB_TIMEOUT_SECS,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets username/password used for the key exchange.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_validate_certs(mut self, validate_certs: bool) -> Self {
        self.validate_certs = validate_certs;
        self
    }

    /// Sets poll interval and ceiling used by the job poller.
    pub fn with_job_polling(mut self, poll_interval: Duration, job_timeout: Duration) -> Self {
        self.poll_interval_secs = poll_interval.as_secs();
        self.job_timeout_secs = job_timeout.as_secs();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    /// Base URL of the XML API endpoint.
    pub fn api_url(&self) -> String {
        format!("https://{}:{}/api/", self.host, self.port)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, PanosError> {
        parse_json(text)
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, PanosError> {
        parse_yaml(text)
    }

    /// Loads a configuration file; `.json` is read as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PanosError> {
        load_document(path.as_ref())
    }

    /// Checks cross-field invariants.
    ///
    /// Credentials are not checked here: a missing key is reported lazily by
    /// the client on first use.
    pub fn validate(&self) -> Result<(), PanosError> {
        if !is_valid_host(&self.host) {
            return Err(PanosError::InvalidConfig(format!(
                "host '{}' is neither an IPv4 address nor a hostname",
                self.host
            )));
        }
        if self.port == 0 {
            return Err(PanosError::InvalidConfig("port must be non-zero".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(PanosError::InvalidConfig(
                "timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.job_timeout_secs == 0 {
            return Err(PanosError::InvalidConfig(
                "job_timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Returns true for a dotted IPv4 address or an RFC 1123 hostname.
pub fn is_valid_host(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if value.parse::<Ipv4Addr>().is_ok() {
        return true;
    }
    if value.len() > 253 {
        return false;
    }
    value.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

pub(crate) fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, PanosError> {
    serde_json::from_str(text).map_err(|e| PanosError::ConfigParse(e.to_string()))
}

pub(crate) fn parse_yaml<T: DeserializeOwned>(text: &str) -> Result<T, PanosError> {
    serde_yaml::from_str(text).map_err(|e| PanosError::ConfigParse(e.to_string()))
}

pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, PanosError> {
    let text = std::fs::read_to_string(path).map_err(|source| PanosError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        parse_json(&text)
    } else {
        parse_yaml(&text)
    }
}
