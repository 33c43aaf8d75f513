//! Error types for manager API access, response decoding and job tracking.
//!
//! Every failure the crate can report is a variant of [`PanosError`]. Each
//! variant belongs to an [`ErrorKind`] and carries a stable machine-readable
//! code (see [`PanosError::code`]) so automation can branch on it without
//! parsing messages.

use std::path::PathBuf;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Credential resolution failed.
    Auth,
    /// Transport-level failure.
    Network,
    /// The appliance answered with something we cannot decode.
    Protocol,
    /// Device directory query failed.
    Lookup,
    /// Job polling exceeded its budget.
    Timeout,
    /// Job polling was cancelled by the caller.
    Cancelled,
    /// A version string could not be parsed by the strict comparator.
    Validation,
    /// Client configuration is missing or invalid.
    Config,
}

/// Errors that can occur while talking to the manager.
#[derive(Error, Debug)]
pub enum PanosError {
    /// Neither an API key nor a username/password pair was configured.
    #[error("either api_key or username/password must be provided")]
    AuthMissing,

    /// The key exchange request was rejected by the appliance.
    #[error("failed to generate API key: {0}")]
    KeygenFailed(String),

    /// The key exchange succeeded but the response carried no key.
    #[error("API key not found in keygen response")]
    KeygenNoKey,

    /// The HTTPS request could not be completed.
    #[error("connection error to {host}: {reason}")]
    Connection { host: String, reason: String },

    /// The appliance answered with a non-2xx HTTP status.
    #[error("HTTP error {status}: {reason}")]
    Http { status: u16, reason: String },

    /// The response body is not well-formed XML.
    ///
    /// `snippet` holds at most the first 500 characters of the payload.
    #[error("failed to parse XML response: {reason}")]
    XmlParse { reason: String, snippet: String },

    /// A replayed exchange did not match the request being sent.
    #[error("replay mismatch: {0}")]
    ReplayMismatch(String),

    /// The managed-device list could not be retrieved.
    #[error("failed to retrieve managed devices: {0}")]
    DeviceLookupFailed(String),

    /// No managed device matched the query.
    #[error("no managed device with {field} '{value}'")]
    DeviceNotFound { field: &'static str, value: String },

    /// The job did not reach a terminal state within the timeout.
    #[error("job {job_id} timed out after {}s", timeout.as_secs())]
    JobTimeout {
        job_id: String,
        elapsed: Duration,
        timeout: Duration,
    },

    /// Job polling was cancelled before the job finished.
    #[error("waiting for job {job_id} was cancelled")]
    JobCancelled { job_id: String, elapsed: Duration },

    /// A version string failed strict parsing.
    #[error("invalid version format: '{left}' vs '{right}'")]
    InvalidVersion { left: String, right: String },

    /// Configuration values are inconsistent or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration document could not be read.
    #[error("failed to read {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration document could not be deserialized.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),
}

impl PanosError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PanosError::AuthMissing | PanosError::KeygenFailed(_) | PanosError::KeygenNoKey => {
                ErrorKind::Auth
            }
            PanosError::Connection { .. } | PanosError::Http { .. } => ErrorKind::Network,
            PanosError::XmlParse { .. } | PanosError::ReplayMismatch(_) => ErrorKind::Protocol,
            PanosError::DeviceLookupFailed(_) | PanosError::DeviceNotFound { .. } => {
                ErrorKind::Lookup
            }
            PanosError::JobTimeout { .. } => ErrorKind::Timeout,
            PanosError::JobCancelled { .. } => ErrorKind::Cancelled,
            PanosError::InvalidVersion { .. } => ErrorKind::Validation,
            PanosError::InvalidConfig(_)
            | PanosError::ConfigRead { .. }
            | PanosError::ConfigParse(_) => ErrorKind::Config,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            PanosError::AuthMissing => "AUTH_MISSING",
            PanosError::KeygenFailed(_) => "KEYGEN_FAILED",
            PanosError::KeygenNoKey => "KEYGEN_NO_KEY",
            PanosError::Connection { .. } => "CONNECTION_ERROR",
            PanosError::Http { .. } => "HTTP_ERROR",
            PanosError::XmlParse { .. } => "XML_PARSE_ERROR",
            PanosError::ReplayMismatch(_) => "REPLAY_MISMATCH",
            PanosError::DeviceLookupFailed(_) => "DEVICE_LOOKUP_FAILED",
            PanosError::DeviceNotFound { .. } => "DEVICE_NOT_FOUND",
            PanosError::JobTimeout { .. } => "JOB_TIMEOUT",
            PanosError::JobCancelled { .. } => "JOB_CANCELLED",
            PanosError::InvalidVersion { .. } => "INVALID_VERSION",
            PanosError::InvalidConfig(_) => "CONFIG_INVALID",
            PanosError::ConfigRead { .. } => "CONFIG_READ",
            PanosError::ConfigParse(_) => "CONFIG_PARSE",
        }
    }

    /// Structured diagnostic details, `{}` when the variant has none.
    pub fn details(&self) -> Value {
        match self {
            PanosError::Connection { host, .. } => json!({ "host": host }),
            PanosError::Http { status, reason } => json!({ "code": status, "reason": reason }),
            PanosError::XmlParse { snippet, .. } => json!({ "raw_response": snippet }),
            PanosError::DeviceNotFound { field, value } => json!({ *field: value }),
            PanosError::JobTimeout {
                job_id, elapsed, ..
            }
            | PanosError::JobCancelled { job_id, elapsed } => json!({
                "job_id": job_id,
                "elapsed": elapsed.as_secs_f64(),
            }),
            PanosError::InvalidVersion { left, right } => json!({
                "version1": left,
                "version2": right,
            }),
            PanosError::ConfigRead { path, .. } => json!({ "path": path.display().to_string() }),
            _ => json!({}),
        }
    }

    /// Serializable summary `{message, error_code, details}`.
    pub fn to_value(&self) -> Value {
        json!({
            "message": self.to_string(),
            "error_code": self.code(),
            "details": self.details(),
        })
    }
}
