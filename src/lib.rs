//! # rpanos - Firewall management-plane API client
//!
//! `rpanos` talks to firewall appliances through their XML API, either
//! directly or forwarded by a central manager to the devices it manages. It
//! covers the pieces an upgrade workflow needs: authenticated requests with
//! lazy API-key acquisition, device lookup in the manager's directory,
//! release version ordering, upgrade-path validation against a compatibility
//! matrix, polling of asynchronous jobs and HA state extraction.
//!
//! ## Features
//!
//! - **Lazy authentication**: the API key is exchanged once per client and reused
//! - **Normalized responses**: every XML answer becomes a [`xml::NormalizedResponse`]
//! - **Manager routing**: each operation accepts an optional device serial as target
//! - **Job tracking**: time-bounded, cancellable polling of downloads, installs and reboots
//! - **Offline replay**: [`client::ReplayTransport`] answers from recorded exchanges
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rpanos::client::ApiClient;
//! use rpanos::config::ClientConfig;
//! use rpanos::job::JobPoller;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("panorama.example.net")
//!         .with_credentials("admin", "secret");
//!     let client = ApiClient::new(config)?;
//!
//!     let device = client.get_device_by_name("fw-edge-01").await?;
//!     let response = client
//!         .download_software("11.1.2", Some(&device.serial), false)
//!         .await?;
//!
//!     if let Some(job_id) = rpanos::filters::extract_job_id(&response) {
//!         let outcome = JobPoller::from_config(client.config())
//!             .wait(&client, &job_id, Some(&device.serial))
//!             .await?;
//!         println!("download finished: {}", outcome.result);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Main Components
//!
//! - [`client::ApiClient`] - Authentication, requests and device operations
//! - [`xml`] - Response envelope parsing and XML folding
//! - [`version`] / [`matrix`] - Version ordering and upgrade-path validation
//! - [`job::JobPoller`] - Job polling with timeout and cancellation
//! - [`ha`] - HA state snapshot and role predicates
//! - [`error::PanosError`] - Error type with stable error codes

pub mod client;
pub mod config;
pub mod error;
pub mod filters;
pub mod ha;
pub mod job;
pub mod matrix;
pub mod version;
pub mod xml;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::PanosError;
