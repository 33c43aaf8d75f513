use super::*;

use reqwest::header::CONTENT_TYPE;

/// HTTPS transport to `https://{host}:{port}/api/`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    host: String,
}

impl HttpTransport {
    /// Builds the HTTP client with the configured timeout and certificate policy.
    ///
    /// With `validate_certs` off, both the trust chain and the hostname checks
    /// are skipped.
    pub fn new(config: &ClientConfig) -> Result<Self, PanosError> {
        if !config.validate_certs {
            warn!(
                "Certificate validation disabled for {}:{}",
                config.host, config.port
            );
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.validate_certs)
            .danger_accept_invalid_hostnames(!config.validate_certs)
            .build()
            .map_err(|e| {
                PanosError::InvalidConfig(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: config.api_url(),
            host: config.host.clone(),
        })
    }

    // The request URL carries the API key, so it is stripped from errors.
    fn connection_error(&self, err: reqwest::Error) -> PanosError {
        PanosError::Connection {
            host: self.host.clone(),
            reason: err.without_url().to_string(),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, PanosError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, &self.base_url)
            .query(&request.params);
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.connection_error(e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.connection_error(e))?;

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
