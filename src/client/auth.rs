use super::*;

/// Query parameter carrying the API key.
const KEY_PARAM: &str = "key";

impl ApiClient<HttpTransport> {
    /// Creates a client talking HTTPS to the configured manager.
    ///
    /// No request is made here; the API key is resolved on first use.
    pub fn new(config: ClientConfig) -> Result<Self, PanosError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> ApiClient<T> {
    /// Creates a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let api_key = OnceCell::new_with(config.api_key.clone().filter(|k| !k.is_empty()));
        Self {
            config,
            transport,
            api_key,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session_state(&self) -> SessionState {
        if self.api_key.initialized() {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }

    /// Returns the API key, running the key exchange if none is cached yet.
    ///
    /// Concurrent callers wait on the same exchange; a failed exchange leaves
    /// the slot empty so a later call tries again.
    pub async fn resolve_credential(&self) -> Result<&str, PanosError> {
        let key = self
            .api_key
            .get_or_try_init(|| self.generate_api_key())
            .await?;
        Ok(key.as_str())
    }

    async fn generate_api_key(&self) -> Result<String, PanosError> {
        // Empty settings count as absent.
        let (Some(user), Some(password)) = (
            self.config.username.as_deref().filter(|s| !s.is_empty()),
            self.config.password.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(PanosError::AuthMissing);
        };

        debug!("Generating API key for {}@{}", user, self.config.host);
        let request = ApiRequest {
            method: Method::Get,
            params: params(&[("type", "keygen"), ("user", user), ("password", password)]),
            body: None,
        };
        let response = self.dispatch(request).await?;

        if !response.success {
            return Err(PanosError::KeygenFailed(
                response.message_or("Unknown error").to_string(),
            ));
        }

        let key = response
            .data
            .get("key")
            .and_then(XmlValue::as_str)
            .filter(|key| !key.is_empty())
            .ok_or(PanosError::KeygenNoKey)?;

        info!(
            "API key generated successfully for {} (fingerprint {})",
            self.config.host,
            key_fingerprint(key)
        );
        Ok(key.to_string())
    }

    /// Attaches the API key to `params`.
    pub(super) async fn authorize(
        &self,
        mut params: Vec<(String, String)>,
    ) -> Result<Vec<(String, String)>, PanosError> {
        let key = self.resolve_credential().await?;
        params.retain(|(name, _)| name != KEY_PARAM);
        params.push((KEY_PARAM.to_string(), key.to_string()));
        Ok(params)
    }
}

/// Short SHA-256 fingerprint of a key, safe to log.
pub fn key_fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    digest[..6].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYGEN_OK: &str =
        r#"<response status="success"><result><key>LUFRPT1abc==</key></result></response>"#;

    fn keygen(body: &str) -> RecordedExchange {
        RecordedExchange::new("keygen", None, body)
    }

    fn credentials_config() -> ClientConfig {
        ClientConfig::new("panorama.lab").with_credentials("admin", "secret")
    }

    #[tokio::test]
    async fn preconfigured_key_skips_exchange() {
        let client = ApiClient::with_transport(
            ClientConfig::new("panorama.lab").with_api_key("PRESET"),
            ReplayTransport::new(vec![]),
        );
        assert_eq!(client.session_state(), SessionState::Authenticated);
        assert_eq!(client.resolve_credential().await.expect("key"), "PRESET");
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_fail_with_auth_missing() {
        let mut config = ClientConfig::new("panorama.lab");
        config.username = Some("admin".to_string());
        let client = ApiClient::with_transport(config, ReplayTransport::new(vec![]));
        let err = client.resolve_credential().await.expect_err("no password");
        assert_eq!(err.code(), "AUTH_MISSING");
        assert_eq!(client.session_state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn empty_api_key_falls_back_to_exchange() {
        let client = ApiClient::with_transport(
            credentials_config().with_api_key(""),
            ReplayTransport::new(vec![keygen(KEYGEN_OK)]),
        );
        assert_eq!(client.session_state(), SessionState::Unauthenticated);
        assert_eq!(client.resolve_credential().await.expect("key"), "LUFRPT1abc==");
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_password_is_auth_missing() {
        let client = ApiClient::with_transport(
            ClientConfig::new("panorama.lab").with_credentials("admin", ""),
            ReplayTransport::new(vec![]),
        );
        let err = client.resolve_credential().await.expect_err("empty password");
        assert_eq!(err.code(), "AUTH_MISSING");
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn exchange_caches_key_for_later_calls() {
        let client = ApiClient::with_transport(
            credentials_config(),
            ReplayTransport::new(vec![keygen(KEYGEN_OK)]),
        );
        assert_eq!(client.session_state(), SessionState::Unauthenticated);
        assert_eq!(client.resolve_credential().await.expect("key"), "LUFRPT1abc==");
        assert_eq!(client.resolve_credential().await.expect("key"), "LUFRPT1abc==");

        let requests = client.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].param("user"), Some("admin"));
        assert_eq!(requests[0].param("password"), Some("secret"));
        assert_eq!(requests[0].param("key"), None);
        assert_eq!(client.session_state(), SessionState::Authenticated);
    }

    #[tokio::test]
    async fn rejected_exchange_reports_appliance_message() {
        let client = ApiClient::with_transport(
            credentials_config(),
            ReplayTransport::new(vec![keygen(
                r#"<response status="error"><result><msg>Invalid Credential</msg></result></response>"#,
            )]),
        );
        let err = client.resolve_credential().await.expect_err("rejected");
        assert_eq!(err.code(), "KEYGEN_FAILED");
        assert!(err.to_string().contains("Invalid Credential"));
    }

    #[tokio::test]
    async fn exchange_without_key_fails() {
        let client = ApiClient::with_transport(
            credentials_config(),
            ReplayTransport::new(vec![keygen(
                r#"<response status="success"><result/></response>"#,
            )]),
        );
        let err = client.resolve_credential().await.expect_err("no key");
        assert_eq!(err.code(), "KEYGEN_NO_KEY");
    }

    #[tokio::test]
    async fn concurrent_first_requests_share_one_exchange() {
        let client = ApiClient::with_transport(
            credentials_config(),
            ReplayTransport::new(vec![keygen(KEYGEN_OK)]),
        );
        let (a, b) = tokio::join!(client.resolve_credential(), client.resolve_credential());
        assert_eq!(a.expect("first"), "LUFRPT1abc==");
        assert_eq!(b.expect("second"), "LUFRPT1abc==");
        assert_eq!(client.transport().requests().len(), 1);
    }

    #[test]
    fn fingerprint_is_short_and_stable() {
        let fp = key_fingerprint("LUFRPT1abc==");
        assert_eq!(fp.len(), 12);
        assert_eq!(fp, key_fingerprint("LUFRPT1abc=="));
        assert_ne!(fp, key_fingerprint("other"));
    }
}
