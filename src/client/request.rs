use super::*;

impl<T: Transport> ApiClient<T> {
    /// Sends an authenticated request and decodes the XML answer.
    ///
    /// The API key is resolved first if needed and appended as `key`.
    pub async fn request(
        &self,
        params: Vec<(String, String)>,
        method: Method,
        body: Option<String>,
    ) -> Result<NormalizedResponse, PanosError> {
        let params = self.authorize(params).await?;
        let request = ApiRequest {
            method,
            params,
            body,
        };

        debug!(
            "API request: {} - {}",
            request.request_type().unwrap_or("N/A"),
            request.command().unwrap_or("N/A")
        );
        let response = self.dispatch(request).await?;
        debug!("API response status: {}", response.status);

        Ok(response)
    }

    /// Runs an operational command, optionally forwarded to `target`.
    pub async fn op_command(
        &self,
        cmd: &str,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        let mut params = params(&[("type", "op"), ("cmd", cmd)]);
        push_target(&mut params, target);
        self.request(params, Method::Get, None).await
    }

    /// Sends a request without touching the key and decodes the answer.
    pub(super) async fn dispatch(
        &self,
        request: ApiRequest,
    ) -> Result<NormalizedResponse, PanosError> {
        let raw = self.transport.send(request).await?;

        if !(200..300).contains(&raw.status) {
            return Err(PanosError::Http {
                status: raw.status,
                reason: raw.reason,
            });
        }

        parse_response(&raw.body)
    }
}

/// Appends the routing target for manager-forwarded requests.
pub(super) fn push_target(params: &mut Vec<(String, String)>, target: Option<&str>) {
    if let Some(target) = target.filter(|t| !t.is_empty()) {
        params.push(("target".to_string(), target.to_string()));
    }
}
