use super::*;

fn default_status() -> u16 {
    200
}

fn default_reason() -> String {
    "OK".to_string()
}

/// One recorded request/response pair.
///
/// Requests are matched on their `type` parameter and, when recorded, on the
/// command (`cmd`, `category` or `action`) and routing target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecordedExchange {
    pub request_type: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default = "default_reason")]
    pub reason: String,
    #[serde(default)]
    pub body: String,
    /// Simulated transport failure; `body` and `status` are ignored when set.
    #[serde(default)]
    pub connection_error: Option<String>,
}

impl RecordedExchange {
    /// A successful HTTP exchange answering with `body`.
    pub fn new(request_type: &str, command: Option<&str>, body: &str) -> Self {
        Self {
            request_type: request_type.to_string(),
            command: command.map(str::to_string),
            target: None,
            status: default_status(),
            reason: default_reason(),
            body: body.to_string(),
            connection_error: None,
        }
    }

    /// An exchange that fails before any HTTP answer.
    pub fn connection_failure(request_type: &str, reason: &str) -> Self {
        Self {
            connection_error: Some(reason.to_string()),
            ..Self::new(request_type, None, "")
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_status(mut self, status: u16, reason: &str) -> Self {
        self.status = status;
        self.reason = reason.to_string();
        self
    }

    fn mismatch(&self, request: &ApiRequest) -> Option<String> {
        let request_type = request.request_type().unwrap_or_default();
        if !self.request_type.eq_ignore_ascii_case(request_type) {
            return Some(format!(
                "expected request type '{}', got '{}'",
                self.request_type, request_type
            ));
        }
        if let Some(command) = &self.command
            && request.command() != Some(command.as_str())
        {
            return Some(format!(
                "expected command '{}', got '{}'",
                command,
                request.command().unwrap_or_default()
            ));
        }
        if let Some(target) = &self.target
            && request.param("target") != Some(target.as_str())
        {
            return Some(format!(
                "expected target '{}', got '{}'",
                target,
                request.param("target").unwrap_or_default()
            ));
        }
        None
    }
}

/// Transport answering from a queue of recorded exchanges, in order.
///
/// Every request consumes the next exchange; a request that does not match
/// it fails with [`PanosError::ReplayMismatch`]. Sent requests are kept for
/// inspection.
#[derive(Debug, Default)]
pub struct ReplayTransport {
    exchanges: Mutex<VecDeque<RecordedExchange>>,
    sent: Mutex<Vec<ApiRequest>>,
}

impl ReplayTransport {
    pub fn new(exchanges: Vec<RecordedExchange>) -> Self {
        Self {
            exchanges: Mutex::new(exchanges.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Loads exchanges from JSON Lines, one [`RecordedExchange`] per line.
    ///
    /// Blank lines are skipped.
    pub fn from_jsonl(input: &str) -> Result<Self, PanosError> {
        let mut exchanges = Vec::new();
        for (idx, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let exchange: RecordedExchange = serde_json::from_str(line).map_err(|e| {
                PanosError::ConfigParse(format!("replay line {}: {e}", idx + 1))
            })?;
            exchanges.push(exchange);
        }
        Ok(Self::new(exchanges))
    }

    /// Serializes the pending exchanges back to JSON Lines.
    pub fn to_jsonl(&self) -> Result<String, PanosError> {
        let guard = self.lock_exchanges()?;
        let mut out = String::new();
        for exchange in guard.iter() {
            let line = serde_json::to_string(exchange)
                .map_err(|e| PanosError::ConfigParse(e.to_string()))?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out)
    }

    /// Number of exchanges not consumed yet.
    pub fn remaining(&self) -> usize {
        self.lock_exchanges().map(|guard| guard.len()).unwrap_or(0)
    }

    /// Requests sent so far, oldest first.
    pub fn requests(&self) -> Vec<ApiRequest> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock_exchanges(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, VecDeque<RecordedExchange>>, PanosError> {
        self.exchanges
            .lock()
            .map_err(|e| PanosError::ReplayMismatch(format!("replay lock error: {e}")))
    }

    fn next_exchange(&self, request: &ApiRequest) -> Result<RecordedExchange, PanosError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }

        let mut guard = self.lock_exchanges()?;
        let exchange = guard.pop_front().ok_or_else(|| {
            PanosError::ReplayMismatch(format!(
                "no recorded exchange left for request type '{}'",
                request.request_type().unwrap_or_default()
            ))
        })?;
        if let Some(reason) = exchange.mismatch(request) {
            return Err(PanosError::ReplayMismatch(reason));
        }
        Ok(exchange)
    }
}

impl Transport for ReplayTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, PanosError> {
        let exchange = self.next_exchange(&request)?;
        if let Some(reason) = exchange.connection_error {
            return Err(PanosError::Connection {
                host: "replay".to_string(),
                reason,
            });
        }
        Ok(RawResponse {
            status: exchange.status,
            reason: exchange.reason,
            body: exchange.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_request(cmd: &str) -> ApiRequest {
        ApiRequest {
            method: Method::Get,
            params: params(&[("type", "op"), ("cmd", cmd)]),
            body: None,
        }
    }

    #[tokio::test]
    async fn replays_in_order_and_records_requests() {
        let transport = ReplayTransport::new(vec![
            RecordedExchange::new("op", Some("<a/>"), "first"),
            RecordedExchange::new("op", Some("<b/>"), "second"),
        ]);
        let first = transport.send(op_request("<a/>")).await.expect("first");
        let second = transport.send(op_request("<b/>")).await.expect("second");
        assert_eq!(first.body, "first");
        assert_eq!(second.body, "second");
        assert_eq!(transport.remaining(), 0);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn wrong_command_is_a_mismatch() {
        let transport = ReplayTransport::new(vec![RecordedExchange::new("op", Some("<a/>"), "")]);
        let err = transport.send(op_request("<b/>")).await.expect_err("mismatch");
        assert!(matches!(err, PanosError::ReplayMismatch(_)));
        assert_eq!(err.code(), "REPLAY_MISMATCH");
    }

    #[tokio::test]
    async fn exhausted_replay_is_a_mismatch() {
        let transport = ReplayTransport::new(vec![]);
        let err = transport.send(op_request("<a/>")).await.expect_err("empty");
        assert!(matches!(err, PanosError::ReplayMismatch(_)));
    }

    #[test]
    fn jsonl_round_trip_keeps_defaults() {
        let input = r#"{"request_type":"op","command":"<a/>","body":"<response status=\"success\"/>"}

{"request_type":"keygen","connection_error":"refused"}
"#;
        let transport = ReplayTransport::from_jsonl(input).expect("parse jsonl");
        assert_eq!(transport.remaining(), 2);
        let restored = ReplayTransport::from_jsonl(&transport.to_jsonl().expect("encode"))
            .expect("restore");
        assert_eq!(restored.remaining(), 2);
    }

    #[test]
    fn bad_jsonl_line_reports_line_number() {
        let err = ReplayTransport::from_jsonl("{\"request_type\":\"op\"}\nnot json")
            .expect_err("bad line");
        assert!(err.to_string().contains("replay line 2"));
    }
}
