use super::*;

const ALL_DEVICES: &str = "<show><devices><all></all></devices></show>";

impl DeviceSummary {
    /// Builds a summary from one `devices/entry` element.
    pub fn from_entry(entry: &XmlValue) -> Self {
        let ha = entry.get("ha").unwrap_or(&ABSENT);
        Self {
            hostname: entry.str_or("hostname", "").to_string(),
            serial: entry_serial(entry).to_string(),
            ip_address: entry.str_or("ip-address", "").to_string(),
            model: entry.str_or("model", "").to_string(),
            sw_version: entry.str_or("sw-version", "").to_string(),
            connected: entry.str_or("connected", "no") == "yes",
            ha_state: ha.str_or("state", "standalone").to_string(),
            ha_peer_serial: ha
                .path(&["peer", "serial"])
                .and_then(XmlValue::as_str)
                .unwrap_or_default()
                .to_string(),
            raw: entry.clone(),
        }
    }
}

/// The `name` attribute of an entry, falling back to its `serial` child.
fn entry_serial(entry: &XmlValue) -> &str {
    entry
        .attribute("name")
        .unwrap_or_else(|| entry.str_or("serial", ""))
}

impl<T: Transport> ApiClient<T> {
    /// Lists every device known to the manager.
    pub async fn get_managed_devices(&self) -> Result<Vec<DeviceSummary>, PanosError> {
        let response = self.op_command(ALL_DEVICES, None).await?;
        if !response.success {
            return Err(PanosError::DeviceLookupFailed(
                response.message_or("Unknown error").to_string(),
            ));
        }

        let devices: Vec<DeviceSummary> = response
            .data
            .path(&["devices", "entry"])
            .unwrap_or(&ABSENT)
            .entries()
            .iter()
            .map(DeviceSummary::from_entry)
            .collect();
        debug!("Manager reports {} managed devices", devices.len());
        Ok(devices)
    }

    /// Finds a managed device by hostname, ignoring case.
    pub async fn get_device_by_name(&self, name: &str) -> Result<DeviceSummary, PanosError> {
        let wanted = name.to_lowercase();
        self.get_managed_devices()
            .await?
            .into_iter()
            .find(|device| device.hostname.to_lowercase() == wanted)
            .ok_or_else(|| PanosError::DeviceNotFound {
                field: "device_name",
                value: name.to_string(),
            })
    }

    /// Finds a managed device by exact serial number.
    pub async fn get_device_by_serial(&self, serial: &str) -> Result<DeviceSummary, PanosError> {
        self.get_managed_devices()
            .await?
            .into_iter()
            .find(|device| device.serial == serial)
            .ok_or_else(|| PanosError::DeviceNotFound {
                field: "serial",
                value: serial.to_string(),
            })
    }

    /// Probes a device with a system info query.
    ///
    /// Never fails: errors are folded into a disconnected report.
    pub async fn test_connectivity(&self, target: Option<&str>) -> ConnectivityReport {
        match self.get_system_info(target).await {
            Ok(response) if response.success => {
                let system = response.data.get("system").unwrap_or(&ABSENT);
                let field = |key: &str| Some(system.str_or(key, "").to_string());
                ConnectivityReport {
                    connected: true,
                    hostname: field("hostname"),
                    model: field("model"),
                    serial: field("serial"),
                    sw_version: field("sw-version"),
                    uptime: field("uptime"),
                    ..Default::default()
                }
            }
            Ok(response) => ConnectivityReport {
                error: Some(response.message_or("Unknown error").to_string()),
                ..Default::default()
            },
            Err(err) => {
                warn!("Connectivity check failed: {}", err);
                ConnectivityReport {
                    error: Some(err.to_string()),
                    error_code: Some(err.code().to_string()),
                    ..Default::default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICES: &str = r#"<response status="success"><result><devices>
        <entry name="007051000111">
          <hostname>FW-Edge-01</hostname>
          <ip-address>10.0.0.1</ip-address>
          <model>PA-3220</model>
          <sw-version>10.2.9-h1</sw-version>
          <connected>yes</connected>
          <ha><state>active</state><peer><serial>007051000112</serial></peer></ha>
        </entry>
        <entry>
          <serial>007051000113</serial>
          <hostname>fw-branch</hostname>
          <connected>no</connected>
        </entry>
      </devices></result></response>"#;

    const ONE_DEVICE: &str = r#"<response status="success"><result><devices>
        <entry name="0071"><hostname>solo</hostname></entry>
      </devices></result></response>"#;

    fn client(body: &str) -> ApiClient<ReplayTransport> {
        ApiClient::with_transport(
            ClientConfig::new("panorama.lab").with_api_key("KEY"),
            ReplayTransport::new(vec![RecordedExchange::new("op", Some(ALL_DEVICES), body)]),
        )
    }

    #[tokio::test]
    async fn summaries_fill_defaults() {
        let devices = client(DEVICES).get_managed_devices().await.expect("devices");
        assert_eq!(devices.len(), 2);

        let edge = &devices[0];
        assert_eq!(edge.serial, "007051000111");
        assert_eq!(edge.ip_address, "10.0.0.1");
        assert!(edge.connected);
        assert_eq!(edge.ha_state, "active");
        assert_eq!(edge.ha_peer_serial, "007051000112");

        let branch = &devices[1];
        assert_eq!(branch.serial, "007051000113");
        assert!(!branch.connected);
        assert_eq!(branch.ha_state, "standalone");
        assert_eq!(branch.ha_peer_serial, "");
        assert_eq!(branch.model, "");
    }

    #[tokio::test]
    async fn lookup_by_name_ignores_case() {
        let device = client(DEVICES)
            .get_device_by_name("fw-edge-01")
            .await
            .expect("device");
        assert_eq!(device.hostname, "FW-Edge-01");
    }

    #[tokio::test]
    async fn single_entry_is_treated_as_list() {
        let device = client(ONE_DEVICE)
            .get_device_by_serial("0071")
            .await
            .expect("device");
        assert_eq!(device.hostname, "solo");
    }

    #[tokio::test]
    async fn unknown_serial_is_not_found() {
        let err = client(DEVICES)
            .get_device_by_serial("nope")
            .await
            .expect_err("missing");
        assert_eq!(err.code(), "DEVICE_NOT_FOUND");
        assert_eq!(err.details()["serial"], "nope");
    }

    #[tokio::test]
    async fn failed_listing_is_lookup_failure() {
        let err = client(r#"<response status="error"><msg>not a manager</msg></response>"#)
            .get_device_by_name("x")
            .await
            .expect_err("lookup");
        assert_eq!(err.code(), "DEVICE_LOOKUP_FAILED");
        assert!(err.to_string().contains("not a manager"));
    }

    #[tokio::test]
    async fn connectivity_reports_system_fields() {
        let client = ApiClient::with_transport(
            ClientConfig::new("panorama.lab").with_api_key("KEY"),
            ReplayTransport::new(vec![
                RecordedExchange::new(
                    "op",
                    None,
                    r#"<response status="success"><result><system>
                         <hostname>fw01</hostname><model>PA-440</model>
                         <serial>0071</serial><sw-version>11.0.3</sw-version>
                         <uptime>3 days, 2:01:00</uptime>
                       </system></result></response>"#,
                )
                .with_target("0071"),
                RecordedExchange::new(
                    "op",
                    None,
                    r#"<response status="error"><msg>device not connected</msg></response>"#,
                ),
                RecordedExchange::connection_failure("op", "connection reset"),
            ]),
        );

        let ok = client.test_connectivity(Some("0071")).await;
        assert!(ok.connected);
        assert_eq!(ok.sw_version.as_deref(), Some("11.0.3"));
        assert_eq!(ok.uptime.as_deref(), Some("3 days, 2:01:00"));
        assert_eq!(ok.error, None);

        let refused = client.test_connectivity(None).await;
        assert!(!refused.connected);
        assert_eq!(refused.error.as_deref(), Some("device not connected"));
        assert_eq!(refused.error_code, None);

        let down = client.test_connectivity(None).await;
        assert!(!down.connected);
        assert_eq!(down.error_code.as_deref(), Some("CONNECTION_ERROR"));
    }
}
