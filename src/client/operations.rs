use super::*;

use super::request::push_target;

const SYSTEM_INFO: &str = "<show><system><info></info></system></show>";
const HA_STATE: &str = "<show><high-availability><state></state></high-availability></show>";
const SOFTWARE_VERSIONS: &str =
    "<show><system><software><versions></versions></software></system></show>";
const SOFTWARE_CHECK: &str =
    "<request><system><software><check></check></software></system></request>";
const RESTART: &str = "<request><restart><system></system></restart></request>";
const ALL_JOBS: &str = "<show><jobs><all></all></jobs></show>";
const HA_SUSPEND: &str =
    "<request><high-availability><state><suspend></suspend></state></high-availability></request>";
const HA_FUNCTIONAL: &str = "<request><high-availability><state><functional></functional></state></high-availability></request>";
const HA_SYNC_TO_PEER: &str = "<request><high-availability><sync-to-remote><running-config></running-config></sync-to-remote></high-availability></request>";
const RESOURCES: &str = "<show><system><resources></resources></system></show>";
const SESSION_INFO: &str = "<show><session><info></info></session></show>";

/// Export category of the active configuration.
pub const RUNNING_CONFIG: &str = "running-config";
const DEVICE_STATE: &str = "device-state";

fn download_command(version: &str, sync: bool) -> String {
    format!(
        "<request><system><software><download><sync>{}</sync><version>{}</version></download></software></system></request>",
        if sync { "yes" } else { "no" },
        escape_xml(version)
    )
}

fn install_command(version: &str) -> String {
    format!(
        "<request><system><software><install><version>{}</version></install></software></system></request>",
        escape_xml(version)
    )
}

fn job_command(job_id: &str) -> String {
    format!("<show><jobs><id>{}</id></jobs></show>", escape_xml(job_id))
}

/// Device operations. Each accepts an optional routing target; without one
/// the command runs on the manager itself.
impl<T: Transport> ApiClient<T> {
    pub async fn get_system_info(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(SYSTEM_INFO, target).await
    }

    pub async fn get_ha_state(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(HA_STATE, target).await
    }

    /// Installed and downloadable software versions.
    pub async fn get_software_info(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(SOFTWARE_VERSIONS, target).await
    }

    /// Refreshes the list of available software from the update server.
    pub async fn check_software_updates(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(SOFTWARE_CHECK, target).await
    }

    /// Starts a software download. The response usually carries a job id.
    pub async fn download_software(
        &self,
        version: &str,
        target: Option<&str>,
        sync: bool,
    ) -> Result<NormalizedResponse, PanosError> {
        info!("Requesting download of software {}", version);
        self.op_command(&download_command(version, sync), target)
            .await
    }

    /// Starts a software install; returns the job-bearing response.
    pub async fn install_software(
        &self,
        version: &str,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        info!("Requesting install of software {}", version);
        self.op_command(&install_command(version), target).await
    }

    pub async fn reboot_device(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        info!("Requesting reboot of {}", target.unwrap_or(self.config.host.as_str()));
        self.op_command(RESTART, target).await
    }

    pub async fn get_job_status(
        &self,
        job_id: &str,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(&job_command(job_id), target).await
    }

    pub async fn get_all_jobs(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(ALL_JOBS, target).await
    }

    /// Exports a configuration, e.g. [`RUNNING_CONFIG`] or `candidate-config`.
    ///
    /// The exported tree is returned under `data` when the appliance wraps it
    /// in `<result>`; callers holding the raw document can fold it with
    /// [`crate::xml::element_to_value`].
    pub async fn export_config(
        &self,
        category: &str,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.export(category, target).await
    }

    /// Exports the full device state bundle.
    pub async fn export_device_state(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.export(DEVICE_STATE, target).await
    }

    /// Suspends the local HA member.
    pub async fn suspend_ha(&self, target: Option<&str>) -> Result<NormalizedResponse, PanosError> {
        self.op_command(HA_SUSPEND, target).await
    }

    /// Returns a suspended HA member to the functional state.
    pub async fn resume_ha(&self, target: Option<&str>) -> Result<NormalizedResponse, PanosError> {
        self.op_command(HA_FUNCTIONAL, target).await
    }

    /// Pushes the running configuration to the HA peer.
    pub async fn sync_ha_to_peer(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(HA_SYNC_TO_PEER, target).await
    }

    pub async fn get_resource_utilization(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(RESOURCES, target).await
    }

    pub async fn get_session_count(
        &self,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        self.op_command(SESSION_INFO, target).await
    }

    async fn export(
        &self,
        category: &str,
        target: Option<&str>,
    ) -> Result<NormalizedResponse, PanosError> {
        let mut params = params(&[("type", "export"), ("category", category)]);
        push_target(&mut params, target);
        self.request(params, Method::Get, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK: &str = r#"<response status="success"><result/></response>"#;

    fn client(exchanges: Vec<RecordedExchange>) -> ApiClient<ReplayTransport> {
        ApiClient::with_transport(
            ClientConfig::new("panorama.lab").with_api_key("KEY"),
            ReplayTransport::new(exchanges),
        )
    }

    #[test]
    fn download_template_carries_sync_flag_and_version() {
        assert_eq!(
            download_command("11.1.2-h3", true),
            "<request><system><software><download><sync>yes</sync><version>11.1.2-h3</version></download></software></system></request>"
        );
        assert!(download_command("11.1.2", false).contains("<sync>no</sync>"));
    }

    #[test]
    fn template_arguments_are_escaped() {
        assert_eq!(
            job_command("1</id><x>"),
            "<show><jobs><id>1&lt;/id&gt;&lt;x&gt;</id></jobs></show>"
        );
        assert!(install_command("a&b").contains("<version>a&amp;b</version>"));
    }

    #[tokio::test]
    async fn operations_send_their_fixed_commands() {
        let client = client(vec![
            RecordedExchange::new("op", Some(SYSTEM_INFO), OK).with_target("0071"),
            RecordedExchange::new("op", Some(HA_STATE), OK),
            RecordedExchange::new("op", Some(RESTART), OK).with_target("0071"),
            RecordedExchange::new("op", Some(HA_SYNC_TO_PEER), OK),
            RecordedExchange::new("op", Some("<show><jobs><id>42</id></jobs></show>"), OK),
        ]);
        client.get_system_info(Some("0071")).await.expect("info");
        client.get_ha_state(None).await.expect("ha");
        client.reboot_device(Some("0071")).await.expect("reboot");
        client.sync_ha_to_peer(None).await.expect("sync");
        client.get_job_status("42", None).await.expect("job");
        assert_eq!(client.transport().remaining(), 0);
    }

    #[tokio::test]
    async fn exports_use_export_type_and_category() {
        let client = client(vec![
            RecordedExchange::new("export", Some(RUNNING_CONFIG), OK).with_target("0071"),
            RecordedExchange::new("export", Some(DEVICE_STATE), OK),
        ]);
        client
            .export_config(RUNNING_CONFIG, Some("0071"))
            .await
            .expect("config");
        client.export_device_state(None).await.expect("state");

        let sent = client.transport().requests();
        assert_eq!(sent[0].param("category"), Some("running-config"));
        assert_eq!(sent[0].param("cmd"), None);
        assert_eq!(sent[1].param("target"), None);
    }
}
