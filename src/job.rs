//! Polling of asynchronous appliance jobs.
//!
//! Downloads, installs and reboots answer immediately with a job id; the
//! work itself runs on the appliance. [`JobPoller`] asks for the job status
//! until it reports `FIN`, the time budget runs out, or the caller cancels.

use std::time::{Duration, Instant};

use log::{debug, info};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::client::{ApiClient, Transport};
use crate::config::ClientConfig;
use crate::error::PanosError;
use crate::xml::{ABSENT, NormalizedResponse, XmlValue};

/// Status value of a finished job.
pub const JOB_FINISHED: &str = "FIN";

/// Result value of a successful job.
pub const JOB_RESULT_OK: &str = "OK";

const UNKNOWN: &str = "UNKNOWN";

/// One observation of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobStatus {
    pub job_id: String,
    /// `ACT`, `PEND`, `FIN`, ... or `UNKNOWN`.
    pub status: String,
    /// `OK`, `FAIL`, `PEND`, ... or `UNKNOWN`.
    pub result: String,
    pub progress_percent: u8,
    /// The folded `job` element.
    pub details: XmlValue,
}

impl JobStatus {
    /// Reads `data.job` of a job status response.
    ///
    /// A missing or unparseable progress counts as 100 for a finished job and
    /// 0 otherwise.
    pub fn from_response(job_id: &str, response: &NormalizedResponse) -> Self {
        let job = response.data.get("job").unwrap_or(&ABSENT);
        let status = job.str_or("status", UNKNOWN).to_string();
        let finished = status == JOB_FINISHED;
        let progress_percent = job
            .get("progress")
            .and_then(XmlValue::as_str)
            .and_then(|p| p.trim().trim_end_matches('%').parse::<u64>().ok())
            .map(|p| p.min(100) as u8)
            .unwrap_or(if finished { 100 } else { 0 });

        Self {
            job_id: job_id.to_string(),
            result: job.str_or("result", UNKNOWN).to_string(),
            status,
            progress_percent,
            details: job.clone(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == JOB_FINISHED
    }
}

/// Terminal state of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JobOutcome {
    /// `result == "OK"`.
    pub success: bool,
    pub result: String,
    pub details: XmlValue,
    /// Wall time from the first poll to the finishing one.
    pub elapsed: Duration,
}

/// Time-bounded, optionally cancellable job watcher.
#[derive(Debug, Clone)]
pub struct JobPoller {
    timeout: Duration,
    poll_interval: Duration,
    cancel: Option<CancellationToken>,
}

impl JobPoller {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
            cancel: None,
        }
    }

    /// Uses the job timeout and poll interval of `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.job_timeout(), config.poll_interval())
    }

    /// Ends the wait with [`PanosError::JobCancelled`] once `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Polls until the job reaches `FIN`.
    pub async fn wait<T: Transport>(
        &self,
        client: &ApiClient<T>,
        job_id: &str,
        target: Option<&str>,
    ) -> Result<JobOutcome, PanosError> {
        self.wait_with_progress(client, job_id, target, |_| {}).await
    }

    /// Like [`JobPoller::wait`], handing every observed status to `on_status`.
    ///
    /// The timeout is checked before each poll, so a slow status request can
    /// overshoot it by one round trip.
    pub async fn wait_with_progress<T, F>(
        &self,
        client: &ApiClient<T>,
        job_id: &str,
        target: Option<&str>,
        mut on_status: F,
    ) -> Result<JobOutcome, PanosError>
    where
        T: Transport,
        F: FnMut(&JobStatus),
    {
        let start = Instant::now();
        debug!(
            "Waiting for job {} (timeout {}s, interval {}s)",
            job_id,
            self.timeout.as_secs(),
            self.poll_interval.as_secs()
        );

        loop {
            let elapsed = start.elapsed();
            if elapsed > self.timeout {
                return Err(PanosError::JobTimeout {
                    job_id: job_id.to_string(),
                    elapsed,
                    timeout: self.timeout,
                });
            }
            if self.is_cancelled() {
                return Err(self.cancelled(job_id, elapsed));
            }

            let response = client.get_job_status(job_id, target).await?;
            let status = JobStatus::from_response(job_id, &response);
            info!(
                "Job {}: {} {}% ({}s elapsed)",
                job_id,
                status.status,
                status.progress_percent,
                start.elapsed().as_secs()
            );
            on_status(&status);

            if status.is_finished() {
                return Ok(JobOutcome {
                    success: status.result == JOB_RESULT_OK,
                    result: status.result,
                    details: status.details,
                    elapsed: start.elapsed(),
                });
            }

            match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => {
                            return Err(self.cancelled(job_id, start.elapsed()));
                        }
                        _ = tokio::time::sleep(self.poll_interval) => {}
                    }
                }
                None => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    fn cancelled(&self, job_id: &str, elapsed: Duration) -> PanosError {
        info!("Stopped waiting for job {} after {}s", job_id, elapsed.as_secs());
        PanosError::JobCancelled {
            job_id: job_id.to_string(),
            elapsed,
        }
    }
}

/// Waits for `job_id` with an explicit budget and interval.
pub async fn wait_for_job<T: Transport>(
    client: &ApiClient<T>,
    job_id: &str,
    target: Option<&str>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<JobOutcome, PanosError> {
    JobPoller::new(timeout, poll_interval)
        .wait(client, job_id, target)
        .await
}
