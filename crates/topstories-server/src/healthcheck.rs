//! Start/finish/fail pings to healthchecks.io around scheduled jobs.

use reqwest::Client;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use topstories_core::BackgroundTasks;
use tracing::warn;

const MAX_ATTEMPTS: u32 = 5;
const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(2_500);

#[derive(Debug, Error)]
pub enum HealthcheckError {
    #[error("healthchecks.io: {0} failed")]
    PingFailed(&'static str),

    #[error("{0}")]
    Job(String),
}

/// Reports job lifecycles to a single healthchecks.io check.
pub struct HealthcheckReporter {
    client: Client,
    base_url: String,
    check_id: String,
    max_attempts: u32,
    attempt_timeout: Duration,
}

impl HealthcheckReporter {
    pub fn new(base_url: impl Into<String>, check_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            check_id: check_id.into(),
            max_attempts: MAX_ATTEMPTS,
            attempt_timeout: ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_retry_policy(mut self, max_attempts: u32, attempt_timeout: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.attempt_timeout = attempt_timeout;
        self
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}{}", self.base_url, self.check_id, suffix)
    }

    /// Bounded retries; each attempt is cut off after `attempt_timeout`.
    async fn reliable_fetch(&self, url: &str, body: Option<String>) -> bool {
        for attempt in 1..=self.max_attempts {
            let request = match &body {
                Some(body) => self.client.post(url).body(body.clone()),
                None => self.client.get(url),
            };
            match tokio::time::timeout(self.attempt_timeout, request.send()).await {
                Err(_) => warn!(attempt, "reliable_fetch: timeout"),
                Ok(Err(e)) => warn!(attempt, error = %e, "reliable_fetch: fetch failure"),
                Ok(Ok(res)) if !res.status().is_success() => {
                    warn!(attempt, status = %res.status(), "reliable_fetch: non-ok response")
                }
                Ok(Ok(_)) => return true,
            }
        }
        false
    }

    pub async fn report_start(&self) -> Result<(), HealthcheckError> {
        if self.reliable_fetch(&self.url("/start"), None).await {
            Ok(())
        } else {
            Err(HealthcheckError::PingFailed("reportStart"))
        }
    }

    pub async fn report_finish(&self) -> Result<(), HealthcheckError> {
        if self.reliable_fetch(&self.url(""), None).await {
            Ok(())
        } else {
            Err(HealthcheckError::PingFailed("reportFinish"))
        }
    }

    pub async fn report_failure(&self, logs: &str) -> Result<(), HealthcheckError> {
        let body = serde_json::json!({ "logs": logs }).to_string();
        if self.reliable_fetch(&self.url("/fail"), Some(body)).await {
            Ok(())
        } else {
            Err(HealthcheckError::PingFailed("reportFailure"))
        }
    }

    /// Ping start, run `job`, then ping finish or fail in the background.
    /// A failed start ping aborts before the job runs.
    pub async fn report<T, E, F, Fut>(
        self: &Arc<Self>,
        tasks: &BackgroundTasks,
        job: F,
    ) -> Result<T, HealthcheckError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.report_start().await?;

        match job().await {
            Ok(value) => {
                let reporter = self.clone();
                tasks.spawn("healthcheck-finish", async move { reporter.report_finish().await });
                Ok(value)
            }
            Err(e) => {
                let message = e.to_string();
                let reporter = self.clone();
                let logs = message.clone();
                tasks.spawn("healthcheck-fail", async move {
                    reporter.report_failure(&logs).await
                });
                Err(HealthcheckError::Job(message))
            }
        }
    }
}
