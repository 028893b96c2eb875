/// Background status polling for an outstanding edit request.
///
/// At most one poll task runs per poller. Starting a new poll aborts the
/// previous task, and dropping the poller aborts whatever is running, so no
/// event is produced for a job the owner has moved away from.
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{JobId, JobService, JobStatus, StatusReport};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub max_backoff: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 180,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Wait before the next request, given the number of consecutive
    /// failed requests so far.
    pub fn delay(&self, consecutive_errors: u32) -> Duration {
        if consecutive_errors == 0 {
            return self.interval;
        }
        let factor = 1u32 << consecutive_errors.min(16);
        self.interval
            .saturating_mul(factor)
            .min(self.max_backoff.max(self.interval))
    }
}

/// What the poll loop observed.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// Every successful status read, terminal or not
    Status { job_id: JobId, report: StatusReport },
    /// Finished with a new render, already downloaded
    Completed {
        job_id: JobId,
        reply: Option<String>,
        video: Vec<u8>,
    },
    /// Finished with a reply only; the video is unchanged
    ChatOnly { job_id: JobId, reply: Option<String> },
    Failed { job_id: JobId, reason: String },
    /// A status read failed; polling continues
    PollError { job_id: JobId, error: String },
    /// Finished, but fetching the render failed
    RefreshFailed {
        job_id: JobId,
        reply: Option<String>,
        error: String,
    },
    TimedOut { job_id: JobId, attempts: u32 },
}

impl JobEvent {
    pub fn job_id(&self) -> &JobId {
        match self {
            Self::Status { job_id, .. }
            | Self::Completed { job_id, .. }
            | Self::ChatOnly { job_id, .. }
            | Self::Failed { job_id, .. }
            | Self::PollError { job_id, .. }
            | Self::RefreshFailed { job_id, .. }
            | Self::TimedOut { job_id, .. } => job_id,
        }
    }

    /// True for the last event a poll produces.
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Status { .. } | Self::PollError { .. })
    }
}

pub const FAILED_WITHOUT_REASON: &str = "the server did not give a reason";

pub struct JobPoller<S: JobService + ?Sized + 'static> {
    service: Arc<S>,
    policy: PollPolicy,
    events: mpsc::UnboundedSender<JobEvent>,
    task: Option<JoinHandle<()>>,
}

impl<S: JobService + ?Sized + 'static> JobPoller<S> {
    pub fn new(
        service: Arc<S>,
        policy: PollPolicy,
        events: mpsc::UnboundedSender<JobEvent>,
    ) -> Self {
        Self {
            service,
            policy,
            events,
            task: None,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Begin polling `job_id`, replacing any poll already running.
    pub fn start(&mut self, job_id: JobId) {
        if self.cancel() {
            debug!("Replaced running poll with poll for job {}", job_id);
        }
        info!(
            "Polling job {} every {:?} (max {} attempts)",
            job_id, self.policy.interval, self.policy.max_attempts
        );
        let service = Arc::clone(&self.service);
        let events = self.events.clone();
        let policy = self.policy;
        self.task = Some(tokio::spawn(async move {
            poll_until_terminal(service, policy, job_id, events).await;
        }));
    }

    /// Abort the running poll. Returns true if one was still running.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                let running = !task.is_finished();
                task.abort();
                running
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().map_or(false, |t| !t.is_finished())
    }
}

impl<S: JobService + ?Sized + 'static> Drop for JobPoller<S> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn poll_until_terminal<S: JobService + ?Sized>(
    service: Arc<S>,
    policy: PollPolicy,
    job_id: JobId,
    events: mpsc::UnboundedSender<JobEvent>,
) {
    let mut consecutive_errors = 0u32;
    for attempt in 1..=policy.max_attempts {
        tokio::time::sleep(policy.delay(consecutive_errors)).await;

        let report = match service.status(&job_id).await {
            Ok(report) => {
                consecutive_errors = 0;
                report
            }
            Err(e) => {
                consecutive_errors += 1;
                warn!("Poll {} for job {} failed: {}", attempt, job_id, e);
                let event = JobEvent::PollError {
                    job_id: job_id.clone(),
                    error: e.to_string(),
                };
                if events.send(event).is_err() {
                    return;
                }
                continue;
            }
        };

        debug!("Poll {} for job {}: {}", attempt, job_id, report.status);
        let status = report.status.clone();
        let reply = report.ai_reply.clone();
        let error = report.error.clone();
        let observed = JobEvent::Status {
            job_id: job_id.clone(),
            report,
        };
        if events.send(observed).is_err() {
            return;
        }

        let terminal = match status {
            JobStatus::Completed => match service.download(&job_id, None).await {
                Ok(video) => {
                    info!("Job {} completed ({} bytes)", job_id, video.len());
                    JobEvent::Completed {
                        job_id: job_id.clone(),
                        reply,
                        video,
                    }
                }
                Err(e) => {
                    warn!("Job {} completed but refresh failed: {}", job_id, e);
                    JobEvent::RefreshFailed {
                        job_id: job_id.clone(),
                        reply,
                        error: e.to_string(),
                    }
                }
            },
            JobStatus::ChatOnly => {
                info!("Job {} answered without a render", job_id);
                JobEvent::ChatOnly {
                    job_id: job_id.clone(),
                    reply,
                }
            }
            JobStatus::Failed => {
                let reason = error.unwrap_or_else(|| FAILED_WITHOUT_REASON.to_string());
                warn!("Job {} failed: {}", job_id, reason);
                JobEvent::Failed {
                    job_id: job_id.clone(),
                    reason,
                }
            }
            _ => continue,
        };
        let _ = events.send(terminal);
        return;
    }

    warn!(
        "Job {} still not finished after {} polls",
        job_id, policy.max_attempts
    );
    let _ = events.send(JobEvent::TimedOut {
        job_id,
        attempts: policy.max_attempts,
    });
}
