//! In-memory job service that replays a fixed script.
//!
//! Status reads pop the next scripted step; the last step repeats forever.
//! Every call is counted so tests can assert exactly how often the client
//! talked to the service.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    ExportOptions, JobError, JobId, JobService, JobStatus, JobSummary, Result, StatusReport,
    UploadFile, UploadReceipt,
};

pub const SCRIPTED_JOB_ID: &str = "job-1";

#[derive(Debug, Clone)]
enum Step {
    Report(StatusReport),
    Error(String),
}

#[derive(Default)]
pub struct ScriptedJobService {
    steps: Mutex<VecDeque<Step>>,
    reply: Option<String>,
    duration: Option<f64>,
    video: Vec<u8>,
    history: Vec<JobSummary>,
    upload_error: Option<String>,
    prompt_error: Option<String>,
    download_error: Option<String>,
    prompts: Mutex<Vec<String>>,
    exports: Mutex<Vec<Option<ExportOptions>>>,
    upload_calls: AtomicUsize,
    status_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl ScriptedJobService {
    pub fn new() -> Self {
        Self {
            duration: Some(30.0),
            video: b"rendered-video".to_vec(),
            ..Self::default()
        }
    }

    pub fn with_statuses(self, statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        {
            let mut steps = self.steps.lock();
            steps.extend(
                statuses
                    .into_iter()
                    .map(|s| Step::Report(StatusReport::new(s))),
            );
        }
        self
    }

    pub fn with_report(self, report: StatusReport) -> Self {
        self.steps.lock().push_back(Step::Report(report));
        self
    }

    pub fn with_poll_error(self, error: impl Into<String>) -> Self {
        self.steps.lock().push_back(Step::Error(error.into()));
        self
    }

    /// `ai_reply` attached to every scripted report that has none
    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_video(mut self, video: impl Into<Vec<u8>>) -> Self {
        self.video = video.into();
        self
    }

    pub fn with_history(mut self, history: Vec<JobSummary>) -> Self {
        self.history = history;
        self
    }

    pub fn failing_upload(mut self, error: impl Into<String>) -> Self {
        self.upload_error = Some(error.into());
        self
    }

    pub fn failing_prompt(mut self, error: impl Into<String>) -> Self {
        self.prompt_error = Some(error.into());
        self
    }

    pub fn failing_download(mut self, error: impl Into<String>) -> Self {
        self.download_error = Some(error.into());
        self
    }

    pub fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn exports(&self) -> Vec<Option<ExportOptions>> {
        self.exports.lock().clone()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock();
        let step = if steps.len() > 1 {
            steps.pop_front()
        } else {
            steps.front().cloned()
        };
        step.unwrap_or_else(|| Step::Report(StatusReport::new(JobStatus::Processing)))
    }
}

#[async_trait::async_trait]
impl JobService for ScriptedJobService {
    async fn upload(&self, _file: UploadFile) -> Result<UploadReceipt> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.upload_error {
            return Err(JobError::Upload(err.clone()));
        }
        Ok(UploadReceipt {
            job_id: JobId::new(SCRIPTED_JOB_ID),
            duration: self.duration,
            status: JobStatus::Other("UPLOADED".to_string()),
        })
    }

    async fn submit_prompt(&self, _job_id: &JobId, prompt: &str) -> Result<()> {
        if let Some(err) = &self.prompt_error {
            return Err(JobError::PromptSubmit(err.clone()));
        }
        self.prompts.lock().push(prompt.to_string());
        Ok(())
    }

    async fn status(&self, _job_id: &JobId) -> Result<StatusReport> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Report(mut report) => {
                if report.ai_reply.is_none() {
                    report.ai_reply = self.reply.clone();
                }
                Ok(report)
            }
            Step::Error(err) => Err(JobError::Poll(err)),
        }
    }

    async fn download(&self, _job_id: &JobId, export: Option<&ExportOptions>) -> Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        self.exports.lock().push(export.copied());
        if let Some(err) = &self.download_error {
            return Err(JobError::Export(err.clone()));
        }
        Ok(self.video.clone())
    }

    async fn history(&self) -> Result<Vec<JobSummary>> {
        Ok(self.history.clone())
    }

    fn download_url(&self, job_id: &JobId) -> String {
        format!("scripted://jobs/{}/download", job_id)
    }
}
