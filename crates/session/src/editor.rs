use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use jobs::{
    ExportOptions, JobEvent, JobId, JobPoller, JobService, JobSummary, PollPolicy, UploadFile,
    UploadReceipt,
};

use crate::chat::{ChatResponder, LocalResponder};
use crate::config::EditorConfig;
use crate::{EditorSession, PendingRender, SessionError, VideoSource};

/// Drives an [`EditorSession`] against a job service.
///
/// Owns the single poll task for the session; dropping the editor stops it.
pub struct Editor<S: JobService + ?Sized + 'static> {
    service: Arc<S>,
    session: EditorSession,
    poller: JobPoller<S>,
    events: mpsc::UnboundedReceiver<JobEvent>,
    renders_dir: PathBuf,
    responder: Box<dyn ChatResponder>,
}

impl<S: JobService + ?Sized + 'static> Editor<S> {
    pub fn new(service: Arc<S>, policy: PollPolicy, renders_dir: impl Into<PathBuf>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            poller: JobPoller::new(Arc::clone(&service), policy, tx),
            service,
            session: EditorSession::new(),
            events: rx,
            renders_dir: renders_dir.into(),
            responder: Box::new(LocalResponder::default()),
        }
    }

    pub fn from_config(service: Arc<S>, config: &EditorConfig) -> Self {
        Self::new(service, config.poll_policy(), config.renders_dir())
    }

    pub fn with_responder(mut self, responder: impl ChatResponder + 'static) -> Self {
        self.responder = Box::new(responder);
        self
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    /// Upload a source video. On failure the session only gains an alert.
    pub async fn upload(&mut self, file: UploadFile) -> Result<JobId, SessionError> {
        match self.service.upload(file).await {
            Ok(receipt) => {
                self.poller.cancel();
                let source = VideoSource::Remote(self.service.download_url(&receipt.job_id));
                self.session.upload_succeeded(&receipt, source);
                Ok(receipt.job_id)
            }
            Err(e) => {
                self.session.upload_failed(&e);
                Err(e.into())
            }
        }
    }

    pub async fn upload_path(&mut self, path: &Path) -> Result<JobId, SessionError> {
        match UploadFile::from_path(path).await {
            Ok(file) => self.upload(file).await,
            Err(e) => {
                self.session.upload_failed(&e);
                Err(e.into())
            }
        }
    }

    /// Load an existing job into the session, as if it had just been
    /// uploaded.
    pub async fn open_job(&mut self, job_id: JobId) -> Result<(), SessionError> {
        let report = self.service.status(&job_id).await?;
        self.poller.cancel();
        let receipt = UploadReceipt {
            job_id: job_id.clone(),
            duration: report.duration,
            status: report.status.clone(),
        };
        let source = VideoSource::Remote(self.service.download_url(&job_id));
        self.session.upload_succeeded(&receipt, source);
        self.session.observe_status(&job_id, &report);
        Ok(())
    }

    /// Send an edit instruction and start polling for its outcome.
    pub async fn send_prompt(&mut self, text: &str) -> Result<JobId, SessionError> {
        let job_id = self.session.begin_prompt(text)?;
        match self.service.submit_prompt(&job_id, text.trim()).await {
            Ok(()) => {
                self.poller.start(job_id.clone());
                Ok(job_id)
            }
            Err(e) => {
                self.session.prompt_failed(&e);
                Err(e.into())
            }
        }
    }

    /// Chat with the configured responder without touching the job.
    pub async fn ask(&mut self, text: &str) -> Result<String, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        self.session.chat_mut().user(text);
        let reply = self.responder.respond(self.session.chat().messages()).await?;
        self.session.chat_mut().assistant(reply.clone());
        Ok(reply)
    }

    /// Wait for the next poll event and fold it into the session.
    ///
    /// Returns `None` when no poll is running and nothing is queued.
    pub async fn next_event(&mut self) -> Option<JobEvent> {
        let event = match self.events.try_recv() {
            Ok(event) => event,
            Err(_) if !self.poller.is_active() => self.events.try_recv().ok()?,
            Err(_) => self.events.recv().await?,
        };
        self.handle_event(event.clone()).await;
        Some(event)
    }

    /// Process events until the running poll reaches its last one.
    pub async fn wait_for_job(&mut self) -> Vec<JobEvent> {
        let mut seen = Vec::new();
        while let Some(event) = self.next_event().await {
            let done = event.is_final();
            seen.push(event);
            if done {
                break;
            }
        }
        seen
    }

    /// Stop waiting on the outstanding edit and drop anything it already
    /// queued. The session accepts a new prompt afterwards.
    pub fn cancel_poll(&mut self) -> bool {
        let cancelled = self.poller.cancel();
        if cancelled {
            while self.events.try_recv().is_ok() {}
            self.session.edit_cancelled();
        }
        cancelled
    }

    async fn handle_event(&mut self, event: JobEvent) {
        let Some(render) = self.session.apply_job_event(event) else {
            return;
        };
        let PendingRender {
            job_id,
            reply,
            video,
        } = render;
        match self.store_render(&job_id, &video).await {
            Ok(path) => self
                .session
                .edit_completed(&job_id, reply, VideoSource::File(path)),
            Err(e) => {
                warn!("Could not store render for job {}: {}", job_id, e);
                self.session
                    .render_unavailable(&job_id, reply, &e.to_string());
            }
        }
    }

    async fn store_render(&self, job_id: &JobId, video: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.renders_dir).await?;
        let stamp = Utc::now().format("%Y%m%d-%H%M%S%3f");
        let path = self.renders_dir.join(format!("{}-{}.mp4", job_id, stamp));
        tokio::fs::write(&path, video).await?;
        debug!("Stored {} bytes at {}", video.len(), path.display());
        Ok(path)
    }

    /// Download the current render with the chosen format and size.
    pub async fn export(
        &mut self,
        options: ExportOptions,
        dest: Option<PathBuf>,
    ) -> Result<PathBuf, SessionError> {
        let job_id = self
            .session
            .job()
            .map(|j| j.id.clone())
            .ok_or(SessionError::NoJob)?;
        let bytes = match self.service.download(&job_id, Some(&options)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.session.export_failed(&e);
                return Err(e.into());
            }
        };
        let path = dest.unwrap_or_else(|| {
            self.renders_dir.join(format!(
                "{}-export-{}.{}",
                job_id,
                options.resolution,
                options.extension()
            ))
        });
        if let Err(e) = write_file(&path, &bytes).await {
            self.session
                .export_failed(format!("could not save {}: {}", path.display(), e));
            return Err(e.into());
        }
        info!("Exported job {} to {}", job_id, path.display());
        Ok(path)
    }

    /// Previous jobs; any failure reads as an empty history.
    pub async fn history(&self) -> Vec<JobSummary> {
        match self.service.history().await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!("Could not load job history: {}", e);
                Vec::new()
            }
        }
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}
