use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use jobs::{Job, JobError, JobEvent, JobId, StatusReport, UploadReceipt};
use timeline::edit_operations::{self, TRIM_STEP};
use timeline::{
    content_end, AudioTrack, Clip, ClipId, HistoryBuffer, MediaRef, PlayheadController, Seconds,
    Seek, Snapshot, Zoom,
};

use crate::chat::ChatLog;
use crate::panels::{find_adjustment_preset, find_filter, Adjustment, PanelState, TextStyle};
use crate::SessionError;

pub const NEED_VIDEO_REPLY: &str =
    "Please upload a video first, then tell me what you'd like to change.";
pub const EDIT_READY_REPLY: &str = "Your edit is ready! The preview has been updated.";
pub const CHAT_ONLY_REPLY: &str = "Got it. Let me know what you'd like to change in the video.";
pub const CANCELLED_REPLY: &str =
    "Stopped waiting for that edit. Send a new request whenever you're ready.";
pub const TIMED_OUT_REPLY: &str =
    "This edit is taking longer than expected. I've stopped waiting; check the job status later.";

/// Where the preview plays from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoSource {
    /// Streamed from the job service
    Remote(String),
    /// Rendered output saved locally
    File(PathBuf),
}

impl VideoSource {
    pub fn media_ref(&self) -> MediaRef {
        match self {
            Self::Remote(url) => MediaRef::new(url.clone()),
            Self::File(path) => MediaRef::new(path.display().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    Upload,
    Export,
}

/// Blocking, user-visible error notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

/// A finished render that still has to be written somewhere playable.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRender {
    pub job_id: JobId,
    pub reply: Option<String>,
    pub video: Vec<u8>,
}

/// State behind one open editor page.
///
/// Every method is a synchronous transition; network calls happen in
/// [`crate::Editor`], which feeds their outcomes back in here.
#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    has_video: bool,
    clips: Vec<Clip>,
    audio_tracks: Vec<AudioTrack>,
    selected: Option<ClipId>,
    history: HistoryBuffer,
    playhead: PlayheadController,
    zoom: Zoom,
    video_duration: Option<Seconds>,
    video_source: Option<VideoSource>,
    job: Option<Job>,
    processing: bool,
    chat: ChatLog,
    panels: PanelState,
    alerts: Vec<Alert>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_video(&self) -> bool {
        self.has_video
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn audio_tracks(&self) -> &[AudioTrack] {
        &self.audio_tracks
    }

    pub fn selected(&self) -> Option<ClipId> {
        self.selected
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn playhead(&self) -> &PlayheadController {
        &self.playhead
    }

    /// Pointer and playback input go straight to the controller.
    pub fn playhead_mut(&mut self) -> &mut PlayheadController {
        &mut self.playhead
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn zoom_in(&mut self) -> Zoom {
        self.zoom = self.zoom.zoom_in();
        self.zoom
    }

    pub fn zoom_out(&mut self) -> Zoom {
        self.zoom = self.zoom.zoom_out();
        self.zoom
    }

    pub fn video_source(&self) -> Option<&VideoSource> {
        self.video_source.as_ref()
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn processing(&self) -> bool {
        self.processing
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatLog {
        &mut self.chat
    }

    pub fn panels(&self) -> &PanelState {
        &self.panels
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn take_alerts(&mut self) -> Vec<Alert> {
        std::mem::take(&mut self.alerts)
    }

    /// Project length: the source video or the furthest clip end, whichever
    /// is longer.
    pub fn duration(&self) -> Seconds {
        self.video_duration
            .unwrap_or(0.0)
            .max(content_end(&self.clips, &self.audio_tracks))
    }

    pub fn seek(&mut self, time: Seconds) -> Seek {
        self.playhead.seek(time)
    }

    fn sync_duration(&mut self) {
        let duration = self.duration();
        self.playhead.set_duration(duration);
    }

    fn commit(&mut self, clips: Vec<Clip>, audio_tracks: Vec<AudioTrack>) {
        self.clips = clips;
        self.audio_tracks = audio_tracks;
        self.history
            .push(Snapshot::new(self.clips.clone(), self.audio_tracks.clone()));
        self.sync_duration();
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.clips = snapshot.clips;
        self.audio_tracks = snapshot.audio_tracks;
        if let Some(id) = self.selected {
            if !self.clips.iter().any(|c| c.id == id) {
                self.selected = None;
            }
        }
        self.sync_duration();
    }

    fn require_video(&self, op: &str) -> Result<(), SessionError> {
        if self.has_video {
            Ok(())
        } else {
            debug!("Ignoring {} with no video loaded", op);
            Err(SessionError::NoVideo)
        }
    }

    fn require_selection(&self, op: &str) -> Result<ClipId, SessionError> {
        self.require_video(op)?;
        self.selected.ok_or_else(|| {
            debug!("Ignoring {} with no clip selected", op);
            SessionError::NoSelection
        })
    }

    /// Seed the timeline with one clip for the uploaded video.
    pub fn upload_succeeded(&mut self, receipt: &UploadReceipt, source: VideoSource) {
        let seed = edit_operations::main_clip(receipt.duration, Some(source.media_ref()));
        info!(
            "Loaded job {} ({:?}s) from {:?}",
            receipt.job_id, receipt.duration, source
        );
        self.has_video = true;
        self.job = Some(Job::from_receipt(receipt));
        self.video_duration = receipt.duration.filter(|d| *d > 0.0);
        self.video_source = Some(source);
        self.processing = false;
        self.selected = Some(seed.id);
        let audio = self.audio_tracks.clone();
        self.commit(vec![seed], audio);
    }

    pub fn upload_failed(&mut self, error: &JobError) {
        warn!("Upload failed: {}", error);
        self.alerts.push(Alert {
            kind: AlertKind::Upload,
            message: error.to_string(),
        });
    }

    /// First real duration from the player or a status poll. Stretches the
    /// zero-length seed clip without recording an edit.
    pub fn set_video_duration(&mut self, duration: Seconds) -> bool {
        if !(duration > 0.0) || !duration.is_finite() {
            return false;
        }
        self.video_duration = Some(duration);
        let stretched = edit_operations::stretch_unsized(&mut self.clips, duration);
        if stretched {
            self.history.amend_all(|snapshot| {
                edit_operations::stretch_unsized(&mut snapshot.clips, duration);
            });
        }
        self.sync_duration();
        stretched
    }

    pub fn select(&mut self, clip: Option<ClipId>) -> Result<(), SessionError> {
        if let Some(id) = clip {
            if !self.clips.iter().any(|c| c.id == id) {
                return Err(timeline::TimelineError::ClipNotFound(id).into());
            }
        }
        self.selected = clip;
        Ok(())
    }

    /// Split the selected clip at the playhead.
    pub fn cut(&mut self) -> Result<(), SessionError> {
        let id = self.require_selection("cut")?;
        let at = self.playhead.current_time();
        let clips = edit_operations::cut_clip(&self.clips, id, at)?;
        debug!("Cut clip {} at {:.3}s", id, at);
        let audio = self.audio_tracks.clone();
        self.commit(clips, audio);
        Ok(())
    }

    pub fn trim(&mut self) -> Result<(), SessionError> {
        let id = self.require_selection("trim")?;
        let clips = edit_operations::trim_clip_end(&self.clips, id, TRIM_STEP)?;
        let audio = self.audio_tracks.clone();
        self.commit(clips, audio);
        Ok(())
    }

    pub fn delete(&mut self) -> Result<(), SessionError> {
        let id = self.require_selection("delete")?;
        let clips = edit_operations::delete_clip(&self.clips, id)?;
        self.selected = None;
        let audio = self.audio_tracks.clone();
        self.commit(clips, audio);
        Ok(())
    }

    pub fn add_media(
        &mut self,
        name: impl Into<String>,
        source: Option<MediaRef>,
    ) -> Result<ClipId, SessionError> {
        self.require_video("add media")?;
        let clips = edit_operations::append_media(&self.clips, name, source)?;
        let id = clips[clips.len() - 1].id;
        let audio = self.audio_tracks.clone();
        self.commit(clips, audio);
        Ok(id)
    }

    pub fn add_music(
        &mut self,
        name: impl Into<String>,
        source: Option<MediaRef>,
    ) -> Result<ClipId, SessionError> {
        self.require_video("add music")?;
        let tracks =
            edit_operations::add_audio_track(&self.audio_tracks, name, source, self.duration())?;
        let id = tracks[tracks.len() - 1].id;
        let clips = self.clips.clone();
        self.commit(clips, tracks);
        Ok(id)
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.restore(snapshot);
                true
            }
            None => false,
        }
    }

    pub fn apply_effect(&mut self, name: impl Into<String>) -> Result<(), SessionError> {
        self.require_video("effect")?;
        let at = self.playhead.current_time();
        self.panels.add_effect(name, at);
        Ok(())
    }

    pub fn apply_transition(&mut self, name: impl Into<String>) -> Result<(), SessionError> {
        let clip = self.require_selection("transition")?;
        self.panels.set_transition(name, clip);
        Ok(())
    }

    pub fn apply_filter(&mut self, id: &str) -> Result<(), SessionError> {
        self.require_video("filter")?;
        let filter = find_filter(id).ok_or_else(|| SessionError::UnknownPreset(id.to_string()))?;
        self.panels.apply_filter(filter);
        Ok(())
    }

    pub fn apply_adjustment_preset(&mut self, name: &str) -> Result<(), SessionError> {
        let preset = find_adjustment_preset(name)
            .ok_or_else(|| SessionError::UnknownPreset(name.to_string()))?;
        self.panels.apply_preset(preset);
        Ok(())
    }

    pub fn set_adjustment(&mut self, key: Adjustment, value: i32) -> i32 {
        self.panels.adjustments.set(key, value)
    }

    pub fn add_text(&mut self, style: TextStyle) {
        self.panels.add_text(style);
    }

    pub fn add_sticker(&mut self, name: impl Into<String>, glyph: impl Into<String>) {
        self.panels.add_sticker(name, glyph);
    }

    /// Record a user instruction and mark the job as processing.
    ///
    /// Returns the job to submit against. Without a job the assistant asks
    /// for an upload instead and nothing is sent.
    pub fn begin_prompt(&mut self, text: &str) -> Result<JobId, SessionError> {
        if self.processing {
            return Err(SessionError::Busy);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        self.chat.user(text);
        let Some(job) = self.job.as_mut() else {
            self.chat.assistant(NEED_VIDEO_REPLY);
            return Err(SessionError::NoJob);
        };
        job.last_prompt = Some(text.to_string());
        self.processing = true;
        Ok(job.id.clone())
    }

    pub fn prompt_failed(&mut self, error: &JobError) {
        warn!("Prompt submission failed: {}", error);
        self.processing = false;
        self.chat
            .assistant(format!("Sorry, I couldn't send that request: {}", error));
    }

    fn is_current(&self, job_id: &JobId) -> bool {
        let current = self.job.as_ref().map_or(false, |j| &j.id == job_id);
        if !current {
            debug!("Dropping event for stale job {}", job_id);
        }
        current
    }

    pub fn observe_status(&mut self, job_id: &JobId, report: &StatusReport) {
        if !self.is_current(job_id) {
            return;
        }
        if let Some(job) = self.job.as_mut() {
            job.observe(report);
        }
        if let Some(duration) = report.duration {
            self.set_video_duration(duration);
        }
    }

    /// Swap the preview to the new render.
    pub fn edit_completed(&mut self, job_id: &JobId, reply: Option<String>, source: VideoSource) {
        if !self.is_current(job_id) {
            return;
        }
        info!("Job {} render ready at {:?}", job_id, source);
        self.video_source = Some(source);
        self.finish(reply.unwrap_or_else(|| EDIT_READY_REPLY.to_string()));
    }

    pub fn edit_answered(&mut self, job_id: &JobId, reply: Option<String>) {
        if !self.is_current(job_id) {
            return;
        }
        self.finish(reply.unwrap_or_else(|| CHAT_ONLY_REPLY.to_string()));
    }

    pub fn edit_failed(&mut self, job_id: &JobId, reason: &str) {
        if !self.is_current(job_id) {
            return;
        }
        self.finish(format!("Sorry, the edit failed: {}", reason));
    }

    /// The job finished but its render could not be fetched or stored.
    pub fn render_unavailable(&mut self, job_id: &JobId, reply: Option<String>, error: &str) {
        if !self.is_current(job_id) {
            return;
        }
        self.alerts.push(Alert {
            kind: AlertKind::Export,
            message: format!("Could not load the edited video: {}", error),
        });
        self.finish(reply.unwrap_or_else(|| EDIT_READY_REPLY.to_string()));
    }

    pub fn edit_timed_out(&mut self, job_id: &JobId) {
        if !self.is_current(job_id) {
            return;
        }
        self.finish(TIMED_OUT_REPLY.to_string());
    }

    /// The caller stopped waiting on the outstanding edit. Returns false
    /// when nothing was in flight.
    pub fn edit_cancelled(&mut self) -> bool {
        if !self.processing {
            return false;
        }
        if let Some(job) = &self.job {
            info!("Stopped waiting on job {}", job.id);
        }
        self.finish(CANCELLED_REPLY.to_string());
        true
    }

    pub fn export_failed(&mut self, error: impl std::fmt::Display) {
        warn!("Export failed: {}", error);
        self.alerts.push(Alert {
            kind: AlertKind::Export,
            message: error.to_string(),
        });
    }

    fn finish(&mut self, reply: String) {
        self.processing = false;
        if let Some(job) = self.job.as_mut() {
            job.ai_reply = Some(reply.clone());
        }
        self.chat.assistant(reply);
    }

    /// Fold one poll event into the session.
    ///
    /// A completed render is handed back untouched so the caller can store
    /// it and then report the location via [`edit_completed`].
    ///
    /// [`edit_completed`]: EditorSession::edit_completed
    pub fn apply_job_event(&mut self, event: JobEvent) -> Option<PendingRender> {
        match event {
            JobEvent::Status { job_id, report } => self.observe_status(&job_id, &report),
            JobEvent::Completed {
                job_id,
                reply,
                video,
            } => {
                if self.is_current(&job_id) {
                    return Some(PendingRender {
                        job_id,
                        reply,
                        video,
                    });
                }
            }
            JobEvent::ChatOnly { job_id, reply } => self.edit_answered(&job_id, reply),
            JobEvent::Failed { job_id, reason } => self.edit_failed(&job_id, &reason),
            JobEvent::PollError { job_id, error } => {
                debug!("Poll error for job {} recorded: {}", job_id, error);
            }
            JobEvent::RefreshFailed {
                job_id,
                reply,
                error,
            } => self.render_unavailable(&job_id, reply, &error),
            JobEvent::TimedOut { job_id, .. } => self.edit_timed_out(&job_id),
        }
        None
    }
}
