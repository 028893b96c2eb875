//! Client side of the remote edit-job service.
//!
//! A job is one uploaded video plus the edits requested against it. The
//! client uploads, submits free-text prompts, polls status until a terminal
//! state, and downloads the rendered result.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

mod wire;
pub use wire::*;
mod service;
pub use service::*;
mod http;
pub use http::*;
mod poll;
pub use poll::*;

#[cfg(any(test, feature = "scripted"))]
pub mod scripted;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("prompt submission failed: {0}")]
    PromptSubmit(String),
    #[error("status poll failed: {0}")]
    Poll(String),
    #[error("job {0} failed: {1}")]
    JobFailed(JobId, String),
    #[error("export failed: {0}")]
    Export(String),
    #[error("job history unavailable: {0}")]
    History(String),
    #[error("HTTP client setup failed: {0}")]
    Client(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("invalid response: missing {0}")]
    InvalidResponse(&'static str),
}

pub type Result<T> = std::result::Result<T, JobError>;

/// Server-issued job identifier. The service may send it as a string or a
/// number; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => JobId(s),
            Raw::Signed(n) => JobId(n.to_string()),
            Raw::Unsigned(n) => JobId(n.to_string()),
        })
    }
}

/// Job status as reported by the service.
///
/// Only `Completed`, `ChatOnly` and `Failed` are terminal. Anything the
/// client does not know (`UPLOADED`, `EDITING`, ...) is kept verbatim and
/// treated as still running.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    ChatOnly,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::ChatOnly | Self::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::ChatOnly => "CHAT_ONLY",
            Self::Failed => "FAILED",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUEUED" => Self::Queued,
            "PROCESSING" => Self::Processing,
            "COMPLETED" => Self::Completed,
            "CHAT_ONLY" => Self::ChatOnly,
            "FAILED" => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client-side view of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub status: JobStatus,
    pub source_duration: Option<f64>,
    pub last_prompt: Option<String>,
    pub ai_reply: Option<String>,
}

impl Job {
    pub fn from_receipt(receipt: &UploadReceipt) -> Self {
        Self {
            id: receipt.job_id.clone(),
            status: receipt.status.clone(),
            source_duration: receipt.duration,
            last_prompt: None,
            ai_reply: None,
        }
    }

    /// Fold a polled status report into the local view.
    pub fn observe(&mut self, report: &StatusReport) {
        self.status = report.status.clone();
        if report.duration.is_some() {
            self.source_duration = report.duration;
        }
        if report.prompt.is_some() {
            self.last_prompt = report.prompt.clone();
        }
        if report.ai_reply.is_some() {
            self.ai_reply = report.ai_reply.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_known_and_unknown_values() {
        assert_eq!(JobStatus::from("COMPLETED"), JobStatus::Completed);
        assert_eq!(JobStatus::from("chat_only"), JobStatus::ChatOnly);
        assert_eq!(
            JobStatus::from("EDITING"),
            JobStatus::Other("EDITING".to_string())
        );
        assert!(!JobStatus::from("UPLOADED").is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn status_round_trips_through_json() {
        let s: JobStatus = serde_json::from_str("\"CHAT_ONLY\"").unwrap();
        assert_eq!(s, JobStatus::ChatOnly);
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"CHAT_ONLY\"");
        let other: JobStatus = serde_json::from_str("\"PENDING\"").unwrap();
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"PENDING\"");
    }

    #[test]
    fn job_id_accepts_strings_and_numbers() {
        let a: JobId = serde_json::from_str("\"3f2a\"").unwrap();
        let b: JobId = serde_json::from_str("42").unwrap();
        assert_eq!(a, JobId::new("3f2a"));
        assert_eq!(b, JobId::new("42"));
        assert!(serde_json::from_str::<JobId>("null").is_err());
    }

    #[test]
    fn observe_keeps_known_fields() {
        let mut job = Job {
            id: JobId::new("1"),
            status: JobStatus::Queued,
            source_duration: Some(12.0),
            last_prompt: None,
            ai_reply: None,
        };
        job.observe(&StatusReport {
            status: JobStatus::ChatOnly,
            duration: None,
            prompt: Some("hello".into()),
            ai_reply: Some("hi!".into()),
            error: None,
        });
        assert_eq!(job.status, JobStatus::ChatOnly);
        assert_eq!(job.source_duration, Some(12.0));
        assert_eq!(job.last_prompt.as_deref(), Some("hello"));
        assert_eq!(job.ai_reply.as_deref(), Some("hi!"));
    }
}
