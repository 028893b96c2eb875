use serde::{Deserialize, Serialize};

use crate::{JobError, JobId, JobStatus, Result};

/// Body of `POST /jobs/upload`. The service answers 200 with an `error`
/// field instead of a `job_id` when it could not store the file.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(default)]
    job_id: Option<JobId>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    status: Option<JobStatus>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl UploadResponse {
    pub(crate) fn into_receipt(self) -> Result<UploadReceipt> {
        if let Some(err) = self.error {
            let detail = match self.message {
                Some(msg) => format!("{}: {}", msg, err),
                None => err,
            };
            return Err(JobError::Upload(detail));
        }
        let job_id = self.job_id.ok_or(JobError::InvalidResponse("job_id"))?;
        Ok(UploadReceipt {
            job_id,
            duration: self.duration.filter(|d| d.is_finite() && *d >= 0.0),
            status: self.status.unwrap_or(JobStatus::Queued),
        })
    }
}

/// Validated result of an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadReceipt {
    pub job_id: JobId,
    pub duration: Option<f64>,
    pub status: JobStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct PromptRequest<'a> {
    pub prompt: &'a str,
}

/// Body of `GET /jobs/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: JobStatus,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub ai_reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusReport {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            duration: None,
            prompt: None,
            ai_reply: None,
            error: None,
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.ai_reply = Some(reply.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// One row of `GET /jobs/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(alias = "job_id")]
    pub id: JobId,
    pub status: JobStatus,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_response_requires_job_id() {
        let ok: UploadResponse =
            serde_json::from_str(r#"{"job_id":"ab12","duration":31.5,"status":"UPLOADED"}"#)
                .unwrap();
        let receipt = ok.into_receipt().unwrap();
        assert_eq!(receipt.job_id, JobId::new("ab12"));
        assert_eq!(receipt.duration, Some(31.5));

        let missing: UploadResponse = serde_json::from_str(r#"{"message":"ok"}"#).unwrap();
        assert!(matches!(
            missing.into_receipt(),
            Err(JobError::InvalidResponse("job_id"))
        ));
    }

    #[test]
    fn upload_error_body_is_an_upload_error() {
        let body: UploadResponse = serde_json::from_str(
            r#"{"message":"There was an error saving the uploaded file.","error":"disk full"}"#,
        )
        .unwrap();
        match body.into_receipt() {
            Err(JobError::Upload(detail)) => assert!(detail.contains("disk full")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn status_report_tolerates_extra_fields() {
        let report: StatusReport = serde_json::from_str(
            r#"{"job_id":"1","status":"FAILED","original_file":"/x.mp4","width":1920,"error":"ffmpeg exited"}"#,
        )
        .unwrap();
        assert_eq!(report.status, JobStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("ffmpeg exited"));
    }

    #[test]
    fn history_rows_accept_either_id_key() {
        let rows: Vec<JobSummary> = serde_json::from_str(
            r#"[{"id":"a","status":"COMPLETED","created_at":"2024-05-01T10:00:00"},{"job_id":7,"status":"QUEUED"}]"#,
        )
        .unwrap();
        assert_eq!(rows[0].id, JobId::new("a"));
        assert_eq!(rows[1].id, JobId::new("7"));
        assert_eq!(rows[1].created_at, None);
    }
}
