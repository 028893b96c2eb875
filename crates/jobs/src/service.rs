use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::{JobError, JobId, JobSummary, Result, StatusReport, UploadReceipt};

/// Remote job service abstraction.
///
/// `HttpJobService` talks to the real API; tests use an in-memory script.
#[async_trait::async_trait]
pub trait JobService: Send + Sync {
    /// Store a source video and open a job for it
    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt>;

    /// Queue a free-text edit instruction against a job
    async fn submit_prompt(&self, job_id: &JobId, prompt: &str) -> Result<()>;

    /// Current status of a job
    async fn status(&self, job_id: &JobId) -> Result<StatusReport>;

    /// Fetch the job's current video (original or edited)
    async fn download(&self, job_id: &JobId, export: Option<&ExportOptions>) -> Result<Vec<u8>>;

    /// Previous jobs for the signed-in user
    async fn history(&self) -> Result<Vec<JobSummary>>;

    /// Canonical URL a player can stream the job's video from
    fn download_url(&self, job_id: &JobId) -> String;
}

/// A source video ready to be sent as a multipart part.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name).to_string();
        Self {
            file_name,
            bytes,
            mime,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| JobError::Upload(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video.mp4".to_string());
        Ok(Self::new(name, bytes))
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Mp4,
    Webm,
    Mov,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mov => "mov",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            "mov" => Ok(Self::Mov),
            other => Err(format!("unsupported export format: {}", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExportResolution {
    #[serde(rename = "720p")]
    Hd720,
    #[default]
    #[serde(rename = "1080p")]
    Hd1080,
    #[serde(rename = "4k")]
    Uhd4k,
}

impl ExportResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hd720 => "720p",
            Self::Hd1080 => "1080p",
            Self::Uhd4k => "4k",
        }
    }
}

impl std::str::FromStr for ExportResolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "720p" => Ok(Self::Hd720),
            "1080p" => Ok(Self::Hd1080),
            "4k" | "2160p" => Ok(Self::Uhd4k),
            other => Err(format!("unsupported export resolution: {}", other)),
        }
    }
}

impl fmt::Display for ExportResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output format and size requested for a manual export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub resolution: ExportResolution,
}

impl ExportOptions {
    pub fn new(format: ExportFormat, resolution: ExportResolution) -> Self {
        Self { format, resolution }
    }

    pub fn query(&self) -> [(&'static str, &'static str); 2] {
        [
            ("format", self.format.as_str()),
            ("resolution", self.resolution.as_str()),
        ]
    }

    /// File extension for the saved export
    pub fn extension(&self) -> &'static str {
        self.format.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_file_guesses_mime() {
        assert_eq!(UploadFile::new("clip.MOV", vec![]).mime, "video/quicktime");
        assert_eq!(UploadFile::new("a.mp4", vec![]).mime, "video/mp4");
        assert_eq!(
            UploadFile::new("noext", vec![]).mime,
            "application/octet-stream"
        );
    }

    #[test]
    fn export_options_parse_and_query() {
        let opts = ExportOptions::new("webm".parse().unwrap(), "4K".parse().unwrap());
        assert_eq!(opts.query(), [("format", "webm"), ("resolution", "4k")]);
        assert!("avi".parse::<ExportFormat>().is_err());
        assert_eq!(ExportOptions::default().query()[1].1, "1080p");
    }

    #[tokio::test]
    async fn from_path_reads_file_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holiday.webm");
        tokio::fs::write(&path, b"webm-bytes").await.unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.file_name, "holiday.webm");
        assert_eq!(file.bytes, b"webm-bytes");
        assert_eq!(file.mime, "video/webm");

        let missing = UploadFile::from_path(&dir.path().join("nope.mp4")).await;
        assert!(matches!(missing, Err(JobError::Upload(_))));
    }
}
