/// reqwest-backed client for the job service REST API.
use parking_lot::RwLock;
use reqwest::{RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    Credentials, ExportOptions, JobError, JobId, JobService, JobSummary, LoginResponse,
    PromptRequest, Result, StatusReport, UploadFile, UploadReceipt, UploadResponse,
};

pub struct HttpJobService {
    base_url: String,
    client: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl HttpJobService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Client with an overall per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| JobError::Client(e.to_string()))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client,
            token: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token.read().as_deref() {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Exchange credentials for a bearer token and keep it for later calls.
    pub async fn login(&self, credentials: &Credentials) -> Result<String> {
        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| JobError::Auth(e.to_string()))?;
        let response = check(response, JobError::Auth).await?;
        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| JobError::Auth(e.to_string()))?;
        let token = body
            .access_token
            .ok_or(JobError::InvalidResponse("access_token"))?;
        info!("Logged in as {}", credentials.email);
        self.set_token(Some(token.clone()));
        Ok(token)
    }

    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        let response = self
            .client
            .post(self.url("/auth/register"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| JobError::Auth(e.to_string()))?;
        check(response, JobError::Auth).await?;
        info!("Registered {}", credentials.email);
        Ok(())
    }
}

/// Turn a non-2xx response into `wrap(status - body)`.
async fn check(
    response: reqwest::Response,
    wrap: fn(String) -> JobError,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(wrap(format!("{} - {}", status, body.trim())))
}

#[async_trait::async_trait]
impl JobService for HttpJobService {
    async fn upload(&self, file: UploadFile) -> Result<UploadReceipt> {
        debug!("Uploading {} ({} bytes)", file.file_name, file.bytes.len());
        let part = reqwest::multipart::Part::bytes(file.bytes)
            .file_name(file.file_name)
            .mime_str(&file.mime)
            .map_err(|e| JobError::Upload(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .authorized(self.client.post(self.url("/jobs/upload")))
            .multipart(form)
            .send()
            .await
            .map_err(|e| JobError::Upload(e.to_string()))?;
        let response = check(response, JobError::Upload).await?;
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| JobError::Upload(e.to_string()))?;
        let receipt = body.into_receipt()?;
        info!(
            "Upload accepted: job {} (duration {:?})",
            receipt.job_id, receipt.duration
        );
        Ok(receipt)
    }

    async fn submit_prompt(&self, job_id: &JobId, prompt: &str) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.url(&format!("/jobs/{}/prompt", job_id))))
            .json(&PromptRequest { prompt })
            .send()
            .await
            .map_err(|e| JobError::PromptSubmit(e.to_string()))?;
        check(response, JobError::PromptSubmit).await?;
        info!("Prompt submitted for job {}", job_id);
        Ok(())
    }

    async fn status(&self, job_id: &JobId) -> Result<StatusReport> {
        let response = self
            .authorized(self.client.get(self.url(&format!("/jobs/{}", job_id))))
            .send()
            .await
            .map_err(|e| JobError::Poll(e.to_string()))?;
        let response = check(response, JobError::Poll).await?;
        let report: StatusReport = response
            .json()
            .await
            .map_err(|e| JobError::Poll(e.to_string()))?;
        debug!("Job {} status {}", job_id, report.status);
        Ok(report)
    }

    async fn download(&self, job_id: &JobId, export: Option<&ExportOptions>) -> Result<Vec<u8>> {
        let mut request = self.client.get(self.download_url(job_id));
        if let Some(opts) = export {
            request = request.query(&opts.query());
        }
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| JobError::Export(e.to_string()))?;
        let response = check(response, JobError::Export).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| JobError::Export(e.to_string()))?;
        debug!("Downloaded {} bytes for job {}", bytes.len(), job_id);
        Ok(bytes.to_vec())
    }

    async fn history(&self) -> Result<Vec<JobSummary>> {
        let response = self
            .authorized(self.client.get(self.url("/jobs/history")))
            .send()
            .await
            .map_err(|e| JobError::History(e.to_string()))?;
        if matches!(
            response.status(),
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED
        ) {
            warn!("Job history endpoint unavailable ({})", response.status());
            return Ok(Vec::new());
        }
        let response = check(response, JobError::History).await?;
        response
            .json()
            .await
            .map_err(|e| JobError::History(e.to_string()))
    }

    fn download_url(&self, job_id: &JobId) -> String {
        self.url(&format!("/jobs/{}/download", job_id))
    }
}
