use crate::config::DashboardConfig;
use crate::model::{AnalysisRequest, AnalysisResult, ImageAnalysis, ImageUpload};
use crate::prelude::{AnalysisError, AnalysisService, ClientResult};
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the analysis backend. One request per call; no retries.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    analyze_url: String,
    image_url: String,
}

impl AnalysisClient {
    pub fn new(config: &DashboardConfig) -> ClientResult<Self> {
        Self::with_endpoints(config.analyze_url(), config.image_url(), config.timeout())
    }

    pub fn with_endpoints(
        analyze_url: impl Into<String>,
        image_url: impl Into<String>,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::NetworkError(format!("building HTTP client: {}", e)))?;
        Ok(Self {
            http,
            analyze_url: analyze_url.into(),
            image_url: image_url.into(),
        })
    }

    pub async fn analyze(&self, request: &AnalysisRequest) -> ClientResult<AnalysisResult> {
        debug!(
            "POST {} ({} points, mode {})",
            self.analyze_url,
            request.coordinates.points().len(),
            request.detection_mode.as_str()
        );
        let response = self
            .http
            .post(&self.analyze_url)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        let mut result: AnalysisResult = decode_response(status, &body)?;
        result.assign_missing_ids();
        Ok(result)
    }

    pub async fn analyze_image(&self, upload: &ImageUpload) -> ClientResult<ImageAnalysis> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.mime_type())
            .map_err(|e| AnalysisError::NetworkError(e.to_string()))?;
        let form = Form::new().part("file", part);
        debug!("POST {} ({} bytes)", self.image_url, upload.bytes.len());

        let response = self
            .http
            .post(&self.image_url)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;
        decode_response(status, &body)
    }
}

impl AnalysisService for AnalysisClient {
    async fn analyze(&self, request: &AnalysisRequest) -> ClientResult<AnalysisResult> {
        AnalysisClient::analyze(self, request).await
    }

    async fn analyze_image(&self, upload: &ImageUpload) -> ClientResult<ImageAnalysis> {
        AnalysisClient::analyze_image(self, upload).await
    }
}

fn transport_error(err: reqwest::Error) -> AnalysisError {
    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    };
    warn!("analysis transport failure: {}", message);
    AnalysisError::NetworkError(message)
}

/// Classifies a finished HTTP exchange: non-2xx becomes `ServerError`, a
/// body that does not match `T` becomes `ParseError`.
pub fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> ClientResult<T> {
    if !(200..300).contains(&status) {
        return Err(AnalysisError::ServerError {
            status,
            body: body.to_string(),
        });
    }
    serde_json::from_str(body).map_err(|e| AnalysisError::ParseError(e.to_string()))
}
