use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::core::interfaces::adapters::RecognitionService;
use crate::core::models::{BoundingBox, ImagePayload, RecognitionRequest, RecognizedRegion, UserSettings};

#[derive(Debug, Deserialize)]
struct RecognitionResponse {
    processing_result: Vec<RecognizedRegion>,
}

/// Talks to the OCR server: one multipart POST per image carrying every box to read.
pub struct HttpRecognitionService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecognitionService {
    pub fn build(settings: &UserSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .context("Failed to build recognition HTTP client")?;

        log::info!(
            "[HTTP_RECOGNITION] Using recognition endpoint {}",
            settings.recognition_service_url
        );

        Ok(Self {
            client,
            endpoint: settings.recognition_service_url.clone(),
        })
    }

    async fn resolve_image_bytes(&self, payload: &ImagePayload) -> Result<Vec<u8>> {
        match payload {
            ImagePayload::Bytes(bytes) => Ok(bytes.clone()),
            ImagePayload::RemoteUrl(url) => {
                log::debug!("[HTTP_RECOGNITION] Fetching remote image {}", url);

                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("Failed to fetch image from {}", url))?
                    .error_for_status()
                    .with_context(|| format!("Image download from {} was rejected", url))?;

                Ok(response.bytes().await?.to_vec())
            }
        }
    }

    fn build_form(request: &RecognitionRequest, image_bytes: Vec<u8>) -> Result<reqwest::multipart::Form> {
        let image_part = reqwest::multipart::Part::bytes(image_bytes)
            .file_name(request.file_name.clone())
            .mime_str(&request.mime_type)
            .with_context(|| format!("Invalid image mime type {}", request.mime_type))?;

        Ok(reqwest::multipart::Form::new()
            .text("project_id", request.project_id.clone())
            .part("image", image_part)
            .text("annotations", encode_boxes(&request.boxes)?))
    }
}

fn encode_boxes(boxes: &[BoundingBox]) -> Result<String> {
    serde_json::to_string(boxes).context("Failed to encode bounding boxes")
}

fn parse_recognition_response(body: &str) -> Result<Vec<RecognizedRegion>> {
    let response: RecognitionResponse =
        serde_json::from_str(body).context("Recognition response has no processing_result list")?;
    Ok(response.processing_result)
}

#[async_trait]
impl RecognitionService for HttpRecognitionService {
    async fn recognize_regions(&self, request: &RecognitionRequest) -> Result<Vec<RecognizedRegion>> {
        let image_bytes = self.resolve_image_bytes(&request.image).await?;
        let form = Self::build_form(request, image_bytes)?;

        log::info!(
            "[HTTP_RECOGNITION] Sending {} with {} boxes to {}",
            request.file_name,
            request.boxes.len(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .context("Failed to send recognition request")?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::error!("[HTTP_RECOGNITION] Server answered {}: {}", status, body);
            anyhow::bail!("Recognition service returned status {}", status);
        }

        let regions = parse_recognition_response(&body)?;
        log::debug!("[HTTP_RECOGNITION] Received {} regions", regions.len());

        Ok(regions)
    }
}
