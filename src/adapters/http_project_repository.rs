use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::core::interfaces::adapters::ProjectRepository;
use crate::core::models::{Annotation, GroundTruthRecord, Image, StoredImage, UserSettings};
use crate::global_constants;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProjectImagesResponse {
    List(Vec<ProjectImageEntry>),
    Wrapped { images: Vec<ProjectImageEntry> },
}

#[derive(Debug, Deserialize)]
struct ProjectImageEntry {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    base64: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    annotations: Vec<Value>,
}

/// Ground-truth saves and project loads against the project backend.
pub struct HttpProjectRepository {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProjectRepository {
    pub fn build(settings: &UserSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .context("Failed to build project HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.project_service_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_save_url(&self) -> String {
        format!("{}/images/save-groundtruth", self.base_url)
    }

    fn get_project_images_url(&self, project_id: &str) -> String {
        format!(
            "{}/projects/{}/images",
            self.base_url,
            urlencoding::encode(project_id)
        )
    }
}

fn entry_id(id: &Value) -> Option<String> {
    match id {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        Value::Object(fields) => fields.get("$oid").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn parse_annotations(image_id: &str, values: Vec<Value>) -> Vec<Annotation> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Annotation>(value) {
            Ok(annotation) => Some(annotation),
            Err(error) => {
                log::warn!(
                    "[HTTP_PROJECT] Dropping malformed annotation on image {}: {}",
                    image_id,
                    error
                );
                None
            }
        })
        .collect()
}

fn parse_project_images(body: &str) -> Result<Vec<StoredImage>> {
    let response: ProjectImagesResponse =
        serde_json::from_str(body).context("Project images response is not an image list")?;

    let entries = match response {
        ProjectImagesResponse::List(entries) => entries,
        ProjectImagesResponse::Wrapped { images } => images,
    };

    let stored_images = entries
        .into_iter()
        .filter_map(|entry| {
            let Some(id) = entry_id(&entry.id) else {
                log::warn!("[HTTP_PROJECT] Skipping project image without an id");
                return None;
            };

            let name = entry
                .name
                .or(entry.filename)
                .unwrap_or_else(|| global_constants::UNKNOWN_FILE_NAME.to_string());
            let encoded = entry.base64.or(entry.url).unwrap_or_default();
            let annotations = parse_annotations(&id, entry.annotations);

            Some(StoredImage {
                image: Image::from_encoded(id, &name, entry.width, entry.height, &encoded),
                annotations,
            })
        })
        .collect();

    Ok(stored_images)
}

#[async_trait]
impl ProjectRepository for HttpProjectRepository {
    async fn save_ground_truth(&self, record: &GroundTruthRecord) -> Result<()> {
        let save_url = self.get_save_url();
        log::info!(
            "[HTTP_PROJECT] Saving {} annotations for image {} to {}",
            record.annotations.len(),
            record.image_id,
            save_url
        );

        let response = self
            .client
            .post(&save_url)
            .json(record)
            .send()
            .await
            .context("Failed to send ground truth")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!("[HTTP_PROJECT] Save rejected with {}: {}", status, body);
            anyhow::bail!("Project service returned status {} for ground truth save", status);
        }

        Ok(())
    }

    async fn load_project(&self, project_id: &str) -> Result<Vec<StoredImage>> {
        let images_url = self.get_project_images_url(project_id);
        log::info!("[HTTP_PROJECT] Loading project images from {}", images_url);

        let response = self
            .client
            .get(&images_url)
            .send()
            .await
            .with_context(|| format!("Failed to load project {}", project_id))?
            .error_for_status()
            .with_context(|| format!("Project service rejected project {}", project_id))?;

        let body = response.text().await?;
        let stored_images = parse_project_images(&body)?;

        log::info!(
            "[HTTP_PROJECT] Project {} has {} images",
            project_id,
            stored_images.len()
        );
        Ok(stored_images)
    }
}
