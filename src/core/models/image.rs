use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// An uploaded or loaded page image. Immutable once created; `id` keys its annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    pub url: String,
}

/// What the recognition collaborator receives for an image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    Bytes(Vec<u8>),
    RemoteUrl(String),
}

impl Image {
    pub fn new(id: String, name: String, width: u32, height: u32, url: String) -> Self {
        Self {
            id,
            name,
            width,
            height,
            url,
        }
    }

    pub fn from_bytes(name: &str, width: u32, height: u32, bytes: &[u8]) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);

        log::debug!(
            "[IMAGE] building image {} ({}x{}, {} bytes)",
            name,
            width,
            height,
            bytes.len()
        );

        Self::from_encoded(uuid::Uuid::new_v4().to_string(), name, width, height, &encoded)
    }

    /// `encoded` may already be a data URL or a remote URL; bare base64 gets wrapped.
    pub fn from_encoded(id: String, name: &str, width: u32, height: u32, encoded: &str) -> Self {
        let is_url = encoded.starts_with(DATA_URL_PREFIX)
            || encoded.starts_with("http://")
            || encoded.starts_with("https://");

        let url = if is_url {
            encoded.to_string()
        } else {
            format!(
                "{}{}{}{}",
                DATA_URL_PREFIX,
                Self::guess_mime_type(name),
                BASE64_MARKER,
                encoded
            )
        };

        Self::new(id, name.to_string(), width, height, url)
    }

    pub fn payload(&self) -> Result<ImagePayload> {
        let Some(data) = self.url.strip_prefix(DATA_URL_PREFIX) else {
            return Ok(ImagePayload::RemoteUrl(self.url.clone()));
        };

        let (_, encoded) = data
            .split_once(BASE64_MARKER)
            .ok_or_else(|| anyhow::anyhow!("Image {} has a data URL without base64 content", self.id))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .with_context(|| format!("Failed to decode image data for {}", self.id))?;

        Ok(ImagePayload::Bytes(bytes))
    }

    pub fn mime_type(&self) -> &str {
        self.url
            .strip_prefix(DATA_URL_PREFIX)
            .and_then(|data| data.split_once(BASE64_MARKER))
            .map(|(mime, _)| mime)
            .unwrap_or_else(|| Self::guess_mime_type(&self.name))
    }

    fn guess_mime_type(name: &str) -> &'static str {
        let lowered = name.to_ascii_lowercase();
        if lowered.ends_with(".jpg") || lowered.ends_with(".jpeg") {
            "image/jpeg"
        } else if lowered.ends_with(".webp") {
            "image/webp"
        } else if lowered.ends_with(".tif") || lowered.ends_with(".tiff") {
            "image/tiff"
        } else {
            "image/png"
        }
    }
}
