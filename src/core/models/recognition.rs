use serde::Deserialize;

use crate::core::models::{BoundingBox, ImagePayload};

#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionRequest {
    pub project_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub image: ImagePayload,
    pub boxes: Vec<BoundingBox>,
}

/// Text read from one requested box; the n-th region answers the n-th box.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecognizedRegion {
    #[serde(default)]
    pub extracted_text: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl RecognizedRegion {
    pub fn new(extracted_text: impl Into<String>, confidence: Option<f32>) -> Self {
        Self {
            extracted_text: extracted_text.into(),
            confidence,
        }
    }
}
