use serde::{Deserialize, Serialize};

use crate::core::models::{Annotation, AnnotationMap, Image};

/// Autosave document. Field names are shared with previously saved sessions and must not change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub images: Vec<Image>,
    pub annotations: AnnotationMap,
    #[serde(rename = "currentId")]
    pub current_id: Option<String>,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub name: String,
    pub lang: String,
    #[serde(rename = "exportedAt")]
    pub exported_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedImage {
    pub id: String,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetExport {
    pub meta: ExportMetadata,
    pub images: Vec<ExportedImage>,
}
