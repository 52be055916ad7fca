use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::models::AnnotationMap;

/// Whole-image recognition result shown next to the region list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedSummary {
    pub text: String,
    #[serde(rename = "conf")]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub annotations: AnnotationMap,
    pub recognized_summary: RecognizedSummary,
    pub timestamp: DateTime<Utc>,
}

impl HistorySnapshot {
    pub fn capture(annotations: &AnnotationMap, recognized_summary: &RecognizedSummary) -> Self {
        Self {
            annotations: annotations.clone(),
            recognized_summary: recognized_summary.clone(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPosition {
    pub index: usize,
    pub length: usize,
}

impl HistoryPosition {
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.length
    }
}
