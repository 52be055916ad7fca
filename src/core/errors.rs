use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("recognition failed for image {image_id}: {reason}")]
    RecognitionFailed { image_id: String, reason: String },

    #[error("persistence failed: {0}")]
    PersistenceFailed(String),
}

impl SessionError {
    pub fn recognition_failed(image_id: &str, error: &anyhow::Error) -> Self {
        Self::RecognitionFailed {
            image_id: image_id.to_string(),
            reason: format!("{:#}", error),
        }
    }

    pub fn persistence_failed(error: &anyhow::Error) -> Self {
        Self::PersistenceFailed(format!("{:#}", error))
    }
}
