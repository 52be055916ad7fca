use anyhow::Result;
use async_trait::async_trait;

use crate::core::models::{GroundTruthRecord, StoredImage};

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn save_ground_truth(&self, record: &GroundTruthRecord) -> Result<()>;

    async fn load_project(&self, project_id: &str) -> Result<Vec<StoredImage>>;
}
