use anyhow::Result;
use async_trait::async_trait;

use crate::core::models::{RecognitionRequest, RecognizedRegion};

#[async_trait]
pub trait RecognitionService: Send + Sync {
    /// Returns one region per requested box, in request order.
    async fn recognize_regions(&self, request: &RecognitionRequest) -> Result<Vec<RecognizedRegion>>;
}
