use anyhow::Result;
use async_trait::async_trait;

use crate::core::models::SessionSnapshot;

#[async_trait]
pub trait SessionSnapshotStore: Send + Sync {
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<()>;

    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>>;

    async fn clear_snapshot(&self) -> Result<()>;
}
