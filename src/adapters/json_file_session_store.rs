use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::core::interfaces::adapters::SessionSnapshotStore;
use crate::core::models::{SessionSnapshot, UserSettings};
use crate::global_constants;

/// Keeps the latest session snapshot as a JSON file next to the settings file.
pub struct JsonFileSessionStore {
    snapshot_path: PathBuf,
}

impl JsonFileSessionStore {
    pub fn new(snapshot_path: PathBuf) -> Self {
        Self { snapshot_path }
    }

    pub fn default_location() -> Result<Self> {
        let snapshot_path = UserSettings::get_config_dir()?.join(global_constants::AUTOSAVE_FILE_NAME);
        Ok(Self::new(snapshot_path))
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    fn get_temp_file_path(&self) -> PathBuf {
        self.snapshot_path.with_extension("json.tmp")
    }
}

#[async_trait]
impl SessionSnapshotStore for JsonFileSessionStore {
    async fn save_snapshot(&self, snapshot: &SessionSnapshot) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create autosave directory {:?}", parent))?;
        }

        let contents = serde_json::to_vec(snapshot)?;
        let temp_path = self.get_temp_file_path();
        tokio::fs::write(&temp_path, contents)
            .await
            .with_context(|| format!("Failed to write autosave to {:?}", temp_path))?;
        tokio::fs::rename(&temp_path, &self.snapshot_path)
            .await
            .with_context(|| format!("Failed to replace autosave at {:?}", self.snapshot_path))?;

        log::debug!("[AUTOSAVE] Wrote snapshot to {:?}", self.snapshot_path);
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<SessionSnapshot>> {
        if !tokio::fs::try_exists(&self.snapshot_path).await? {
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.snapshot_path)
            .await
            .with_context(|| format!("Failed to read autosave {:?}", self.snapshot_path))?;
        let snapshot: SessionSnapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Autosave {:?} is not a valid session", self.snapshot_path))?;

        log::info!("[AUTOSAVE] Loaded snapshot from {:?}", self.snapshot_path);
        Ok(Some(snapshot))
    }

    async fn clear_snapshot(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.snapshot_path).await? {
            tokio::fs::remove_file(&self.snapshot_path)
                .await
                .with_context(|| format!("Failed to remove autosave {:?}", self.snapshot_path))?;
            log::info!("[AUTOSAVE] Removed snapshot {:?}", self.snapshot_path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Annotation, AnnotationMap, Image, Shape};
    use crate::core::services::AnnotationStore;

    fn create_snapshot() -> SessionSnapshot {
        let image = Image::from_bytes("page.png", 20, 10, &[1, 2, 3]);
        let mut store = AnnotationStore::new();
        store.replace_all(
            &image.id,
            vec![Annotation::new("a_1".to_string(), Shape::rectangle(1.0, 1.0, 4.0, 4.0))],
        );

        SessionSnapshot {
            current_id: Some(image.id.clone()),
            images: vec![image],
            annotations: store.annotations().clone(),
            lang: "khm".to_string(),
        }
    }

    #[tokio::test]
    async fn test_load_without_file_returns_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::new(temp_dir.path().join("session.json"));

        let loaded = store.load_snapshot().await.unwrap();

        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_returns_same_snapshot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::new(temp_dir.path().join("nested").join("session.json"));
        let snapshot = create_snapshot();

        store.save_snapshot(&snapshot).await.unwrap();
        let loaded = store.load_snapshot().await.unwrap();

        assert_eq!(loaded, Some(snapshot));
        assert!(!store.get_temp_file_path().exists());
    }

    #[tokio::test]
    async fn test_saved_file_uses_camel_case_current_id() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::new(temp_dir.path().join("session.json"));

        store.save_snapshot(&create_snapshot()).await.unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.snapshot_path()).unwrap()).unwrap();

        assert!(raw.get("currentId").is_some());
        assert_eq!(raw["lang"], "khm");
        assert!(raw["annotations"].is_object());
    }

    #[tokio::test]
    async fn test_clear_removes_file_and_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::new(temp_dir.path().join("session.json"));
        store.save_snapshot(&SessionSnapshot::default()).await.unwrap();

        store.clear_snapshot().await.unwrap();
        store.clear_snapshot().await.unwrap();

        assert!(store.load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_as_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let snapshot_path = temp_dir.path().join("session.json");
        std::fs::write(&snapshot_path, "{not json").unwrap();
        let store = JsonFileSessionStore::new(snapshot_path);

        let result = store.load_snapshot().await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_snapshot_round_trips_empty_annotation_map() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = JsonFileSessionStore::new(temp_dir.path().join("session.json"));

        store.save_snapshot(&SessionSnapshot::default()).await.unwrap();

        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded.annotations, AnnotationMap::new());
        assert!(loaded.current_id.is_none());
    }
}
