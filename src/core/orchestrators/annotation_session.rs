use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::errors::SessionError;
use crate::core::interfaces::adapters::{ProjectRepository, RecognitionService, SessionSnapshotStore};
use crate::core::models::{
    Annotation, AnnotationMap, AnnotationPatch, BatchProgress, BatchReport, DatasetExport,
    ExportMetadata, ExportedImage, GroundTruthRecord, HistoryPosition, Image, RecognizedSummary,
    SaveMetadata, SessionSnapshot, Shape, UserSettings,
};
use crate::core::orchestrators::recognition_orchestrator::{
    RecognitionOrchestrator, RecognitionWorkspace,
};
use crate::core::services::{AnnotationStore, HistoryManager};
use crate::global_constants;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Empty,
    Active,
}

enum AutosaveJob {
    Save(SessionSnapshot),
    Clear,
}

/// Everything the presentation layer drives: images, their annotations, undo history and
/// recognition. While `Active`, `current_id` always names an image in `images`.
pub struct AnnotationSession {
    settings: UserSettings,
    project_id: Option<String>,
    language: String,
    images: Vec<Image>,
    current_id: Option<String>,
    store: AnnotationStore,
    history: HistoryManager,
    recognized_summary: RecognizedSummary,
    batch_progress: BatchProgress,
    recognition_orchestrator: RecognitionOrchestrator,
    project_repository: Arc<dyn ProjectRepository>,
    snapshot_store: Arc<dyn SessionSnapshotStore>,
    pending_autosave: Option<JoinHandle<()>>,
}

impl AnnotationSession {
    pub fn build(
        recognition_service: Arc<dyn RecognitionService>,
        project_repository: Arc<dyn ProjectRepository>,
        snapshot_store: Arc<dyn SessionSnapshotStore>,
        settings: UserSettings,
    ) -> Self {
        let store = AnnotationStore::new();
        let recognized_summary = RecognizedSummary::default();
        let history = HistoryManager::new(store.annotations(), &recognized_summary);

        log::info!("[SESSION] Creating annotation session (lang={})", settings.language);

        Self {
            language: settings.language.clone(),
            settings,
            project_id: None,
            images: Vec::new(),
            current_id: None,
            store,
            history,
            recognized_summary,
            batch_progress: BatchProgress::idle(),
            recognition_orchestrator: RecognitionOrchestrator::new(recognition_service),
            project_repository,
            snapshot_store,
            pending_autosave: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.images.is_empty() {
            SessionState::Empty
        } else {
            SessionState::Active
        }
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    pub fn current_image(&self) -> Option<&Image> {
        let current_id = self.current_id.as_deref()?;
        self.images.iter().find(|image| image.id == current_id)
    }

    pub fn annotations(&self) -> &AnnotationMap {
        self.store.annotations()
    }

    pub fn current_annotations(&self) -> &[Annotation] {
        match self.current_id.as_deref() {
            Some(current_id) => self.store.annotations().get(current_id),
            None => &[],
        }
    }

    pub fn history_position(&self) -> HistoryPosition {
        self.history.position()
    }

    pub fn batch_progress(&self) -> BatchProgress {
        self.batch_progress
    }

    pub fn recognized_summary(&self) -> &RecognizedSummary {
        &self.recognized_summary
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    // ---- images ----

    pub fn add_images(&mut self, images: Vec<Image>) -> usize {
        let mut added = 0;

        for image in images {
            if self.images.iter().any(|existing| existing.id == image.id) {
                log::debug!("[SESSION] Image {} already present, skipping", image.id);
                continue;
            }
            self.images.push(image);
            added += 1;
        }

        if self.current_id.is_none() {
            self.current_id = self.images.first().map(|image| image.id.clone());
        }

        log::info!(
            "[SESSION] Added {} images ({} total)",
            added,
            self.images.len()
        );
        self.autosave();
        added
    }

    pub fn select_image(&mut self, image_id: &str) -> bool {
        if !self.images.iter().any(|image| image.id == image_id) {
            log::debug!("[SESSION] Select ignored, image {} not found", image_id);
            return false;
        }

        self.current_id = Some(image_id.to_string());
        self.autosave();
        true
    }

    pub fn select_next_image(&mut self) -> bool {
        self.select_relative(1)
    }

    pub fn select_previous_image(&mut self) -> bool {
        self.select_relative(-1)
    }

    fn select_relative(&mut self, step: isize) -> bool {
        let Some(index) = self.current_index() else {
            return false;
        };

        let count = self.images.len() as isize;
        let target = (index as isize + step).rem_euclid(count) as usize;
        self.current_id = Some(self.images[target].id.clone());
        self.autosave();
        true
    }

    fn current_index(&self) -> Option<usize> {
        let current_id = self.current_id.as_deref()?;
        self.images.iter().position(|image| image.id == current_id)
    }

    /// Drops an image and its annotations. A removed current image is replaced by the
    /// first remaining one; removing the last image empties the session.
    pub fn remove_image(&mut self, image_id: &str) -> bool {
        let Some(index) = self.images.iter().position(|image| image.id == image_id) else {
            log::debug!("[SESSION] Remove ignored, image {} not found", image_id);
            return false;
        };

        self.images.remove(index);

        if self.store.annotations().contains_image(image_id) {
            self.store.remove_image(image_id);
            self.commit();
        }

        if self.current_id.as_deref() == Some(image_id) {
            self.current_id = self.images.first().map(|image| image.id.clone());
            log::info!(
                "[SESSION] Current image removed, now showing {:?}",
                self.current_id
            );
        }

        self.autosave();
        true
    }

    // ---- annotations ----

    pub fn add_annotation(&mut self, shape: Shape) -> Option<Annotation> {
        let current_id = self.current_id.clone()?;
        let annotation = self.store.add(&current_id, shape);
        self.commit();
        self.autosave();
        Some(annotation)
    }

    pub fn update_annotation(&mut self, annotation_id: &str, patch: AnnotationPatch) -> &AnnotationMap {
        if let Some(current_id) = self.current_id.clone() {
            self.store.update(&current_id, annotation_id, patch);
            self.commit();
            self.autosave();
        }
        self.store.annotations()
    }

    pub fn delete_annotation(&mut self, annotation_id: &str) -> &AnnotationMap {
        if let Some(current_id) = self.current_id.clone() {
            self.store.remove(&current_id, annotation_id);
            self.commit();
            self.autosave();
        }
        self.store.annotations()
    }

    pub fn replace_annotations(&mut self, annotations: Vec<Annotation>) -> &AnnotationMap {
        if let Some(current_id) = self.current_id.clone() {
            self.store.replace_all(&current_id, annotations);
            self.commit();
            self.autosave();
        }
        self.store.annotations()
    }

    pub fn set_ground_truth(&mut self, annotation_id: &str, ground_truth: &str) -> &AnnotationMap {
        self.update_annotation(annotation_id, AnnotationPatch::with_ground_truth(ground_truth))
    }

    pub fn set_label(&mut self, annotation_id: &str, label: &str) -> &AnnotationMap {
        self.update_annotation(annotation_id, AnnotationPatch::with_label(label))
    }

    pub fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
        self.autosave();
    }

    // ---- recognition ----

    pub async fn recognize_current(&mut self) -> Result<&AnnotationMap, SessionError> {
        match self.current_id.clone() {
            Some(current_id) => self.recognize_one(&current_id).await,
            None => Ok(self.store.annotations()),
        }
    }

    pub async fn recognize_one(&mut self, image_id: &str) -> Result<&AnnotationMap, SessionError> {
        let project_id = self.recognition_project_id();
        let Some(image) = self.images.iter().find(|image| image.id == image_id) else {
            log::debug!("[SESSION] Recognition ignored, image {} not found", image_id);
            return Ok(self.store.annotations());
        };

        let mut workspace = RecognitionWorkspace {
            store: &mut self.store,
            history: &mut self.history,
            recognized_summary: &mut self.recognized_summary,
        };

        let recognized = self
            .recognition_orchestrator
            .recognize_one(&project_id, image, &mut workspace)
            .await?;

        if recognized {
            self.autosave();
        }
        Ok(self.store.annotations())
    }

    /// Recognizes the given images in order. Unknown ids are ignored and do not count
    /// towards the progress total.
    pub async fn recognize_batch(
        &mut self,
        image_ids: &[String],
        cancel_token: &CancellationToken,
        on_progress: impl FnMut(&BatchProgress),
    ) -> BatchReport {
        let project_id = self.recognition_project_id();
        let images: Vec<&Image> = image_ids
            .iter()
            .filter_map(|image_id| self.images.iter().find(|image| &image.id == image_id))
            .collect();

        let mut workspace = RecognitionWorkspace {
            store: &mut self.store,
            history: &mut self.history,
            recognized_summary: &mut self.recognized_summary,
        };

        let report = self
            .recognition_orchestrator
            .recognize_batch(
                &project_id,
                &images,
                &mut workspace,
                &mut self.batch_progress,
                cancel_token,
                on_progress,
            )
            .await;

        if !report.recognized.is_empty() {
            self.autosave();
        }
        report
    }

    pub async fn recognize_all(
        &mut self,
        cancel_token: &CancellationToken,
        on_progress: impl FnMut(&BatchProgress),
    ) -> BatchReport {
        let image_ids: Vec<String> = self.images.iter().map(|image| image.id.clone()).collect();
        self.recognize_batch(&image_ids, cancel_token, on_progress)
            .await
    }

    fn recognition_project_id(&self) -> String {
        self.project_id
            .clone()
            .unwrap_or_else(|| global_constants::LOCAL_PROJECT_ID.to_string())
    }

    // ---- history ----

    pub fn undo(&mut self) -> &AnnotationMap {
        let restored = self
            .history
            .undo()
            .map(|snapshot| (snapshot.annotations.clone(), snapshot.recognized_summary.clone()));

        if let Some((annotations, recognized_summary)) = restored {
            self.store.restore(annotations);
            self.drop_orphan_annotations();
            self.recognized_summary = recognized_summary;
            self.autosave();
        }
        self.store.annotations()
    }

    pub fn redo(&mut self) -> &AnnotationMap {
        let restored = self
            .history
            .redo()
            .map(|snapshot| (snapshot.annotations.clone(), snapshot.recognized_summary.clone()));

        if let Some((annotations, recognized_summary)) = restored {
            self.store.restore(annotations);
            self.drop_orphan_annotations();
            self.recognized_summary = recognized_summary;
            self.autosave();
        }
        self.store.annotations()
    }

    fn commit(&mut self) {
        self.history
            .commit(self.store.annotations(), &self.recognized_summary);
    }

    /// History only tracks annotations, so a restored map may name images that were
    /// removed since. Those entries are dropped.
    fn drop_orphan_annotations(&mut self) {
        let images = &self.images;
        self.store
            .retain_images(|image_id| images.iter().any(|image| image.id == image_id));
    }

    pub fn clear_all(&mut self) {
        log::info!("[SESSION] Clearing session");

        self.images.clear();
        self.current_id = None;
        self.store.clear();
        self.recognized_summary = RecognizedSummary::default();
        self.history
            .reset(self.store.annotations(), &self.recognized_summary);
        self.batch_progress = BatchProgress::idle();

        self.schedule_persistence(AutosaveJob::Clear);
    }

    // ---- persistence ----

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            images: self.images.clone(),
            annotations: self.store.annotations().clone(),
            current_id: self.current_id.clone(),
            lang: self.language.clone(),
        }
    }

    fn autosave(&mut self) {
        if !self.settings.autosave_enabled {
            return;
        }

        let snapshot = self.snapshot();
        self.schedule_persistence(AutosaveJob::Save(snapshot));
    }

    /// Runs the write on a background task. Each job waits for the one before it, so
    /// the store always ends up holding the newest snapshot.
    fn schedule_persistence(&mut self, job: AutosaveJob) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log::warn!("[AUTOSAVE] No async runtime available, snapshot not persisted");
            return;
        };

        let store = Arc::clone(&self.snapshot_store);
        let previous = self.pending_autosave.take();

        self.pending_autosave = Some(runtime.spawn(async move {
            if let Some(previous) = previous {
                if let Err(error) = previous.await {
                    log::warn!("[AUTOSAVE] Previous autosave task failed: {}", error);
                }
            }

            let result = match &job {
                AutosaveJob::Save(snapshot) => store.save_snapshot(snapshot).await,
                AutosaveJob::Clear => store.clear_snapshot().await,
            };

            match result {
                Ok(()) => log::debug!("[AUTOSAVE] Session snapshot persisted"),
                Err(error) => log::warn!("[AUTOSAVE] {}", SessionError::persistence_failed(&error)),
            }
        }));
    }

    /// Waits until every scheduled autosave has reached the store.
    pub async fn flush_autosave(&mut self) {
        if let Some(pending) = self.pending_autosave.take() {
            if let Err(error) = pending.await {
                log::warn!("[AUTOSAVE] Autosave task failed: {}", error);
            }
        }
    }

    /// Reloads the last autosaved session. The restored state becomes the undo baseline.
    pub async fn restore_autosave(&mut self) -> bool {
        self.flush_autosave().await;

        match self.snapshot_store.load_snapshot().await {
            Ok(Some(snapshot)) => {
                log::info!(
                    "[SESSION] Restoring autosaved session with {} images",
                    snapshot.images.len()
                );
                self.apply_snapshot(snapshot);
                true
            }
            Ok(None) => {
                log::info!("[SESSION] No autosaved session found");
                false
            }
            Err(error) => {
                log::warn!("[AUTOSAVE] {}", SessionError::persistence_failed(&error));
                false
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: SessionSnapshot) {
        let SessionSnapshot {
            images,
            annotations,
            current_id,
            lang,
        } = snapshot;

        self.images = images;
        self.language = lang;
        self.current_id = current_id
            .filter(|id| self.images.iter().any(|image| &image.id == id))
            .or_else(|| self.images.first().map(|image| image.id.clone()));
        self.store.restore(annotations);
        self.drop_orphan_annotations();
        self.recognized_summary = RecognizedSummary::default();
        self.history
            .reset(self.store.annotations(), &self.recognized_summary);
        self.batch_progress = BatchProgress::idle();
    }

    /// Loads a stored project, replacing whatever the session held. Load failures are
    /// logged and leave the session as it was.
    pub async fn open_project(&mut self, project_id: &str) -> usize {
        log::info!("[SESSION] Opening project {}", project_id);

        let stored_images = match self.project_repository.load_project(project_id).await {
            Ok(stored_images) => stored_images,
            Err(error) => {
                log::error!("[SESSION] {}", SessionError::persistence_failed(&error));
                return 0;
            }
        };

        self.project_id = Some(project_id.to_string());
        self.images.clear();
        self.store.clear();

        for stored in stored_images {
            if self.images.iter().any(|image| image.id == stored.image.id) {
                log::warn!(
                    "[SESSION] Project {} lists image {} twice, keeping the first",
                    project_id,
                    stored.image.id
                );
                continue;
            }
            self.store.replace_all(&stored.image.id, stored.annotations);
            self.images.push(stored.image);
        }

        self.current_id = self.images.first().map(|image| image.id.clone());
        self.recognized_summary = RecognizedSummary::default();
        self.history
            .reset(self.store.annotations(), &self.recognized_summary);
        self.batch_progress = BatchProgress::idle();

        log::info!(
            "[SESSION] Project {} loaded with {} images",
            project_id,
            self.images.len()
        );
        self.autosave();
        self.images.len()
    }

    /// Sends the current image's annotations to the project service in the background.
    /// The returned handle may be dropped; failures are only logged.
    pub fn save_current_image(&self) -> Option<JoinHandle<()>> {
        let image = self.current_image()?;

        let record = GroundTruthRecord {
            filename: if image.name.is_empty() {
                global_constants::UNKNOWN_FILE_NAME.to_string()
            } else {
                image.name.clone()
            },
            project_id: self.recognition_project_id(),
            image_id: image.id.clone(),
            annotations: self.store.annotations().get(&image.id).to_vec(),
            meta: SaveMetadata {
                tool: self.settings.tool_name.clone(),
                lang: self.language.clone(),
                timestamp: chrono::Utc::now().to_rfc3339(),
            },
        };

        let repository = Arc::clone(&self.project_repository);
        log::info!("[SESSION] Saving ground truth for image {}", record.image_id);

        Some(tokio::spawn(async move {
            match repository.save_ground_truth(&record).await {
                Ok(()) => log::info!("[SESSION] Ground truth saved for image {}", record.image_id),
                Err(error) => log::warn!("[SESSION] {}", SessionError::persistence_failed(&error)),
            }
        }))
    }

    pub fn export_dataset(&self) -> DatasetExport {
        DatasetExport {
            meta: ExportMetadata {
                name: self.settings.tool_name.clone(),
                lang: self.language.clone(),
                exported_at: chrono::Utc::now().to_rfc3339(),
            },
            images: self
                .images
                .iter()
                .map(|image| ExportedImage {
                    id: image.id.clone(),
                    name: image.name.clone(),
                    width: image.width,
                    height: image.height,
                    annotations: self.store.annotations().get(&image.id).to_vec(),
                })
                .collect(),
        }
    }
}
