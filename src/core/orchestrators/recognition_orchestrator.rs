use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::errors::SessionError;
use crate::core::interfaces::adapters::RecognitionService;
use crate::core::models::{
    Annotation, BatchProgress, BatchReport, Image, RecognitionRequest, RecognizedRegion,
    RecognizedSummary,
};
use crate::core::services::{geometry_adapter, AnnotationStore, HistoryManager};

/// The mutable session parts a recognition run writes into.
pub struct RecognitionWorkspace<'a> {
    pub store: &'a mut AnnotationStore,
    pub history: &'a mut HistoryManager,
    pub recognized_summary: &'a mut RecognizedSummary,
}

impl RecognitionWorkspace<'_> {
    fn commit(&mut self) {
        self.history
            .commit(self.store.annotations(), self.recognized_summary);
    }
}

/// Recognized annotations for one image, not yet merged into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecognition {
    pub annotations: Vec<Annotation>,
    pub summary: RecognizedSummary,
}

pub struct RecognitionOrchestrator {
    recognition_service: Arc<dyn RecognitionService>,
}

impl RecognitionOrchestrator {
    pub fn new(recognition_service: Arc<dyn RecognitionService>) -> Self {
        Self {
            recognition_service,
        }
    }

    /// Recognizes every annotation of `image` and commits one history snapshot.
    /// Returns `Ok(false)` when the image has nothing to recognize.
    pub async fn recognize_one(
        &self,
        project_id: &str,
        image: &Image,
        workspace: &mut RecognitionWorkspace<'_>,
    ) -> Result<bool, SessionError> {
        let outcome = self
            .recognize_image(project_id, image, workspace.store.annotations().get(&image.id))
            .await?;

        let Some(outcome) = outcome else {
            return Ok(false);
        };

        workspace.store.replace_all(&image.id, outcome.annotations);
        *workspace.recognized_summary = outcome.summary;
        workspace.commit();

        log::info!("[RECOGNITION] Recognition complete for image {}", image.id);
        Ok(true)
    }

    /// Runs images strictly one after another. A failing image is reported and skipped;
    /// cancellation is checked between images, never mid-request. The whole run is a
    /// single history step.
    pub async fn recognize_batch(
        &self,
        project_id: &str,
        images: &[&Image],
        workspace: &mut RecognitionWorkspace<'_>,
        progress: &mut BatchProgress,
        cancel_token: &CancellationToken,
        mut on_progress: impl FnMut(&BatchProgress),
    ) -> BatchReport {
        let total = images.len();
        let mut report = BatchReport::default();

        log::info!("[RECOGNITION] Starting batch recognition of {} images", total);
        *progress = BatchProgress::started(total);
        on_progress(progress);

        for (index, image) in images.iter().enumerate() {
            if cancel_token.is_cancelled() {
                log::info!(
                    "[RECOGNITION] Batch cancelled after {} of {} images",
                    index,
                    total
                );
                report.cancelled = true;
                break;
            }

            let outcome = self
                .recognize_image(project_id, image, workspace.store.annotations().get(&image.id))
                .await;

            match outcome {
                Ok(Some(recognition)) => {
                    workspace.store.replace_all(&image.id, recognition.annotations);
                    *workspace.recognized_summary = recognition.summary;
                    report.recognized.push(image.id.clone());
                }
                Ok(None) => {
                    report.skipped.push(image.id.clone());
                }
                Err(error) => {
                    log::warn!("[RECOGNITION] Batch item failed: {}", error);
                    report.failed.push(error);
                }
            }

            *progress = BatchProgress::advanced(index + 1, total);
            on_progress(progress);
        }

        if !report.recognized.is_empty() {
            workspace.commit();
        }

        *progress = BatchProgress::idle();
        on_progress(progress);

        log::info!(
            "[RECOGNITION] Batch finished: {} recognized, {} skipped, {} failed",
            report.recognized.len(),
            report.skipped.len(),
            report.failed.len()
        );

        report
    }

    /// Sends one request for all of an image's annotations and zips the answers back by
    /// position. Leaves the store untouched; returns `None` for an image with no annotations.
    pub async fn recognize_image(
        &self,
        project_id: &str,
        image: &Image,
        annotations: &[Annotation],
    ) -> Result<Option<ImageRecognition>, SessionError> {
        if annotations.is_empty() {
            log::debug!("[RECOGNITION] Image {} has no annotations, skipping", image.id);
            return Ok(None);
        }

        let boxes = annotations
            .iter()
            .map(|annotation| geometry_adapter::to_bounding_box(&annotation.shape))
            .collect::<Result<Vec<_>, _>>()?;

        let payload = image
            .payload()
            .map_err(|error| SessionError::recognition_failed(&image.id, &error))?;

        let request = RecognitionRequest {
            project_id: project_id.to_string(),
            file_name: image.name.clone(),
            mime_type: image.mime_type().to_string(),
            image: payload,
            boxes,
        };

        log::info!(
            "[RECOGNITION] Requesting {} regions for image {}",
            request.boxes.len(),
            image.id
        );

        let regions = self
            .recognition_service
            .recognize_regions(&request)
            .await
            .map_err(|error| SessionError::recognition_failed(&image.id, &error))?;

        if regions.len() != annotations.len() {
            log::warn!(
                "[RECOGNITION] Image {}: sent {} boxes but received {} results",
                image.id,
                annotations.len(),
                regions.len()
            );
        }

        let updated: Vec<Annotation> = annotations
            .iter()
            .enumerate()
            .map(|(index, annotation)| {
                let text = regions
                    .get(index)
                    .map(|region| region.extracted_text.trim())
                    .unwrap_or("");
                let mut updated = annotation.clone();
                updated.set_text(text);
                updated
            })
            .collect();

        let summary = Self::summarize(&updated, &regions);

        Ok(Some(ImageRecognition {
            annotations: updated,
            summary,
        }))
    }

    fn summarize(annotations: &[Annotation], regions: &[RecognizedRegion]) -> RecognizedSummary {
        let text = annotations
            .iter()
            .map(Annotation::text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let confidences: Vec<f32> = regions.iter().filter_map(|region| region.confidence).collect();
        let confidence = if confidences.is_empty() {
            None
        } else {
            Some(confidences.iter().sum::<f32>() / confidences.len() as f32)
        };

        RecognizedSummary { text, confidence }
    }
}
