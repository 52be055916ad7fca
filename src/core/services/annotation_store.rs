use crate::core::models::{Annotation, AnnotationMap, AnnotationPatch, Shape};

/// Owns the per-image annotation lists. Never touches history: callers decide when a
/// group of mutations becomes one undo step.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: AnnotationMap,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(annotations: AnnotationMap) -> Self {
        Self { annotations }
    }

    pub fn annotations(&self) -> &AnnotationMap {
        &self.annotations
    }

    pub fn add(&mut self, image_id: &str, shape: Shape) -> Annotation {
        let list = self.annotations.list_mut(image_id);

        let mut id = Annotation::generate_id();
        while list.iter().any(|existing| existing.id == id) {
            id = Annotation::generate_id();
        }

        let annotation = Annotation::new(id, shape);
        list.push(annotation.clone());

        log::debug!(
            "[STORE] Added annotation {} to image {} ({} total)",
            annotation.id,
            image_id,
            list.len()
        );

        annotation
    }

    pub fn update(
        &mut self,
        image_id: &str,
        annotation_id: &str,
        patch: AnnotationPatch,
    ) -> &AnnotationMap {
        let target = self
            .annotations
            .existing_list_mut(image_id)
            .and_then(|list| list.iter_mut().find(|annotation| annotation.id == annotation_id));

        match target {
            Some(annotation) => {
                annotation.apply_patch(patch);
                log::debug!("[STORE] Updated annotation {} on image {}", annotation_id, image_id);
            }
            None => {
                log::debug!(
                    "[STORE] Update skipped, annotation {} not found on image {}",
                    annotation_id,
                    image_id
                );
            }
        }

        &self.annotations
    }

    pub fn remove(&mut self, image_id: &str, annotation_id: &str) -> &AnnotationMap {
        let present = self
            .annotations
            .find(image_id, annotation_id)
            .is_some();

        if present {
            if let Some(list) = self.annotations.existing_list_mut(image_id) {
                list.retain(|annotation| annotation.id != annotation_id);
            }
            log::debug!("[STORE] Removed annotation {} from image {}", annotation_id, image_id);
        } else {
            log::debug!(
                "[STORE] Remove skipped, annotation {} not found on image {}",
                annotation_id,
                image_id
            );
        }

        &self.annotations
    }

    /// Bulk path for JSON edits and server loads. Accuracy is recomputed for every record.
    pub fn replace_all(&mut self, image_id: &str, annotations: Vec<Annotation>) -> &AnnotationMap {
        let annotations: Vec<Annotation> = annotations
            .into_iter()
            .map(|mut annotation| {
                annotation.refresh_accuracy();
                annotation
            })
            .collect();

        log::debug!(
            "[STORE] Replaced annotations of image {} with {} records",
            image_id,
            annotations.len()
        );

        self.annotations.set_list(image_id, annotations);
        &self.annotations
    }

    pub fn remove_image(&mut self, image_id: &str) -> &AnnotationMap {
        if self.annotations.remove_image(image_id) {
            log::debug!("[STORE] Dropped annotations of image {}", image_id);
        }
        &self.annotations
    }

    pub fn retain_images(&mut self, keep: impl FnMut(&str) -> bool) -> &AnnotationMap {
        let dropped = self.annotations.retain_images(keep);
        if dropped > 0 {
            log::debug!("[STORE] Dropped annotations of {} unknown images", dropped);
        }
        &self.annotations
    }

    pub fn clear(&mut self) -> &AnnotationMap {
        self.annotations = AnnotationMap::new();
        &self.annotations
    }

    /// Swaps in a map taken from history.
    pub fn restore(&mut self, annotations: AnnotationMap) -> &AnnotationMap {
        self.annotations = annotations;
        &self.annotations
    }
}
