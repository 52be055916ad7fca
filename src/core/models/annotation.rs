use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::models::Shape;
use crate::core::services::similarity_scorer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    #[serde(flatten)]
    pub shape: Shape,
    #[serde(default)]
    text: String,
    #[serde(default, rename = "gt")]
    ground_truth: String,
    #[serde(default)]
    accuracy: Option<f64>,
    #[serde(default)]
    pub label: String,
}

impl Annotation {
    pub fn new(id: String, shape: Shape) -> Self {
        Self {
            id,
            shape,
            text: String::new(),
            ground_truth: String::new(),
            accuracy: None,
            label: String::new(),
        }
    }

    /// `a_<unix millis>_<4 hex chars>`; callers retry on the rare collision.
    pub fn generate_id() -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("a_{}_{}", chrono::Utc::now().timestamp_millis(), &suffix[..4])
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn ground_truth(&self) -> &str {
        &self.ground_truth
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.refresh_accuracy();
    }

    pub fn set_ground_truth(&mut self, ground_truth: impl Into<String>) {
        self.ground_truth = ground_truth.into();
        self.refresh_accuracy();
    }

    pub fn apply_patch(&mut self, patch: AnnotationPatch) {
        let AnnotationPatch {
            shape,
            text,
            ground_truth,
            label,
        } = patch;

        if let Some(shape) = shape {
            self.shape = shape;
        }
        if let Some(label) = label {
            self.label = label;
        }
        if let Some(text) = text {
            self.text = text;
        }
        if let Some(ground_truth) = ground_truth {
            self.ground_truth = ground_truth;
        }

        self.refresh_accuracy();
    }

    pub fn refresh_accuracy(&mut self) {
        self.accuracy = if self.ground_truth.is_empty() {
            None
        } else {
            Some(similarity_scorer::similarity(&self.text, &self.ground_truth))
        };
    }
}

/// Fields a caller may change on an existing annotation. Accuracy is absent on purpose:
/// it is always derived from `text` and `ground_truth`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationPatch {
    pub shape: Option<Shape>,
    pub text: Option<String>,
    pub ground_truth: Option<String>,
    pub label: Option<String>,
}

impl AnnotationPatch {
    pub fn with_shape(shape: Shape) -> Self {
        Self {
            shape: Some(shape),
            ..Default::default()
        }
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_ground_truth(ground_truth: impl Into<String>) -> Self {
        Self {
            ground_truth: Some(ground_truth.into()),
            ..Default::default()
        }
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }
}

/// Image id to ordered annotation list. Lists are shared between the live map and
/// history snapshots until one side writes, at which point the writer gets its own copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationMap {
    lists: BTreeMap<String, Arc<Vec<Annotation>>>,
}

impl AnnotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, image_id: &str) -> &[Annotation] {
        self.lists
            .get(image_id)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn find(&self, image_id: &str, annotation_id: &str) -> Option<&Annotation> {
        self.get(image_id)
            .iter()
            .find(|annotation| annotation.id == annotation_id)
    }

    pub fn contains_image(&self, image_id: &str) -> bool {
        self.lists.contains_key(image_id)
    }

    pub fn image_ids(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    pub fn total_annotations(&self) -> usize {
        self.lists.values().map(|list| list.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_annotations() == 0
    }

    pub fn mean_accuracy(&self, image_id: &str) -> Option<f64> {
        let scores: Vec<f64> = self
            .get(image_id)
            .iter()
            .filter_map(Annotation::accuracy)
            .collect();

        if scores.is_empty() {
            return None;
        }

        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }

    pub(crate) fn list_mut(&mut self, image_id: &str) -> &mut Vec<Annotation> {
        let shared = self.lists.entry(image_id.to_string()).or_default();
        Arc::make_mut(shared)
    }

    pub(crate) fn existing_list_mut(&mut self, image_id: &str) -> Option<&mut Vec<Annotation>> {
        self.lists.get_mut(image_id).map(Arc::make_mut)
    }

    pub(crate) fn set_list(&mut self, image_id: &str, annotations: Vec<Annotation>) {
        self.lists
            .insert(image_id.to_string(), Arc::new(annotations));
    }

    pub(crate) fn remove_image(&mut self, image_id: &str) -> bool {
        self.lists.remove(image_id).is_some()
    }

    /// Drops every image entry `keep` rejects and returns how many went.
    pub(crate) fn retain_images(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.lists.len();
        self.lists.retain(|image_id, _| keep(image_id));
        before - self.lists.len()
    }

    pub(crate) fn shares_list_with(&self, other: &AnnotationMap, image_id: &str) -> bool {
        match (self.lists.get(image_id), other.lists.get(image_id)) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Point;

    fn create_test_annotation(id: &str) -> Annotation {
        Annotation::new(id.to_string(), Shape::rectangle(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn test_new_annotation_starts_with_empty_text_and_no_accuracy() {
        let annotation = create_test_annotation("a_1");

        assert_eq!(annotation.text(), "");
        assert_eq!(annotation.ground_truth(), "");
        assert_eq!(annotation.accuracy(), None);
        assert_eq!(annotation.label, "");
    }

    #[test]
    fn test_matching_khmer_ground_truth_scores_perfect_accuracy() {
        let mut annotation = create_test_annotation("a_1");
        annotation.set_text("ល្អ");

        annotation.set_ground_truth("ល្អ");

        assert_eq!(annotation.accuracy(), Some(1.0));
    }

    #[test]
    fn test_clearing_ground_truth_removes_accuracy() {
        let mut annotation = create_test_annotation("a_1");
        annotation.set_text("ល្អ");
        annotation.set_ground_truth("ល្អ");

        annotation.set_ground_truth("");

        assert_eq!(annotation.accuracy(), None);
    }

    #[test]
    fn test_changing_text_recomputes_accuracy() {
        let mut annotation = create_test_annotation("a_1");
        annotation.set_ground_truth("abc");

        annotation.set_text("abd");

        let accuracy = annotation.accuracy().unwrap();
        assert!((accuracy - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_apply_patch_merges_only_supplied_fields() {
        let mut annotation = create_test_annotation("a_1");
        annotation.set_text("hello");

        annotation.apply_patch(AnnotationPatch::with_label("title"));

        assert_eq!(annotation.label, "title");
        assert_eq!(annotation.text(), "hello");
        assert_eq!(annotation.shape, Shape::rectangle(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_generate_id_has_expected_prefix_and_suffix_length() {
        let id = Annotation::generate_id();
        let parts: Vec<&str> = id.split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "a");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
    }

    #[test]
    fn test_annotation_serializes_with_short_wire_field_names() {
        let mut annotation = Annotation::new(
            "a_1".to_string(),
            Shape::polygon(vec![Point::new(1.0, 2.0)]),
        );
        annotation.set_text("x");
        annotation.set_ground_truth("x");

        let serialized = serde_json::to_value(&annotation).unwrap();

        assert_eq!(serialized["type"], "polygon");
        assert_eq!(serialized["gt"], "x");
        assert_eq!(serialized["accuracy"], 1.0);
        assert_eq!(serialized["points"][0]["x"], 1.0);
        assert!(serialized.get("ground_truth").is_none());
    }

    #[test]
    fn test_annotation_deserializes_with_missing_optional_fields() {
        let json = r#"{"id":"a_9","type":"box","rect":{"x":1,"y":1,"w":2,"h":2}}"#;

        let annotation: Annotation = serde_json::from_str(json).unwrap();

        assert_eq!(annotation.id, "a_9");
        assert_eq!(annotation.text(), "");
        assert_eq!(annotation.accuracy(), None);
    }

    #[test]
    fn test_get_returns_empty_slice_for_unknown_image() {
        let map = AnnotationMap::new();

        assert!(map.get("missing").is_empty());
        assert!(map.is_empty());
    }

    #[test]
    fn test_clone_shares_lists_until_written() {
        let mut map = AnnotationMap::new();
        map.list_mut("img").push(create_test_annotation("a_1"));
        let snapshot = map.clone();

        assert!(map.shares_list_with(&snapshot, "img"));

        map.list_mut("img").push(create_test_annotation("a_2"));

        assert!(!map.shares_list_with(&snapshot, "img"));
        assert_eq!(snapshot.get("img").len(), 1);
        assert_eq!(map.get("img").len(), 2);
    }

    #[test]
    fn test_mean_accuracy_ignores_annotations_without_ground_truth() {
        let mut map = AnnotationMap::new();
        let mut scored = create_test_annotation("a_1");
        scored.set_text("abc");
        scored.set_ground_truth("abc");
        let mut half = create_test_annotation("a_2");
        half.set_text("ab");
        half.set_ground_truth("cd");
        map.set_list(
            "img",
            vec![scored, half, create_test_annotation("a_3")],
        );

        assert_eq!(map.mean_accuracy("img"), Some(0.5));
        assert_eq!(map.mean_accuracy("other"), None);
    }
}
