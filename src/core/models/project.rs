use serde::{Deserialize, Serialize};

use crate::core::models::{Annotation, Image};

/// One image of a stored project together with the annotations saved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub image: Image,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub tool: String,
    pub lang: String,
    pub timestamp: String,
}

/// Body of a ground-truth save for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthRecord {
    pub filename: String,
    pub project_id: String,
    pub image_id: String,
    pub annotations: Vec<Annotation>,
    pub meta: SaveMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::Shape;

    #[test]
    fn test_ground_truth_record_uses_wire_field_names() {
        let record = GroundTruthRecord {
            filename: "page.png".to_string(),
            project_id: "p1".to_string(),
            image_id: "img-1".to_string(),
            annotations: vec![Annotation::new(
                "a_1".to_string(),
                Shape::rectangle(1.0, 2.0, 3.0, 4.0),
            )],
            meta: SaveMetadata {
                tool: "Khmer Data Annotation Tool".to_string(),
                lang: "khm".to_string(),
                timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            },
        };

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["project_id"], "p1");
        assert_eq!(value["image_id"], "img-1");
        assert_eq!(value["meta"]["lang"], "khm");
        assert_eq!(value["annotations"][0]["type"], "box");
    }
}
