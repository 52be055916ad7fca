mod annotation;
mod batch_progress;
mod history;
mod image;
mod project;
mod recognition;
mod session_snapshot;
mod shape;
mod user_settings;

pub use annotation::{Annotation, AnnotationMap, AnnotationPatch};
pub use batch_progress::{BatchProgress, BatchReport};
pub use history::{HistoryPosition, HistorySnapshot, RecognizedSummary};
pub use image::{Image, ImagePayload};
pub use project::{GroundTruthRecord, SaveMetadata, StoredImage};
pub use recognition::{RecognitionRequest, RecognizedRegion};
pub use session_snapshot::{DatasetExport, ExportMetadata, ExportedImage, SessionSnapshot};
pub use shape::{BoundingBox, Point, Rect, Shape};
pub use user_settings::UserSettings;
