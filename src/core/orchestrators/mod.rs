pub mod annotation_session;
pub mod recognition_orchestrator;

pub use annotation_session::{AnnotationSession, SessionState};
pub use recognition_orchestrator::{ImageRecognition, RecognitionOrchestrator, RecognitionWorkspace};
