mod project_repository;
mod recognition_service;
mod session_snapshot_store;

pub use project_repository::ProjectRepository;
pub use recognition_service::RecognitionService;
pub use session_snapshot_store::SessionSnapshotStore;
