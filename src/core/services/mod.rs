pub mod annotation_store;
pub mod geometry_adapter;
pub mod history_manager;
pub mod similarity_scorer;

pub use annotation_store::AnnotationStore;
pub use history_manager::HistoryManager;
