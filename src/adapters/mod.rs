mod http_project_repository;
mod http_recognition_service;
mod json_file_session_store;

pub use http_project_repository::HttpProjectRepository;
pub use http_recognition_service::HttpRecognitionService;
pub use json_file_session_store::JsonFileSessionStore;
