pub const APPLICATION_NAME: &str = "annotate-ocr";
pub const APPLICATION_DIR_NAME: &str = "annotate-ocr";
pub const TOOL_NAME: &str = "Khmer Data Annotation Tool";

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const AUTOSAVE_FILE_NAME: &str = "session.json";

pub const DEFAULT_RECOGNITION_SERVICE_URL: &str = "http://127.0.0.1:8000/images/";
pub const DEFAULT_PROJECT_SERVICE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_LANGUAGE: &str = "khm";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;

/// Project id sent to the recognition service when the session was not opened from a project.
pub const LOCAL_PROJECT_ID: &str = "local";

pub const HISTORY_LIMIT: usize = 50;

pub const UNKNOWN_FILE_NAME: &str = "unknown.png";
