pub mod image_service;
pub mod llm_service;
pub mod normalizer;
pub mod output_writer;
pub mod processing_log;
pub mod prompt;
pub mod sanitizer;

pub use image_service::ImageService;
pub use llm_service::{LlmService, ModelClient};
pub use normalizer::{normalize_question, normalize_response, QuestionShape};
pub use output_writer::CombinedOutput;
pub use processing_log::ProcessingLog;
pub use sanitizer::{sanitize, SanitizeState, Sanitized};
