pub mod artifact_store;
pub mod command_tts_repository;
pub mod loader;
pub mod openai_tts_repository;
pub mod polly_tts_repository;
pub mod tts_repository;

pub use artifact_store::{ArtifactStore, CacheStats};
pub use command_tts_repository::CommandTtsRepository;
pub use loader::load_tts_repository;
pub use openai_tts_repository::OpenAiTtsRepository;
pub use polly_tts_repository::PollyTtsRepository;
pub use tts_repository::TtsRepository;
