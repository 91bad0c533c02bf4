pub mod artifact;
pub mod backend;
pub mod coordinator;
pub mod dto;
pub mod error;
pub mod key;
pub mod service;

pub use artifact::{ArtifactLocation, AudioFormat};
pub use backend::BackendSlot;
pub use coordinator::{FollowerTicket, LeaderGuard, Role, SynthesisCoordinator, SynthesisOutcome};
pub use dto::{SynthesisRequest, SynthesizeResponse, MAX_TEXT_CHARS};
pub use error::SynthesisError;
pub use key::CacheKey;
pub use service::{SynthesisResult, SynthesisService, SynthesisServiceApi};
