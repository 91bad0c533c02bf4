use crate::error::AppError;

/// Classified failure of a synthesis round.
///
/// Values are cloned to every caller waiting on the same cache key, so the
/// payloads are plain strings rather than source errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("synthesis failed: {0}")]
    SynthesisFailure(String),
    #[error("artifact I/O failed: {0}")]
    ArtifactIo(String),
}

impl From<SynthesisError> for AppError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Validation(msg) => AppError::BadRequest(msg),
            SynthesisError::BackendUnavailable(msg) => AppError::BackendUnavailable(msg),
            SynthesisError::SynthesisFailure(msg) => AppError::SynthesisFailed(msg),
            SynthesisError::ArtifactIo(msg) => AppError::Storage(msg),
        }
    }
}
