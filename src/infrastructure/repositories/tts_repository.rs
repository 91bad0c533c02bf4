use crate::domain::synthesis::SynthesisError;
use async_trait::async_trait;

/// Repository for TTS synthesis operations.
/// Abstracts the underlying TTS provider (local command, AWS Polly, OpenAI, ...)
///
/// Implementations are responsible for:
/// - Provider-specific voice selection for the requested language
/// - Returning the complete audio stream in the format of their backend kind
/// - Keeping blocking work off the async executor
#[async_trait]
pub trait TtsRepository: Send + Sync {
    /// Short provider name used in logs and health output
    fn name(&self) -> &'static str;

    /// Synthesize text to speech for a given language code
    ///
    /// # Arguments
    /// * `text` - The validated text to synthesize
    /// * `language` - The requested language code (e.g. `pt`, `en`, `pt-BR`)
    ///
    /// # Errors
    /// `BackendUnavailable` when the provider cannot be reached or is missing
    /// resources, `SynthesisFailure` when it ran and failed
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// Primary subtag of a language code, lowercased (`pt-BR` -> `pt`)
pub fn base_language(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or(language)
        .to_ascii_lowercase()
}
