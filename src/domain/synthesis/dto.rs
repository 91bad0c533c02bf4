use super::error::SynthesisError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const MIN_TEXT_CHARS: usize = 1;
/// Longest accepted text, in characters
pub const MAX_TEXT_CHARS: usize = 1000;
const MIN_LANGUAGE_CHARS: usize = 2;
const MAX_LANGUAGE_CHARS: usize = 5;

/// Request for POST /synthesize and POST /api/audio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub language: String,
}

/// Response for POST /synthesize
#[derive(Debug, Serialize, Deserialize)]
pub struct SynthesizeResponse {
    pub message: String,
    /// Relative URL of the artifact, e.g. `cached_audio/<key>.wav`
    pub output_file: String,
    pub cached: bool,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
        }
    }

    /// Check the request shape before it reaches the cache.
    ///
    /// Lengths are counted in characters, not bytes.
    pub fn validate(&self) -> Result<(), SynthesisError> {
        let text_chars = self.text.chars().count();
        if text_chars < MIN_TEXT_CHARS {
            return Err(SynthesisError::Validation(
                "Text cannot be empty".to_string(),
            ));
        }
        if text_chars > MAX_TEXT_CHARS {
            return Err(SynthesisError::Validation(format!(
                "Text must be {} characters or less (got {})",
                MAX_TEXT_CHARS, text_chars
            )));
        }

        let language_chars = self.language.chars().count();
        if !(MIN_LANGUAGE_CHARS..=MAX_LANGUAGE_CHARS).contains(&language_chars) {
            return Err(SynthesisError::Validation(format!(
                "Language code must be between {} and {} characters",
                MIN_LANGUAGE_CHARS, MAX_LANGUAGE_CHARS
            )));
        }
        if !language_pattern().is_match(&self.language) {
            return Err(SynthesisError::Validation(format!(
                "Invalid language code: {}. Expected e.g. 'pt', 'en' or 'pt-BR'",
                self.language
            )));
        }

        Ok(())
    }
}

/// ISO 639 code with an optional region suffix: `pt`, `pt-BR`, `zh_CN`
fn language_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z]{2,3}([-_][A-Za-z0-9]{1,2})?$").unwrap())
}
