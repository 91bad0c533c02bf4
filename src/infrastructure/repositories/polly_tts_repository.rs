use super::tts_repository::{base_language, TtsRepository};
use crate::domain::synthesis::SynthesisError;
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, OutputFormat, VoiceId},
    Client as PollyClient,
};
use std::sync::Arc;

/// AWS Polly implementation of TTS repository
pub struct PollyTtsRepository {
    polly_client: Arc<PollyClient>,
}

impl PollyTtsRepository {
    pub fn new(polly_client: Arc<PollyClient>) -> Self {
        Self { polly_client }
    }

    /// Select the neural Polly voice for a language code
    fn voice_for_language(language: &str) -> Option<&'static str> {
        let voice = match base_language(language).as_str() {
            "en" => "Joanna",
            "es" => "Lupe",
            "fr" => "Lea",
            "de" => "Vicki",
            "it" => "Bianca",
            "pt" => "Ines",
            "nl" => "Laura",
            "pl" => "Ola",
            "ja" => "Takumi",
            "ko" => "Seoyeon",
            "zh" => "Zhiyu",
            _ => return None,
        };
        Some(voice)
    }

    async fn call_polly(&self, text: &str, voice_name: &str) -> Result<Vec<u8>, SynthesisError> {
        let voice_id = VoiceId::from(voice_name);

        tracing::debug!(
            voice = voice_name,
            engine = "neural",
            output_format = "Mp3",
            text_length = text.chars().count(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly_client
            .synthesize_speech()
            .text(text)
            .voice_id(voice_id)
            .output_format(OutputFormat::Mp3)
            .engine(Engine::Neural)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    error_display = %e,
                    voice = voice_name,
                    text_length = text.chars().count(),
                    "AWS Polly synthesize_speech failed"
                );
                SynthesisError::SynthesisFailure(format!("AWS Polly error: {}", e))
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to collect audio stream from Polly response");
            SynthesisError::SynthesisFailure(format!("failed to read Polly audio stream: {}", e))
        })?;

        Ok(audio_stream.into_bytes().to_vec())
    }
}

#[async_trait]
impl TtsRepository for PollyTtsRepository {
    fn name(&self) -> &'static str {
        "polly"
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();

        let voice = Self::voice_for_language(language).ok_or_else(|| {
            SynthesisError::SynthesisFailure(format!(
                "no Polly voice available for language '{}'",
                language
            ))
        })?;

        let audio_data = self.call_polly(text, voice).await?;

        tracing::info!(
            provider = "polly",
            language = language,
            voice = voice,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.chars().count(),
            audio_size_bytes = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(audio_data)
    }
}
