use super::tts_repository::{base_language, TtsRepository};
use crate::domain::synthesis::SynthesisError;
use async_openai::{
    config::OpenAIConfig,
    types::{CreateSpeechRequest, SpeechModel, Voice},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI TTS implementation of TTS repository
pub struct OpenAiTtsRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
    default_voice: String,
}

impl OpenAiTtsRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String, default_voice: String) -> Self {
        Self {
            client,
            model,
            default_voice,
        }
    }

    /// Voice for a language. The model is multilingual, so unknown
    /// languages fall back to the neutral voice.
    fn voice_for_language(&self, language: &str) -> String {
        if !self.default_voice.is_empty() {
            return self.default_voice.clone();
        }

        match base_language(language).as_str() {
            "es" => "echo",
            "fr" => "nova",
            "de" => "onyx",
            "it" => "fable",
            "pt" => "shimmer",
            _ => "alloy",
        }
        .to_string()
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }

    async fn call_openai(&self, text: &str, voice: &str) -> Result<Vec<u8>, SynthesisError> {
        let voice_enum = match voice.to_lowercase().as_str() {
            "echo" => Voice::Echo,
            "fable" => Voice::Fable,
            "onyx" => Voice::Onyx,
            "nova" => Voice::Nova,
            "shimmer" => Voice::Shimmer,
            _ => Voice::Alloy,
        };

        let request = CreateSpeechRequest {
            model: self.speech_model(),
            input: text.to_string(),
            voice: voice_enum,
            response_format: None, // MP3
            speed: None,
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                voice = voice,
                text_length = text.chars().count(),
                "OpenAI TTS API call failed"
            );
            SynthesisError::SynthesisFailure(format!("OpenAI TTS error: {}", e))
        })?;

        Ok(response.bytes.to_vec())
    }
}

#[async_trait]
impl TtsRepository for OpenAiTtsRepository {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();
        let voice = self.voice_for_language(language);

        let audio_data = self.call_openai(text, &voice).await?;

        tracing::info!(
            provider = "openai",
            model = %self.model,
            voice = %voice,
            language = language,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.chars().count(),
            audio_size_bytes = audio_data.len(),
            "TTS synthesis completed"
        );

        Ok(audio_data)
    }
}
