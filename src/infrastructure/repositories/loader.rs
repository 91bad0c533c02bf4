use super::{CommandTtsRepository, OpenAiTtsRepository, PollyTtsRepository, TtsRepository};
use crate::infrastructure::config::{BackendKind, Config};
use anyhow::Context;
use async_openai::{config::OpenAIConfig, Client as OpenAiClient};
use std::sync::Arc;

/// Build the configured speech backend.
///
/// May be slow (SDK credential discovery, program lookup), so the server
/// runs it after it started accepting requests.
pub async fn load_tts_repository(config: &Config) -> anyhow::Result<Arc<dyn TtsRepository>> {
    match config.tts_backend {
        BackendKind::Command => {
            let repo = CommandTtsRepository::load(
                &config.tts_command,
                config.tts_command_args.clone(),
                config.speaker_wav.clone(),
                config.cache_dir.join(".tmp"),
            )
            .context("failed to load local TTS command")?;
            Ok(Arc::new(repo))
        }
        BackendKind::Polly => {
            tracing::info!(region = %config.aws_region, "Initializing AWS Polly client");

            let has_access_key = std::env::var("AWS_ACCESS_KEY_ID").is_ok();
            let has_secret_key = std::env::var("AWS_SECRET_ACCESS_KEY").is_ok();
            if !has_access_key || !has_secret_key {
                tracing::warn!("AWS credentials not found in environment variables. Will attempt to use other credential providers (instance metadata, etc.)");
            }

            let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
                .region(aws_config::Region::new(config.aws_region.clone()))
                .load()
                .await;
            tracing::info!(region = ?aws_config.region(), "AWS configuration loaded");

            let client = aws_sdk_polly::Client::new(&aws_config);
            Ok(Arc::new(PollyTtsRepository::new(Arc::new(client))))
        }
        BackendKind::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .context("OPENAI_API_KEY is required when TTS_BACKEND=openai")?;

            let client = OpenAiClient::with_config(OpenAIConfig::new().with_api_key(api_key));
            Ok(Arc::new(OpenAiTtsRepository::new(
                Arc::new(client),
                config.openai_tts_model.clone(),
                config.openai_tts_voice.clone(),
            )))
        }
    }
}
