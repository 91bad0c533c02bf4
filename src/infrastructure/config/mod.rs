use crate::domain::synthesis::AudioFormat;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Audio cache
    pub cache_dir: PathBuf,
    pub synthesis_timeout_secs: u64,
    // Speech backend
    pub tts_backend: BackendKind,
    pub tts_command: String,
    pub tts_command_args: Vec<String>,
    pub speaker_wav: Option<PathBuf>,
    pub aws_region: String,
    pub openai_api_key: Option<String>,
    pub openai_tts_model: String,
    pub openai_tts_voice: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Which speech engine synthesizes audio
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Command,
    Polly,
    OpenAi,
}

impl BackendKind {
    /// Audio format the backend produces, fixed for the lifetime of the cache
    pub fn format(&self) -> AudioFormat {
        match self {
            BackendKind::Command => AudioFormat::Wav,
            BackendKind::Polly | BackendKind::OpenAi => AudioFormat::Mp3,
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "command" => Ok(BackendKind::Command),
            "polly" => Ok(BackendKind::Polly),
            "openai" => Ok(BackendKind::OpenAi),
            other => Err(format!(
                "unknown TTS_BACKEND '{}', expected command, polly or openai",
                other
            )),
        }
    }
}

const DEFAULT_COMMAND_ARGS: &str = "--model voice.onnx --output_file {output}";

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source
    pub fn from_lookup(
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let or = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let config = Config {
            host: or("HOST", "0.0.0.0"),
            port: or("PORT", "5001").parse()?,
            environment: match or("ENVIRONMENT", "development").as_str() {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match or("LOG_FORMAT", "pretty").as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            cache_dir: PathBuf::from(or("CACHE_DIR", "cached_audio")),
            synthesis_timeout_secs: or("SYNTHESIS_TIMEOUT_SECS", "300").parse()?,
            tts_backend: or("TTS_BACKEND", "command").parse::<BackendKind>()?,
            tts_command: or("TTS_COMMAND", "piper"),
            tts_command_args: or("TTS_COMMAND_ARGS", DEFAULT_COMMAND_ARGS)
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            speaker_wav: non_empty("SPEAKER_WAV").map(PathBuf::from),
            aws_region: or("AWS_REGION", "eu-west-1"),
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_tts_model: or("OPENAI_TTS_MODEL", "tts-1"),
            openai_tts_voice: or("OPENAI_TTS_VOICE", ""),
        };

        if config.synthesis_timeout_secs == 0 {
            return Err("SYNTHESIS_TIMEOUT_SECS must be greater than zero".into());
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Upper bound for one synthesis round and for every caller waiting on it
    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }

    pub fn audio_format(&self) -> AudioFormat {
        self.tts_backend.format()
    }
}
