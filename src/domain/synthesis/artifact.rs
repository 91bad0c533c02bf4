use super::key::CacheKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Container format of the cached audio, fixed by the configured backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A committed artifact: its key and where it lives on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub key: CacheKey,
    pub path: PathBuf,
    pub format: AudioFormat,
}

impl ArtifactLocation {
    /// File name under the cache directory, e.g. `<key>.wav`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.key, self.format.extension())
    }
}
