use crate::domain::synthesis::{ArtifactLocation, AudioFormat, CacheKey, SynthesisError};
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Subdirectory for in-progress writes. Lookups never look inside it.
const TMP_DIR: &str = ".tmp";

/// Summary of the cache directory, for the admin CLI
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub newest_entry: Option<DateTime<Utc>>,
}

/// On-disk store of synthesized audio, one file per cache key.
///
/// Artifacts are written to a temporary file and renamed into place, so a
/// lookup sees either nothing or the complete file.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    cache_dir: PathBuf,
    format: AudioFormat,
}

impl ArtifactStore {
    pub fn new(cache_dir: impl Into<PathBuf>, format: AudioFormat) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            format,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Create the cache directory layout if it is missing
    pub async fn init(&self) -> Result<(), SynthesisError> {
        tokio::fs::create_dir_all(self.tmp_dir())
            .await
            .map_err(|e| {
                SynthesisError::ArtifactIo(format!(
                    "failed to create cache directory {}: {}",
                    self.cache_dir.display(),
                    e
                ))
            })
    }

    /// Canonical location of the artifact for `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", key, self.format.extension()))
    }

    /// Return the committed artifact for `key`, if any.
    ///
    /// Keys whose synthesis is still pending are reported as missing.
    pub async fn lookup(&self, key: &CacheKey) -> Option<ArtifactLocation> {
        let path = self.path_for(key);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(self.location(key, path)),
            Ok(_) => None,
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(cache_key = %key, error = %e, "Artifact lookup failed");
                }
                None
            }
        }
    }

    /// Durably store `audio` under `key`.
    ///
    /// On failure nothing is left at the canonical path.
    pub async fn commit(
        &self,
        key: &CacheKey,
        audio: &[u8],
    ) -> Result<ArtifactLocation, SynthesisError> {
        self.init().await?;

        let final_path = self.path_for(key);
        let tmp_path = self
            .tmp_dir()
            .join(format!("{}.{}.part", key, Uuid::new_v4()));

        if let Err(e) = write_then_rename(&tmp_path, &final_path, audio).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(
                        path = %tmp_path.display(),
                        error = %cleanup,
                        "Failed to remove temporary artifact"
                    );
                }
            }
            tracing::error!(cache_key = %key, error = %e, "Artifact commit failed");
            return Err(SynthesisError::ArtifactIo(format!(
                "failed to store artifact {}: {}",
                key, e
            )));
        }

        tracing::info!(
            cache_key = %key,
            size_bytes = audio.len(),
            path = %final_path.display(),
            "Artifact committed to cache"
        );

        Ok(self.location(key, final_path))
    }

    /// Read the committed artifact for `key`
    pub async fn read(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, SynthesisError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SynthesisError::ArtifactIo(format!(
                "failed to read artifact {}: {}",
                key, e
            ))),
        }
    }

    /// Delete every cached artifact and leftover temporary file.
    ///
    /// Administrative operation; returns the number of artifacts removed.
    pub async fn clear(&self) -> std::io::Result<usize> {
        let mut removed = 0;

        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.cache_dir.display(),
                    "Cache directory not found, nothing to clear"
                );
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            tokio::fs::remove_file(entry.path()).await?;
            tracing::debug!(path = %entry.path().display(), "Removed cached artifact");
            if artifact_key(&entry.path()).is_some() {
                removed += 1;
            }
        }

        match tokio::fs::remove_dir_all(self.tmp_dir()).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        tracing::info!(removed, path = %self.cache_dir.display(), "Audio cache cleared");
        Ok(removed)
    }

    /// Count artifacts and their total size
    pub async fn stats(&self) -> std::io::Result<CacheStats> {
        let mut stats = CacheStats::default();

        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(stats),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            if artifact_key(&entry.path()).is_none() {
                continue;
            }
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            stats.entries += 1;
            stats.total_bytes += meta.len();
            if let Ok(modified) = meta.modified() {
                let modified = DateTime::<Utc>::from(modified);
                stats.newest_entry = Some(match stats.newest_entry {
                    Some(current) if current > modified => current,
                    _ => modified,
                });
            }
        }

        Ok(stats)
    }

    fn tmp_dir(&self) -> PathBuf {
        self.cache_dir.join(TMP_DIR)
    }

    fn location(&self, key: &CacheKey, path: PathBuf) -> ArtifactLocation {
        ArtifactLocation {
            key: key.clone(),
            path,
            format: self.format,
        }
    }
}

async fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp, target).await
}

/// Key of an artifact file name (`<key>.<ext>`), if it is one
fn artifact_key(path: &Path) -> Option<CacheKey> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(CacheKey::parse)
}
