use super::backend::BackendSlot;
use super::coordinator::{LeaderGuard, Role, SynthesisCoordinator};
use super::dto::SynthesisRequest;
use super::error::SynthesisError;
use super::key::CacheKey;
use super::{ArtifactLocation, AudioFormat};
use crate::infrastructure::repositories::{ArtifactStore, TtsRepository};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult {
    pub location: ArtifactLocation,
    /// True when the artifact was already on disk before this request
    pub cached: bool,
}

pub struct SynthesisService {
    backend: Arc<BackendSlot>,
    store: Arc<ArtifactStore>,
    coordinator: SynthesisCoordinator,
    attempt_timeout: Duration,
}

impl SynthesisService {
    pub fn new(
        backend: Arc<BackendSlot>,
        store: Arc<ArtifactStore>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            store,
            coordinator: SynthesisCoordinator::new(attempt_timeout),
            attempt_timeout,
        }
    }

    pub fn backend(&self) -> &BackendSlot {
        &self.backend
    }

    /// Number of cache keys currently being synthesized
    pub fn pending_syntheses(&self) -> usize {
        self.coordinator.pending_count()
    }
}

#[async_trait]
pub trait SynthesisServiceApi: Send + Sync {
    /// Resolve a validated request to a cached audio artifact
    ///
    /// This operation:
    /// - Serves the artifact from disk when it was synthesized before
    /// - Otherwise runs at most one synthesis per cache key, shared by all
    ///   concurrent callers for that key
    /// - Commits the audio atomically before reporting success
    async fn synthesize(&self, request: SynthesisRequest)
        -> Result<SynthesisResult, SynthesisError>;

    /// Read a committed artifact. Only typed keys are accepted, never paths.
    async fn fetch_artifact(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, SynthesisError>;

    /// Format of every artifact this service produces
    fn artifact_format(&self) -> AudioFormat;
}

#[async_trait]
impl SynthesisServiceApi for SynthesisService {
    async fn synthesize(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisResult, SynthesisError> {
        let key = CacheKey::derive(&request.text, &request.language);

        tracing::info!(
            cache_key = %key,
            language = %request.language,
            text_length = request.text.chars().count(),
            "Synthesis request"
        );

        // 1. Serve from disk when possible
        if let Some(location) = self.store.lookup(&key).await {
            tracing::info!(cache_key = %key, "Audio cache hit");
            return Ok(SynthesisResult {
                location,
                cached: true,
            });
        }

        // 2. Fail fast while the backend is not loaded
        let backend = self.backend.get()?;

        // 3. Lead a new round or join the one in flight
        let outcome = match self.coordinator.acquire_or_wait(&key) {
            Role::Leader(guard) => {
                let ticket = guard.subscribe();
                tokio::spawn(run_attempt(
                    guard,
                    backend,
                    self.store.clone(),
                    request,
                    self.attempt_timeout,
                ));
                ticket.wait().await
            }
            Role::Follower(ticket) => {
                tracing::info!(cache_key = %key, "Waiting for in-flight synthesis");
                ticket.wait().await
            }
        };

        outcome.map(|location| SynthesisResult {
            location,
            cached: false,
        })
    }

    async fn fetch_artifact(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, SynthesisError> {
        self.store.read(key).await
    }

    fn artifact_format(&self) -> AudioFormat {
        self.store.format()
    }
}

/// Leader side of a round. Runs detached from the requesting task so that a
/// client disconnect does not cancel work other callers are waiting on.
async fn run_attempt(
    guard: LeaderGuard,
    backend: Arc<dyn TtsRepository>,
    store: Arc<ArtifactStore>,
    request: SynthesisRequest,
    attempt_timeout: Duration,
) {
    let key = guard.key().clone();
    let start_time = Instant::now();

    // The timeout bounds synthesis only; commit always runs to completion
    let produced = match tokio::time::timeout(
        attempt_timeout,
        produce(&key, backend.as_ref(), &store, &request),
    )
    .await
    {
        Ok(produced) => produced,
        Err(_) => Err(SynthesisError::SynthesisFailure(format!(
            "synthesis did not complete within {:?}",
            attempt_timeout
        ))),
    };

    let outcome = match produced {
        Ok(Produced::Cached(location)) => Ok(location),
        Ok(Produced::Audio(audio)) => store.commit(&key, &audio).await,
        Err(err) => Err(err),
    };

    match &outcome {
        Ok(location) => tracing::info!(
            cache_key = %key,
            provider = backend.name(),
            latency_ms = start_time.elapsed().as_millis(),
            path = %location.path.display(),
            "Synthesis round completed"
        ),
        Err(err) => tracing::error!(
            cache_key = %key,
            provider = backend.name(),
            latency_ms = start_time.elapsed().as_millis(),
            error = %err,
            "Synthesis round failed"
        ),
    }

    guard.release(outcome);
}

enum Produced {
    /// A previous round committed between our lookup and taking the lead
    Cached(ArtifactLocation),
    Audio(Vec<u8>),
}

async fn produce(
    key: &CacheKey,
    backend: &dyn TtsRepository,
    store: &ArtifactStore,
    request: &SynthesisRequest,
) -> Result<Produced, SynthesisError> {
    if let Some(location) = store.lookup(key).await {
        return Ok(Produced::Cached(location));
    }

    let audio = backend
        .synthesize(&request.text, &request.language)
        .await?;

    if audio.is_empty() {
        return Err(SynthesisError::SynthesisFailure(
            "backend returned no audio".to_string(),
        ));
    }

    Ok(Produced::Audio(audio))
}
