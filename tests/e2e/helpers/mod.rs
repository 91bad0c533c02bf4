use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use voicecache_backend::{
    controllers::synthesis::SynthesisController,
    domain::synthesis::{AudioFormat, BackendSlot, SynthesisError, SynthesisService},
    infrastructure::{
        http::build_router,
        repositories::{ArtifactStore, TtsRepository},
    },
};

pub mod api_client;

use api_client::TestClient;

/// Speech backend double: returns `RIFF:<language>:<text>` after a delay
pub struct StubTtsRepository {
    calls: AtomicUsize,
    delay: Duration,
    failures_left: AtomicUsize,
}

impl StubTtsRepository {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            failures_left: AtomicUsize::new(0),
        }
    }

    pub fn fail_next(&self, times: usize) {
        self.failures_left.store(times, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn audio_for(text: &str, language: &str) -> Vec<u8> {
        format!("RIFF:{}:{}", language, text).into_bytes()
    }
}

#[async_trait]
impl TtsRepository for StubTtsRepository {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(SynthesisError::SynthesisFailure(
                "stub backend crashed".to_string(),
            ));
        }

        Ok(Self::audio_for(text, language))
    }
}

pub struct TestContext {
    pub client: TestClient,
    pub backend: Arc<StubTtsRepository>,
    pub slot: Arc<BackendSlot>,
    pub service: Arc<SynthesisService>,
    pub cache_dir: TempDir,
}

impl TestContext {
    /// Context whose backend is ready from the start
    pub async fn new() -> Result<Self> {
        let ctx = Self::unloaded().await?;
        ctx.slot.install(ctx.backend.clone());
        Ok(ctx)
    }

    /// Context whose backend has not been installed yet
    pub async fn unloaded() -> Result<Self> {
        let cache_dir = TempDir::new()?;
        let backend = Arc::new(StubTtsRepository::new(Duration::from_millis(150)));
        let slot = Arc::new(BackendSlot::new());

        let store = Arc::new(ArtifactStore::new(cache_dir.path(), AudioFormat::Wav));
        store.init().await?;

        let service = Arc::new(SynthesisService::new(
            slot.clone(),
            store,
            Duration::from_secs(10),
        ));
        let controller = Arc::new(SynthesisController::new(service.clone()));
        let app = build_router(service.clone(), controller);

        // Start server
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self {
            client: TestClient::new(&base_url),
            backend,
            slot,
            service,
            cache_dir,
        })
    }

    /// Number of committed artifacts in the cache directory
    pub fn artifact_count(&self) -> usize {
        std::fs::read_dir(self.cache_dir.path())
            .map(|entries| {
                entries
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.path().is_file())
                    .count()
            })
            .unwrap_or(0)
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            TestContext::new()
                .await
                .expect("Failed to start test server")
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {
            // TempDir removes the cache directory on drop
        }
    }
}
