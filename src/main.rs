use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicecache_backend::controllers::synthesis::SynthesisController;
use voicecache_backend::domain::synthesis::{BackendSlot, SynthesisService};
use voicecache_backend::infrastructure::config::{Config, LogFormat};
use voicecache_backend::infrastructure::http::{build_router, start_http_server};
use voicecache_backend::infrastructure::repositories::{load_tts_repository, ArtifactStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting VoiceCache Backend on {}:{}",
        config.host,
        config.port
    );
    tracing::info!(
        development = config.is_development(),
        backend = ?config.tts_backend,
        cache_dir = %config.cache_dir.display(),
        timeout_secs = config.synthesis_timeout_secs,
        "Synthesis configuration"
    );

    // Prepare the artifact cache; its format follows the backend kind
    let store = Arc::new(ArtifactStore::new(
        config.cache_dir.clone(),
        config.audio_format(),
    ));
    store.init().await?;
    tracing::info!("Audio cache directory ready");

    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Backend slot, filled once the backend finished loading
    let backend = Arc::new(BackendSlot::new());

    // 2. Instantiate services
    tracing::info!("Instantiating services...");
    let synthesis_service = Arc::new(SynthesisService::new(
        backend.clone(),
        store,
        config.synthesis_timeout(),
    ));

    // 3. Instantiate controllers
    tracing::info!("Instantiating controllers...");
    let synthesis_controller = Arc::new(SynthesisController::new(synthesis_service.clone()));

    // Load the backend in the background; cache hits are served meanwhile
    {
        let config = config.clone();
        tokio::spawn(async move {
            tracing::info!("Loading speech backend...");
            match load_tts_repository(&config).await {
                Ok(repo) => backend.install(repo),
                Err(e) => backend.mark_failed(format!("{:#}", e)),
            }
        });
    }

    // Start HTTP server with all routes
    let app = build_router(synthesis_service, synthesis_controller);
    start_http_server(config, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voicecache_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voicecache_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
