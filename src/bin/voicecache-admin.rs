//! voicecache-admin - out-of-band maintenance of the audio cache
//!
//! Works directly on the cache directory; the server does not need to run.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use voicecache_backend::domain::synthesis::CacheKey;
use voicecache_backend::infrastructure::config::BackendKind;
use voicecache_backend::infrastructure::repositories::ArtifactStore;

/// Maintenance utility for the VoiceCache audio cache
#[derive(Parser, Debug)]
#[command(name = "voicecache-admin")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cache directory to operate on
    #[arg(long, global = true, env = "CACHE_DIR", default_value = "cached_audio")]
    cache_dir: PathBuf,

    /// Backend kind, which decides the artifact extension
    #[arg(long, global = true, env = "TTS_BACKEND", default_value = "command")]
    backend: BackendKind,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Delete every cached artifact and stale temporary file
    Clear,

    /// Show entry count and total size
    Stats,

    /// Print the cache key and artifact path for a request
    Key {
        /// Text to synthesize
        #[arg(long)]
        text: String,
        /// Language code, e.g. pt or pt-BR
        #[arg(long)]
        language: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voicecache_backend=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let store = ArtifactStore::new(cli.cache_dir.clone(), cli.backend.format());

    match cli.command {
        Commands::Clear => {
            let removed = store.clear().await?;
            println!(
                "Removed {} cached artifact(s) from {}",
                removed,
                store.cache_dir().display()
            );
        }
        Commands::Stats => {
            let stats = store.stats().await?;
            println!("Cache directory: {}", store.cache_dir().display());
            println!("Entries:         {}", stats.entries);
            println!("Total size:      {} bytes", stats.total_bytes);
            match stats.newest_entry {
                Some(newest) => println!("Newest entry:    {}", newest.to_rfc3339()),
                None => println!("Newest entry:    -"),
            }
        }
        Commands::Key { text, language } => {
            let key = CacheKey::derive(&text, &language);
            println!("{}", key);
            println!("{}", store.path_for(&key).display());
        }
    }

    Ok(())
}
