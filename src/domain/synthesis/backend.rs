use super::error::SynthesisError;
use crate::infrastructure::repositories::TtsRepository;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};

/// Process-wide holder of the speech backend.
///
/// Starts empty and is filled once, after the backend finished loading.
/// Until then every synthesis attempt fails fast with `BackendUnavailable`.
#[derive(Default)]
pub struct BackendSlot {
    backend: OnceLock<Arc<dyn TtsRepository>>,
    load_error: RwLock<Option<String>>,
}

impl BackendSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that is ready from the start
    pub fn ready(backend: Arc<dyn TtsRepository>) -> Self {
        let slot = Self::new();
        slot.install(backend);
        slot
    }

    /// Publish the loaded backend. Later calls are ignored.
    pub fn install(&self, backend: Arc<dyn TtsRepository>) {
        let name = backend.name();
        if self.backend.set(backend).is_err() {
            tracing::warn!(backend = name, "Speech backend already installed, ignoring");
            return;
        }
        *self.load_error.write() = None;
        tracing::info!(backend = name, "Speech backend ready");
    }

    /// Record why loading failed, for health reporting
    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(reason = %reason, "Speech backend failed to load");
        *self.load_error.write() = Some(reason);
    }

    pub fn get(&self) -> Result<Arc<dyn TtsRepository>, SynthesisError> {
        self.backend.get().cloned().ok_or_else(|| {
            let reason = match self.load_error.read().as_deref() {
                Some(err) => format!("speech backend failed to load: {}", err),
                None => "speech backend is still loading".to_string(),
            };
            SynthesisError::BackendUnavailable(reason)
        })
    }

    pub fn is_ready(&self) -> bool {
        self.backend.get().is_some()
    }

    pub fn name(&self) -> Option<&'static str> {
        self.backend.get().map(|b| b.name())
    }

    pub fn load_error(&self) -> Option<String> {
        self.load_error.read().clone()
    }
}
