pub mod artifacts;
pub mod health;
pub mod synthesis;

/// URL prefix under which committed artifacts are served
pub const ARTIFACT_ROUTE_PREFIX: &str = "cached_audio";
