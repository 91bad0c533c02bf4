use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
};
use std::sync::Arc;

use crate::{
    domain::synthesis::{AudioFormat, CacheKey, SynthesisService, SynthesisServiceApi},
    error::{AppError, AppResult},
};

/// GET /cached_audio/:file_name - Serve a committed artifact.
///
/// Only names of the form `<key>.<ext>` are accepted; anything else is a 404
/// without touching the filesystem.
pub async fn get_artifact(
    State(service): State<Arc<SynthesisService>>,
    Path(file_name): Path<String>,
) -> AppResult<(StatusCode, HeaderMap, Body)> {
    let format = service.artifact_format();
    let key = parse_artifact_name(&file_name, format)
        .ok_or_else(|| AppError::NotFound("Cached audio file not found".to_string()))?;

    let audio = service
        .fetch_artifact(&key)
        .await?
        .ok_or_else(|| AppError::NotFound("Cached audio file not found".to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );

    Ok((StatusCode::OK, headers, Body::from(audio)))
}

fn parse_artifact_name(file_name: &str, format: AudioFormat) -> Option<CacheKey> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if extension != format.extension() {
        return None;
    }
    CacheKey::parse(stem)
}
