use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use std::sync::Arc;

use super::ARTIFACT_ROUTE_PREFIX;
use crate::{
    domain::synthesis::{
        SynthesisError, SynthesisRequest, SynthesisResult, SynthesisService, SynthesisServiceApi,
        SynthesizeResponse,
    },
    error::{AppError, AppResult},
};

pub struct SynthesisController {
    synthesis_service: Arc<SynthesisService>,
}

impl SynthesisController {
    pub fn new(synthesis_service: Arc<SynthesisService>) -> Self {
        Self { synthesis_service }
    }

    async fn resolve(&self, request: SynthesisRequest) -> AppResult<SynthesisResult> {
        request.validate()?;
        Ok(self.synthesis_service.synthesize(request).await?)
    }

    /// POST /synthesize - Synthesize (or reuse) audio and return its location
    pub async fn synthesize_json(
        State(controller): State<Arc<SynthesisController>>,
        Json(request): Json<SynthesisRequest>,
    ) -> AppResult<Json<SynthesizeResponse>> {
        let result = controller.resolve(request).await?;

        let message = if result.cached {
            "Audio retrieved from cache"
        } else {
            "Audio generated successfully"
        };

        Ok(Json(SynthesizeResponse {
            message: message.to_string(),
            output_file: format!(
                "{}/{}",
                ARTIFACT_ROUTE_PREFIX,
                result.location.file_name()
            ),
            cached: result.cached,
        }))
    }

    /// POST /api/audio - Synthesize (or reuse) audio and return the bytes
    pub async fn synthesize_audio(
        State(controller): State<Arc<SynthesisController>>,
        Json(request): Json<SynthesisRequest>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let result = controller.resolve(request).await?;
        let location = result.location;

        let audio = controller
            .synthesis_service
            .fetch_artifact(&location.key)
            .await?
            .ok_or_else(|| {
                // Cache cleared between commit and read
                AppError::from(SynthesisError::ArtifactIo(format!(
                    "artifact {} disappeared before it could be read",
                    location.key
                )))
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(location.format.content_type()),
        );
        let disposition = format!("attachment; filename=\"{}\"", location.file_name());
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        headers.insert(
            "x-audio-cached",
            HeaderValue::from_static(if result.cached { "true" } else { "false" }),
        );

        Ok((StatusCode::OK, headers, Body::from(audio)))
    }
}
