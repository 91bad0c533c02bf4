use crate::e2e::helpers;

use helpers::{assertions::assert_synthesize_response, StubTtsRepository, TestContext};
use hyper::StatusCode;
use serde_json::json;
use test_context::test_context;
use voicecache_backend::domain::synthesis::{CacheKey, SynthesizeResponse};

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_synthesize_then_serve_from_cache(ctx: &TestContext) {
    let request = json!({ "text": "Olá mundo", "language": "pt" });

    let first = ctx.client.post("/synthesize", &request).await.unwrap();
    first.assert_status(StatusCode::OK);
    let output_file = assert_synthesize_response(first.body.as_ref().unwrap(), false);

    let key = CacheKey::derive("Olá mundo", "pt");
    assert_eq!(output_file, format!("cached_audio/{}.wav", key));
    assert_eq!(
        std::fs::read(ctx.cache_dir.path().join(format!("{}.wav", key))).unwrap(),
        StubTtsRepository::audio_for("Olá mundo", "pt")
    );

    let second = ctx.client.post("/synthesize", &request).await.unwrap();
    second.assert_status(StatusCode::OK);
    let cached = second.json::<SynthesizeResponse>().unwrap();
    assert!(cached.cached);
    assert_eq!(cached.output_file, output_file);

    assert_eq!(ctx.backend.calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_audio_bytes_with_attachment_headers(ctx: &TestContext) {
    let response = ctx
        .client
        .post("/api/audio", &json!({ "text": "hello world", "language": "en" }))
        .await
        .unwrap();

    let key = CacheKey::derive("hello world", "en");
    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/wav")
        .assert_header(
            "content-disposition",
            &format!("attachment; filename=\"{}.wav\"", key),
        )
        .assert_header("x-audio-cached", "false");
    assert_eq!(
        response.body_bytes,
        StubTtsRepository::audio_for("hello world", "en")
    );

    let again = ctx
        .client
        .post("/api/audio", &json!({ "text": "hello world", "language": "en" }))
        .await
        .unwrap();
    again.assert_header("x-audio-cached", "true");
    assert_eq!(again.body_bytes, response.body_bytes);
    assert_eq!(ctx.backend.calls(), 1);
}

#[tokio::test]
async fn it_should_synthesize_once_for_concurrent_identical_requests() {
    let ctx = TestContext::new().await.unwrap();
    let mut futures = Vec::new();
    for _ in 0..12 {
        let client = ctx.client.clone();
        futures.push(async move {
            client
                .post("/synthesize", &json!({ "text": "same words", "language": "en" }))
                .await
        });
    }

    let results = futures::future::join_all(futures).await;

    let mut output_files = Vec::new();
    for result in results {
        let response = result.unwrap();
        response.assert_status(StatusCode::OK);
        output_files.push(response.json::<SynthesizeResponse>().unwrap().output_file);
    }

    output_files.dedup();
    assert_eq!(output_files.len(), 1, "all callers should get the same artifact");
    assert_eq!(ctx.backend.calls(), 1);
    assert_eq!(ctx.artifact_count(), 1);
    assert_eq!(ctx.service.pending_syntheses(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_distinct_requests_apart(ctx: &TestContext) {
    let requests = [
        json!({ "text": "hello", "language": "en" }),
        json!({ "text": "hello", "language": "pt" }),
        json!({ "text": "en", "language": "pt" }),
        json!({ "text": "pt", "language": "en" }),
    ];

    let mut output_files = Vec::new();
    for request in &requests {
        let response = ctx.client.post("/synthesize", request).await.unwrap();
        response.assert_status(StatusCode::OK);
        output_files.push(response.json::<SynthesizeResponse>().unwrap().output_file);
    }

    output_files.sort();
    output_files.dedup();
    assert_eq!(output_files.len(), requests.len());
    assert_eq!(ctx.backend.calls(), requests.len());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_recover_after_a_failed_synthesis(ctx: &TestContext) {
    ctx.backend.fail_next(1);
    let request = json!({ "text": "flaky", "language": "en" });

    let failed = ctx.client.post("/synthesize", &request).await.unwrap();
    failed
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_error_message("stub backend crashed");
    assert_eq!(ctx.artifact_count(), 0);

    let retried = ctx.client.post("/synthesize", &request).await.unwrap();
    retried.assert_status(StatusCode::OK);
    assert_synthesize_response(retried.body.as_ref().unwrap(), false);
    assert_eq!(ctx.backend.calls(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_invalid_requests(ctx: &TestContext) {
    let cases = [
        (json!({ "text": "", "language": "en" }), "empty"),
        (json!({ "text": "a".repeat(1001), "language": "en" }), "1000 characters"),
        (json!({ "text": "hello", "language": "e" }), "between 2 and 5"),
        (json!({ "text": "hello", "language": "english" }), "between 2 and 5"),
        (json!({ "text": "hello", "language": "../x" }), "Invalid language"),
    ];

    for (body, message) in cases {
        let response = ctx.client.post("/synthesize", &body).await.unwrap();
        response
            .assert_status(StatusCode::BAD_REQUEST)
            .assert_error_message(message);
    }

    assert_eq!(ctx.backend.calls(), 0);
    assert_eq!(ctx.artifact_count(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_accept_text_at_the_length_limit(ctx: &TestContext) {
    let text = "é".repeat(1000);
    let response = ctx
        .client
        .post("/synthesize", &json!({ "text": text, "language": "pt-BR" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_json(ctx: &TestContext) {
    let response = ctx.client.post_raw("/synthesize", "{not json").await.unwrap();
    assert!(response.status.is_client_error());

    let missing_field = ctx
        .client
        .post("/synthesize", &json!({ "text": "hello" }))
        .await
        .unwrap();
    assert!(missing_field.status.is_client_error());
    assert_eq!(ctx.backend.calls(), 0);
}

#[tokio::test]
async fn it_should_fail_fast_while_backend_is_loading() {
    let ctx = TestContext::unloaded().await.unwrap();

    let response = ctx
        .client
        .post("/synthesize", &json!({ "text": "too early", "language": "en" }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_error_message("still loading");
    assert_eq!(ctx.service.pending_syntheses(), 0);

    ctx.slot.install(ctx.backend.clone());

    let response = ctx
        .client
        .post("/synthesize", &json!({ "text": "too early", "language": "en" }))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn it_should_report_failed_backend_load() {
    let ctx = TestContext::unloaded().await.unwrap();
    ctx.slot.mark_failed("speaker reference file not found");

    let response = ctx
        .client
        .post("/api/audio", &json!({ "text": "hello", "language": "en" }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_error_message("speaker reference file not found");
}
