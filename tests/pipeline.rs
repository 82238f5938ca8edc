//! End-to-end acquisition against mock provider servers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{Rgba, RgbaImage};
use std::time::Duration;
use storyviz::render::FontSet;
use storyviz::{
    DecodedImage, ErrorKind, FallbackRenderer, ImageFormat, ImagePipeline, ImageRequest, Language,
    ProviderConfig, ProviderKind, RenderSpec, StoryVizError,
};
use tracing_test::traced_test;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn renderer() -> FallbackRenderer {
    let spec = RenderSpec {
        canvas_size: (320, 320),
        margin: 16,
        padding: 12,
        ..RenderSpec::default()
    };
    FallbackRenderer::with_fonts(spec, FontSet::builtin()).unwrap()
}

fn story() -> ImageRequest {
    ImageRequest::new("The Brave Fox", "A small fox crossed the river. Then it slept.", Language::En)
        .unwrap()
}

fn sample_pixels() -> RgbaImage {
    RgbaImage::from_fn(5, 4, |x, y| Rgba([x as u8 * 40, y as u8 * 50, 7, 255]))
}

fn png_bytes(pixels: &RgbaImage) -> Vec<u8> {
    DecodedImage::new(pixels.clone(), ImageFormat::Png)
        .encode()
        .unwrap()
}

fn error_kinds(failures: &[(ProviderKind, StoryVizError)]) -> Vec<ErrorKind> {
    failures.iter().map(|(_, err)| err.kind()).collect()
}

fn clipdrop_config(server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        clipdrop_enabled: true,
        api_key: Some("clip-key".into()),
        clipdrop_url: format!("{}/t2i", server.uri()),
        ..ProviderConfig::default()
    }
}

#[tokio::test]
async fn test_clipdrop_png_is_returned_exactly() {
    let server = MockServer::start().await;
    let pixels = sample_pixels();
    Mock::given(method("POST"))
        .and(path("/t2i"))
        .and(header("x-api-key", "clip-key"))
        .and(body_string_contains("name=\"prompt\""))
        .and(body_string_contains("\"The Brave Fox\", scene showing: A small fox crossed the river."))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png_bytes(&pixels)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = ImagePipeline::with_renderer(&clipdrop_config(&server), renderer()).unwrap();
    let acquisition = pipeline.acquire_detailed(&story()).await;

    assert_eq!(acquisition.source, ProviderKind::Clipdrop);
    assert!(acquisition.failures.is_empty());
    assert_eq!(acquisition.image.pixels, pixels);
}

#[tokio::test]
#[traced_test]
async fn test_rejected_request_falls_back_and_logs_kind() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/t2i"))
        .respond_with(ResponseTemplate::new(403).set_body_string("{\"error\": \"invalid key\"}"))
        .expect(1)
        .mount(&server)
        .await;

    let pipeline = ImagePipeline::with_renderer(&clipdrop_config(&server), renderer()).unwrap();
    let acquisition = pipeline.acquire_detailed(&story()).await;

    assert!(acquisition.is_fallback());
    assert_eq!((acquisition.image.width(), acquisition.image.height()), (320, 320));
    assert_eq!(acquisition.failures.len(), 1);
    let (kind, err) = &acquisition.failures[0];
    assert_eq!(*kind, ProviderKind::Clipdrop);
    assert_eq!(err.kind(), ErrorKind::ProviderRejected);
    assert_eq!(err.status(), Some(403));
    assert!(logs_contain("ProviderRejected"));
}

#[tokio::test]
async fn test_generic_url_target_with_b64_json() {
    let server = MockServer::start().await;
    let pixels = sample_pixels();
    let body = serde_json::json!({ "data": [{ "b64_json": STANDARD.encode(png_bytes(&pixels)) }] });
    Mock::given(method("POST"))
        .and(path("/v1/generate"))
        .and(header("authorization", "Bearer hf-key"))
        .and(body_partial_json(serde_json::json!({
            "parameters": { "num_inference_steps": 50, "width": 1024, "height": 1024 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        api_key: Some("hf-key".into()),
        model_ref: Some(format!("{}/v1/generate", server.uri())),
        ..ProviderConfig::default()
    };
    let pipeline = ImagePipeline::with_renderer(&config, renderer()).unwrap();
    let acquisition = pipeline.acquire_detailed(&story()).await;

    assert_eq!(acquisition.source, ProviderKind::GenericModel);
    assert_eq!(acquisition.image.pixels, pixels);
}

#[tokio::test]
async fn test_unconfigured_pipeline_renders_locally() {
    let pipeline = ImagePipeline::with_renderer(&ProviderConfig::default(), renderer()).unwrap();
    assert!(pipeline.provider_kinds().is_empty());

    let request = ImageRequest::new("قصة", "كان يا ما كان ثعلب صغير.", Language::Ar).unwrap();
    let acquisition = pipeline.acquire_detailed(&request).await;
    assert!(acquisition.is_fallback());
    assert!(acquisition.failures.is_empty());
    assert_eq!(acquisition.image.format, ImageFormat::Png);
}

#[tokio::test]
async fn test_chain_falls_through_to_next_provider() {
    let server = MockServer::start().await;
    let pixels = sample_pixels();
    Mock::given(method("POST"))
        .and(path("/t2i"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/hf"))
        .respond_with(
            ResponseTemplate::new(200)
                // No content type at all: raw decode tier.
                .set_body_bytes(png_bytes(&pixels)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        model_ref: Some(format!("{}/hf", server.uri())),
        ..clipdrop_config(&server)
    };
    let pipeline = ImagePipeline::with_renderer(&config, renderer()).unwrap();
    let acquisition = pipeline.acquire_detailed(&story()).await;

    assert_eq!(acquisition.source, ProviderKind::GenericModel);
    assert_eq!(acquisition.image.pixels, pixels);
    assert_eq!(error_kinds(&acquisition.failures), vec![ErrorKind::ProviderRejected]);
}

#[tokio::test]
async fn test_gemini_inline_data() {
    let server = MockServer::start().await;
    let pixels = sample_pixels();
    let body = serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [
                    { "text": "Here is your picture" },
                    { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(png_bytes(&pixels)) } }
                ]
            }
        }]
    });
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash-image:generateContent"))
        .and(header("x-goog-api-key", "gm-key"))
        .and(body_partial_json(serde_json::json!({
            "generationConfig": { "responseModalities": ["IMAGE"] }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        gemini_api_key: Some("gm-key".into()),
        gemini_base_url: server.uri(),
        ..ProviderConfig::default()
    };
    let pipeline = ImagePipeline::with_renderer(&config, renderer()).unwrap();
    let acquisition = pipeline.acquire_detailed(&story()).await;

    assert_eq!(acquisition.source, ProviderKind::Gemini);
    assert_eq!(acquisition.image.pixels, pixels);
}

#[tokio::test]
async fn test_imagen_model_uses_predict() {
    let server = MockServer::start().await;
    let pixels = sample_pixels();
    let body = serde_json::json!({
        "predictions": [{
            "bytesBase64Encoded": STANDARD.encode(png_bytes(&pixels)),
            "mimeType": "image/png"
        }]
    });
    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-4.0-generate-001:predict"))
        .and(header("x-goog-api-key", "gm-key"))
        .and(body_partial_json(serde_json::json!({
            "parameters": { "sampleCount": 1, "aspectRatio": "1:1" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig {
        gemini_api_key: Some("gm-key".into()),
        gemini_model: "imagen-4.0-generate-001".into(),
        gemini_base_url: server.uri(),
        ..ProviderConfig::default()
    };
    let pipeline = ImagePipeline::with_renderer(&config, renderer()).unwrap();
    let acquisition = pipeline.acquire_detailed(&story()).await;

    assert_eq!(acquisition.source, ProviderKind::Gemini);
    assert!(acquisition.failures.is_empty());
    assert_eq!(acquisition.image.pixels, pixels);
}

#[tokio::test]
async fn test_json_without_image_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Model is currently loading" })),
        )
        .mount(&server)
        .await;

    let config = ProviderConfig {
        api_key: Some("hf-key".into()),
        model_ref: Some(server.uri()),
        ..ProviderConfig::default()
    };
    let pipeline = ImagePipeline::with_renderer(&config, renderer()).unwrap();
    let acquisition = pipeline.acquire_detailed(&story()).await;

    assert!(acquisition.is_fallback());
    let (_, err) = &acquisition.failures[0];
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    assert!(err.to_string().contains("Model is currently loading"));
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png_bytes(&sample_pixels()))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = ProviderConfig {
        timeout: Duration::from_millis(200),
        ..clipdrop_config(&server)
    };
    let pipeline = ImagePipeline::with_renderer(&config, renderer()).unwrap();
    let acquisition = pipeline.acquire_detailed(&story()).await;

    assert!(acquisition.is_fallback());
    assert_eq!(error_kinds(&acquisition.failures), vec![ErrorKind::NetworkFailure]);
}
