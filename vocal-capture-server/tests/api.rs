use std::sync::Arc;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use vocal_capture_core::{
    encode_wav, AnalysisClient, AnalysisError, AnalysisPipeline, AnalysisTransport, RawResponse, SampleBuffer,
};
use vocal_capture_server::{configure, AppState, ServerConfig};

const BOUNDARY: &str = "----vocal-capture-test-boundary";

/// Stands in for the analysis service; records every WAV it receives.
struct StubService {
    reply: Result<RawResponse, AnalysisError>,
    received: Mutex<Vec<Vec<u8>>>,
}

impl StubService {
    fn answering(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(RawResponse {
                status,
                body: body.into(),
            }),
            received: Mutex::new(Vec::new()),
        })
    }

    fn failing(err: AnalysisError) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(err),
            received: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.received.lock().len()
    }
}

#[async_trait]
impl AnalysisTransport for StubService {
    async fn post_wav(&self, wav: Vec<u8>) -> Result<RawResponse, AnalysisError> {
        self.received.lock().push(wav);
        self.reply.clone()
    }
}

fn state_with(service: Arc<StubService>, config: ServerConfig) -> AppState {
    AppState::new(config, AnalysisPipeline::new(AnalysisClient::new(service)))
}

fn recorded_wav(frames: usize, sample_rate: u32) -> Vec<u8> {
    let samples = (0..frames)
        .map(|i| (i as f32 * 0.05).sin() * 0.8)
        .collect();
    encode_wav(&SampleBuffer::mono(samples, sample_rate).unwrap()).into_bytes()
}

fn multipart(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, body: Vec<u8>) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(body)
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(configure),
        )
        .await
    };
}

#[actix_web::test]
async fn health_reports_ok() {
    let app = init_app!(state_with(StubService::answering(200, "{}"), ServerConfig::default()));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[actix_web::test]
async fn analyze_passes_service_json_through() {
    let service = StubService::answering(200, r#"{"pitch":{"mean":182.4},"jitter":0.011}"#);
    let app = init_app!(state_with(service.clone(), ServerConfig::default()));
    let wav = recorded_wav(1600, 16000);

    let req = upload("/api/analyze", multipart("audio", "take.wav", "audio/wav", &wav)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"pitch": {"mean": 182.4}, "jitter": 0.011}));

    let forwarded = service.received.lock()[0].clone();
    assert_eq!(forwarded.len(), 44 + 2 * 1600);
    assert_eq!(&forwarded[0..4], b"RIFF");
    assert_eq!(u16::from_le_bytes([forwarded[22], forwarded[23]]), 1);
}

#[actix_web::test]
async fn missing_audio_field_is_bad_request() {
    let service = StubService::answering(200, "{}");
    let app = init_app!(state_with(service.clone(), ServerConfig::default()));

    let req = upload("/api/analyze", multipart("notes", "n.txt", "text/plain", b"hello")).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "no recorded audio to analyze");
    assert_eq!(service.request_count(), 0);
}

#[actix_web::test]
async fn empty_audio_field_is_bad_request() {
    let service = StubService::answering(200, "{}");
    let app = init_app!(state_with(service.clone(), ServerConfig::default()));

    let req = upload("/api/analyze", multipart("audio", "take.wav", "audio/wav", b"")).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(service.request_count(), 0);
}

#[actix_web::test]
async fn undecodable_audio_is_bad_request() {
    let service = StubService::answering(200, "{}");
    let app = init_app!(state_with(service.clone(), ServerConfig::default()));

    let req = upload(
        "/api/analyze",
        multipart("audio", "take.bin", "application/octet-stream", b"definitely not audio"),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("unrecognized"));
    assert_eq!(service.request_count(), 0);
}

#[actix_web::test]
async fn malformed_upstream_is_bad_gateway_with_raw_body() {
    let service = StubService::answering(200, "not json");
    let app = init_app!(state_with(service.clone(), ServerConfig::default()));

    let wav = recorded_wav(400, 8000);
    let req = upload("/api/analyze", multipart("audio", "take.wav", "audio/wav", &wav)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["raw"], "not json");
    assert!(body["error"].is_string());
    assert_eq!(service.request_count(), 1);
}

#[actix_web::test]
async fn transport_failure_is_bad_gateway() {
    let service = StubService::failing(AnalysisError::Transport {
        message: "operation timed out".into(),
        timed_out: true,
    });
    let app = init_app!(state_with(service, ServerConfig::default()));

    let wav = recorded_wav(400, 8000);
    let req = upload("/api/analyze", multipart("audio", "take.wav", "audio/wav", &wav)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body.get("raw").is_none());
}

#[actix_web::test]
async fn oversize_upload_is_rejected() {
    let service = StubService::answering(200, "{}");
    let config = ServerConfig {
        max_upload_bytes: 128,
        ..Default::default()
    };
    let app = init_app!(state_with(service.clone(), config));

    let wav = recorded_wav(400, 8000);
    let req = upload("/api/analyze", multipart("audio", "take.wav", "audio/wav", &wav)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(service.request_count(), 0);
}

#[actix_web::test]
async fn non_multipart_body_is_bad_request() {
    let app = init_app!(state_with(StubService::answering(200, "{}"), ServerConfig::default()));

    let req = test::TestRequest::post()
        .uri("/api/analyze")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(r#"{"audio":"nope"}"#)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn waveform_returns_envelope() {
    let service = StubService::answering(200, "{}");
    let app = init_app!(state_with(service.clone(), ServerConfig::default()));

    let wav = recorded_wav(1000, 8000);
    let req = upload(
        "/api/waveform?width=10&height=100",
        multipart("audio", "take.wav", "audio/wav", &wav),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["sampleRate"], 8000);
    assert_eq!(body["frameCount"], 1000);
    assert_eq!(body["width"], 10);
    assert_eq!(body["height"], 100);

    let points = body["envelope"]["points"].as_array().unwrap();
    assert_eq!(points.len(), 10);
    for point in points {
        let (min, max) = (point["min"].as_f64().unwrap(), point["max"].as_f64().unwrap());
        assert!(min <= max);
        assert!((-1.0..=1.0).contains(&min) && (-1.0..=1.0).contains(&max));
    }
    assert_eq!(body["segments"].as_array().unwrap().len(), 10);
    assert_eq!(service.request_count(), 0);
}

#[actix_web::test]
async fn waveform_uses_configured_default_width() {
    let app = init_app!(state_with(StubService::answering(200, "{}"), ServerConfig::default()));

    let wav = recorded_wav(2000, 8000);
    let req = upload("/api/waveform", multipart("audio", "take.wav", "audio/wav", &wav)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["envelope"]["points"].as_array().unwrap().len(), 600);
}

#[actix_web::test]
async fn waveform_rejects_bad_query() {
    let app = init_app!(state_with(StubService::answering(200, "{}"), ServerConfig::default()));
    let wav = recorded_wav(100, 8000);

    let req = upload(
        "/api/waveform?width=wide",
        multipart("audio", "take.wav", "audio/wav", &wav),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().starts_with("invalid query"));

    let req = upload(
        "/api/waveform?width=100000",
        multipart("audio", "take.wav", "audio/wav", &wav),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn concurrent_uploads_are_decoded_off_the_worker() {
    let service = StubService::answering(200, r#"{"ok":true}"#);
    let app = init_app!(state_with(service.clone(), ServerConfig::default()));
    let wav = recorded_wav(48_000, 48_000);

    let analyze = upload("/api/analyze", multipart("audio", "a.wav", "audio/wav", &wav)).to_request();
    let waveform = upload("/api/waveform?width=32", multipart("audio", "b.wav", "audio/wav", &wav)).to_request();
    let (analyzed, drawn) = futures_util::future::join(
        test::call_service(&app, analyze),
        test::call_service(&app, waveform),
    )
    .await;

    assert_eq!(analyzed.status(), StatusCode::OK);
    assert_eq!(drawn.status(), StatusCode::OK);
    let body: Value = test::read_body_json(drawn).await;
    assert_eq!(body["frameCount"], 48_000);
    assert_eq!(service.request_count(), 1);
}

#[actix_web::test]
async fn absurd_declared_rate_is_bad_request() {
    let service = StubService::answering(200, "{}");
    let app = init_app!(state_with(service.clone(), ServerConfig::default()));

    let mut wav = recorded_wav(16, 8000);
    wav[24..28].copy_from_slice(&3_000_000_000u32.to_le_bytes());
    wav[28..32].copy_from_slice(&u32::MAX.to_le_bytes());
    let req = upload("/api/analyze", multipart("audio", "crafted.wav", "audio/wav", &wav)).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("exceeds"), "{}", body);
    assert_eq!(service.request_count(), 0);
}
