use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use stampa::{
    application::{
        export::PdfExportService,
        renderer::{PdfRenderer, RenderError},
    },
    domain::conversion::PageLayout,
    infra::{
        http::{HttpState, REQUEST_ID_HEADER, build_router},
        storage::OutputStore,
    },
};
use tempfile::TempDir;
use tower::ServiceExt;

const FAKE_PDF: &[u8] = b"%PDF-1.7\n% stampa test document\n";

#[derive(Default)]
struct FakeRenderer {
    calls: Mutex<Vec<(String, PageLayout)>>,
    failure: Option<String>,
}

impl FakeRenderer {
    fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<(String, PageLayout)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl PdfRenderer for FakeRenderer {
    async fn render(&self, html: &str, layout: PageLayout) -> Result<Bytes, RenderError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((html.to_string(), layout));
        match &self.failure {
            Some(message) => Err(RenderError::Launch(message.clone())),
            None => Ok(Bytes::from_static(FAKE_PDF)),
        }
    }
}

struct Harness {
    dir: TempDir,
    renderer: Arc<FakeRenderer>,
    router: Router,
}

impl Harness {
    fn new(renderer: FakeRenderer) -> Self {
        Self::with_options(renderer, 10, true)
    }

    fn with_options(renderer: FakeRenderer, keep_count: usize, expose_render_errors: bool) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let store = OutputStore::new(dir.path().join("pdfs"), keep_count).expect("output store");
        let renderer = Arc::new(renderer);
        let exports = Arc::new(PdfExportService::new(renderer.clone(), Arc::new(store)));
        let router = build_router(
            HttpState {
                exports,
                expose_render_errors,
            },
            1024 * 1024,
        );
        Self {
            dir,
            renderer,
            router,
        }
    }

    fn stored_pdfs(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("pdfs"))
            .expect("read output dir")
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "pdf"))
            .count()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Bytes) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        (status, headers, body)
    }

    async fn export(&self, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/export_pdf")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let (status, _, body) = self.send(request).await;
        let json = serde_json::from_slice(&body).expect("json body");
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, axum::http::HeaderMap, Bytes) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }
}

#[tokio::test]
async fn export_then_download_returns_rendered_bytes() {
    let harness = Harness::new(FakeRenderer::default());

    let (status, body) = harness
        .export(json!({
            "html": "<html><head></head><body>hi</body></html>",
            "scale": 1,
            "width": 1200
        }))
        .await;
    assert_eq!(status, StatusCode::OK, "body: {body}");

    let url = body["url"].as_str().expect("url field");
    let file_name = url.strip_prefix("/download_pdf/").expect("download prefix");
    assert_eq!(file_name.len(), 32 + ".pdf".len());
    assert!(file_name.ends_with(".pdf"));
    assert_eq!(harness.stored_pdfs(), 1);

    let calls = harness.renderer.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.starts_with("<html><head><style>"));
    assert!(calls[0].0.ends_with("</head><body>hi</body></html>"));
    assert_eq!(calls[0].1.width_px, 1200);

    let (status, headers, bytes) = harness.get(url).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{file_name}\"").as_str()
    );
    assert_eq!(bytes.as_ref(), FAKE_PDF);
}

#[tokio::test]
async fn string_scale_and_width_are_accepted() {
    let harness = Harness::new(FakeRenderer::default());

    let (status, _) = harness
        .export(json!({ "html": "<p>x</p>", "scale": "0.5", "width": "800" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let calls = harness.renderer.calls();
    assert_eq!(calls[0].1.scale, 0.5);
    assert_eq!(calls[0].1.width_px, 800);
}

#[tokio::test]
async fn empty_html_is_rejected_without_rendering() {
    let harness = Harness::new(FakeRenderer::default());

    let (status, body) = harness.export(json!({ "html": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No HTML provided");
    assert!(harness.renderer.calls().is_empty());
    assert_eq!(harness.stored_pdfs(), 0);
}

#[tokio::test]
async fn missing_html_is_rejected() {
    let harness = Harness::new(FakeRenderer::default());

    let (status, body) = harness.export(json!({ "scale": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_scale_and_width_are_bad_requests() {
    let harness = Harness::new(FakeRenderer::default());

    for payload in [
        json!({ "html": "<p>x</p>", "scale": "big" }),
        json!({ "html": "<p>x</p>", "scale": -1 }),
        json!({ "html": "<p>x</p>", "width": 0 }),
        json!({ "html": "<p>x</p>", "width": "wide" }),
    ] {
        let (status, body) = harness.export(payload.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload: {payload}");
        assert!(body["error"].is_string(), "payload: {payload}");
    }
    assert!(harness.renderer.calls().is_empty());
}

#[tokio::test]
async fn invalid_json_body_is_a_bad_request() {
    let harness = Harness::new(FakeRenderer::default());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/export_pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let (status, _, body) = harness.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).expect("json error body");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn renderer_failure_exposes_message_by_default() {
    let harness = Harness::new(FakeRenderer::failing("chrome not found"));

    let (status, body) = harness.export(json!({ "html": "<p>x</p>" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().expect("error field");
    assert!(message.contains("chrome not found"), "message: {message}");
    assert_eq!(harness.stored_pdfs(), 0);
}

#[tokio::test]
async fn renderer_failure_can_be_hidden() {
    let harness = Harness::with_options(FakeRenderer::failing("chrome not found"), 10, false);

    let (status, body) = harness.export(json!({ "html": "<p>x</p>" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "PDF conversion failed");
}

#[tokio::test]
async fn unknown_download_is_not_found() {
    let harness = Harness::new(FakeRenderer::default());

    let (status, _, body) = harness
        .get("/download_pdf/0123456789abcdef0123456789abcdef.pdf")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).expect("json error body");
    assert_eq!(body["error"], "PDF not found");
}

#[tokio::test]
async fn traversal_names_are_not_found() {
    let harness = Harness::new(FakeRenderer::default());
    std::fs::write(harness.dir.path().join("secret.pdf"), b"outside").expect("write outside");

    for uri in ["/download_pdf/..%2Fsecret.pdf", "/download_pdf/.."] {
        let (status, _, _) = harness.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "uri: {uri}");
    }
}

#[tokio::test]
async fn output_directory_stays_within_keep_count() {
    let harness = Harness::with_options(FakeRenderer::default(), 10, true);

    for _ in 0..12 {
        let (status, _) = harness.export(json!({ "html": "<p>x</p>" })).await;
        assert_eq!(status, StatusCode::OK);
        assert!(harness.stored_pdfs() <= 10);
    }
    assert_eq!(harness.stored_pdfs(), 10);
}

#[tokio::test]
async fn front_end_assets_are_served() {
    let harness = Harness::new(FakeRenderer::default());

    let (status, headers, body) = harness.get("/").await;
    assert_eq!(status, StatusCode::OK);
    let content_type = headers[header::CONTENT_TYPE].to_str().expect("content type");
    assert!(content_type.starts_with("text/html"));
    assert!(!body.is_empty());

    let (status, _, _) = harness.get("/app.js").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = harness.get("/missing.css").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_accessible_output_directory() {
    let harness = Harness::new(FakeRenderer::default());

    let (status, _, _) = harness.get("/_health").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    std::fs::remove_dir_all(harness.dir.path().join("pdfs")).expect("remove output dir");
    let (status, _, _) = harness.get("/_health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn hidden_render_failure_carries_request_id() {
    let harness = Harness::with_options(FakeRenderer::failing("chrome not found"), 10, false);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/export_pdf")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "html": "<p>x</p>" }).to_string()))
        .expect("request");
    let (status, headers, _) = harness.send(request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let request_id = headers[REQUEST_ID_HEADER].to_str().expect("ascii request id");
    assert_eq!(request_id.len(), 32);
    assert!(request_id.chars().all(|c| c.is_ascii_hexdigit()));

    let (_, other_headers, _) = harness.get("/_health").await;
    assert_ne!(other_headers[REQUEST_ID_HEADER], headers[REQUEST_ID_HEADER]);
}
