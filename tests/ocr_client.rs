//! `MistralOcrClient` against a local axum stand-in for the OCR endpoint.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use edgequake_ocr_gateway::pipeline::extract::MistralOcrClient;
use edgequake_ocr_gateway::{
    DocumentKind, Engine, ExtractionEngine, ExtractionSource, GatewayConfig,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};
use url::Url;

/// What the stand-in saw on its last request.
#[derive(Default)]
struct Seen {
    authorization: Option<String>,
    body: Option<Value>,
}

type Shared = Arc<Mutex<Seen>>;

async fn spawn_ocr(status: StatusCode, reply: Value) -> (SocketAddr, Shared) {
    let seen: Shared = Arc::default();
    let app = Router::new()
        .route(
            "/v1/ocr",
            post(
                move |State(seen): State<Shared>, headers: HeaderMap, Json(body): Json<Value>| {
                    let reply = reply.clone();
                    async move {
                        let mut s = seen.lock().unwrap();
                        s.authorization = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        s.body = Some(body);
                        (status, Json(reply))
                    }
                },
            ),
        )
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

fn client(addr: SocketAddr) -> MistralOcrClient {
    let config = GatewayConfig::builder()
        .api_key("sk-test")
        .ocr_endpoint(format!("http://{addr}/v1/ocr"))
        .api_timeout_secs(5)
        .build()
        .unwrap();
    MistralOcrClient::new(&config).unwrap()
}

fn pdf_source() -> ExtractionSource {
    ExtractionSource::Url {
        url: Url::parse("https://x/doc.pdf").unwrap(),
        kind: DocumentKind::Pdf,
    }
}

#[tokio::test]
async fn extract_sends_bearer_and_coerces_pages() {
    let (addr, seen) = spawn_ocr(
        StatusCode::OK,
        json!({
            "pages": [
                { "index": 0, "markdown": "# Title", "images": [
                    { "id": "img-0.jpeg", "image_base64": "data:image/jpeg;base64,/9j/AA" }
                ]},
                { "index": 1, "markdown": "body", "images": [] }
            ],
            "model": "mistral-ocr-latest"
        }),
    )
    .await;

    let pages = assert_ok!(client(addr).extract(&pdf_source()).await);

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].text, "# Title");
    assert_eq!(pages[0].first_image().unwrap().base64, "/9j/AA");
    assert_eq!(pages[1].index, Some(1));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer sk-test"));
    let body = seen.body.as_ref().unwrap();
    assert_eq!(body["document"]["document_url"], "https://x/doc.pdf");
    assert_eq!(body["include_image_base64"], true);
}

#[tokio::test]
async fn upstream_rejection_keeps_status_and_message() {
    let (addr, _) = spawn_ocr(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "message": "rate limited" }),
    )
    .await;

    let err = assert_err!(client(addr).extract(&pdf_source()).await);

    assert_eq!(err.engine, Engine::Extraction);
    assert_eq!(err.status, Some(429));
    assert_eq!(err.message, "rate limited");
}

