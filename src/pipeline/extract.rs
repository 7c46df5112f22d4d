//! Text extraction: submit a document to an OCR engine, receive page records.
//!
//! The engine's JSON is coerced into [`RawPage`] the moment it arrives.
//! Nothing downstream of this module sees the upstream payload shape.

use crate::config::GatewayConfig;
use crate::error::EngineError;
use crate::pipeline::encode;
use crate::request::DocumentKind;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// What to hand the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionSource {
    /// The engine downloads the document itself.
    Url { url: Url, kind: DocumentKind },
    /// The document travels inline as a base64 data URI.
    Inline { data_uri: String, kind: DocumentKind },
}

/// An image embedded in an extracted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub id: Option<String>,
    /// Bare base64, never a data URI.
    pub base64: String,
}

/// One page as reported by the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// Zero-based page index, when the engine reports one.
    pub index: Option<usize>,
    pub text: String,
    pub images: Vec<RawImage>,
}

impl RawPage {
    pub fn new(index: Option<usize>, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, base64: impl Into<String>) -> Self {
        self.images.push(RawImage {
            id: None,
            base64: base64.into(),
        });
        self
    }

    /// The image that enrichment describes.
    pub fn first_image(&self) -> Option<&RawImage> {
        self.images.first()
    }
}

/// OCR capability.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    async fn extract(&self, source: &ExtractionSource) -> Result<Vec<RawPage>, EngineError>;
}

// ── Upstream wire format ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    pages: Vec<OcrPage>,
}

#[derive(Debug, Deserialize)]
struct OcrPage {
    /// Kept loose: a negative or fractional index is dropped, not fatal.
    #[serde(default)]
    index: Option<serde_json::Number>,
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    images: Vec<OcrImage>,
}

#[derive(Debug, Deserialize)]
struct OcrImage {
    id: Option<String>,
    image_base64: Option<String>,
}

impl From<OcrPage> for RawPage {
    fn from(page: OcrPage) -> Self {
        let images = page
            .images
            .into_iter()
            .filter_map(|img| {
                let b64 = img.image_base64.filter(|b| !b.is_empty())?;
                Some(RawImage {
                    id: img.id,
                    base64: encode::strip_data_uri_prefix(&b64).to_string(),
                })
            })
            .collect();
        RawPage {
            index: page
                .index
                .and_then(|n| n.as_u64())
                .and_then(|i| usize::try_from(i).ok()),
            text: page.markdown.or(page.text).unwrap_or_default(),
            images,
        }
    }
}

/// Coerce an OCR response body into page records.
pub fn parse_ocr_response(body: &str) -> Result<Vec<RawPage>, EngineError> {
    let parsed: OcrResponse = serde_json::from_str(body).map_err(|e| {
        EngineError::extraction(None, format!("Unreadable OCR response: {e}"))
    })?;
    Ok(parsed.pages.into_iter().map(RawPage::from).collect())
}

/// Pull a human-readable message out of an error body.
fn upstream_message(body: &str, fallback: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        ["message", "detail", "error"].iter().find_map(|key| match v.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Object(o)) => o.get("message").and_then(Value::as_str).map(str::to_string),
            Some(other) if !other.is_null() => Some(other.to_string()),
            _ => None,
        })
    });
    from_json
        .or_else(|| Some(body.trim().to_string()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| fallback.to_string())
}

/// [`ExtractionEngine`] speaking the Mistral OCR HTTP API.
#[derive(Debug, Clone)]
pub struct MistralOcrClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl MistralOcrClient {
    pub fn new(config: &GatewayConfig) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| EngineError::extraction(None, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.ocr_endpoint.clone(),
            model: config.ocr_model.clone(),
            api_key: config.api_key().to_string(),
        })
    }

    /// Request body for one extraction call. Embedded images are always
    /// requested because enrichment depends on them.
    pub fn request_body(&self, source: &ExtractionSource) -> Value {
        let document = match source {
            ExtractionSource::Url {
                url,
                kind: DocumentKind::Pdf,
            } => json!({ "type": "document_url", "document_url": url.as_str() }),
            ExtractionSource::Url {
                url,
                kind: DocumentKind::Image,
            } => json!({ "type": "image_url", "image_url": url.as_str() }),
            ExtractionSource::Inline {
                data_uri,
                kind: DocumentKind::Pdf,
            } => json!({ "type": "document_url", "document_url": data_uri }),
            ExtractionSource::Inline {
                data_uri,
                kind: DocumentKind::Image,
            } => json!({ "type": "image_url", "image_url": data_uri }),
        };
        json!({
            "model": self.model,
            "document": document,
            "include_image_base64": true,
        })
    }
}

#[async_trait]
impl ExtractionEngine for MistralOcrClient {
    async fn extract(&self, source: &ExtractionSource) -> Result<Vec<RawPage>, EngineError> {
        info!("Submitting document to OCR model {}", self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(source))
            .send()
            .await
            .map_err(|e| EngineError::extraction(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::extraction(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            let fallback = status.canonical_reason().unwrap_or("OCR request failed");
            return Err(EngineError::extraction(
                Some(status.as_u16()),
                upstream_message(&body, fallback),
            ));
        }

        let pages = parse_ocr_response(&body)?;
        debug!(
            "OCR returned {} pages, {} embedded images",
            pages.len(),
            pages.iter().map(|p| p.images.len()).sum::<usize>()
        );
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> MistralOcrClient {
        let config = GatewayConfig::builder().api_key("k").build().unwrap();
        MistralOcrClient::new(&config).unwrap()
    }

    #[test]
    fn request_body_for_pdf_url() {
        let url = Url::parse("https://x/doc.pdf").unwrap();
        let body = client().request_body(&ExtractionSource::Url {
            url,
            kind: DocumentKind::Pdf,
        });
        assert_eq!(body["model"], "mistral-ocr-latest");
        assert_eq!(body["include_image_base64"], true);
        assert_eq!(body["document"]["type"], "document_url");
        assert_eq!(body["document"]["document_url"], "https://x/doc.pdf");
    }

    #[test]
    fn request_body_for_image_url_and_inline() {
        let url = Url::parse("https://x/a.jpg").unwrap();
        let body = client().request_body(&ExtractionSource::Url {
            url,
            kind: DocumentKind::Image,
        });
        assert_eq!(body["document"]["type"], "image_url");

        let body = client().request_body(&ExtractionSource::Inline {
            data_uri: "data:application/pdf;base64,JVBERg==".into(),
            kind: DocumentKind::Pdf,
        });
        assert_eq!(
            body["document"]["document_url"],
            "data:application/pdf;base64,JVBERg=="
        );
    }

    #[test]
    fn parses_pages_and_strips_image_prefix() {
        let body = r##"{
            "pages": [
                { "index": 0, "markdown": "# One", "images": [
                    { "id": "img-0.jpeg", "image_base64": "data:image/jpeg;base64,/9j/AAA" }
                ]},
                { "index": 1, "markdown": "Two", "images": [] }
            ],
            "model": "mistral-ocr-latest"
        }"##;
        let pages = parse_ocr_response(body).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].index, Some(0));
        assert_eq!(pages[0].first_image().unwrap().base64, "/9j/AAA");
        assert_eq!(pages[0].first_image().unwrap().id.as_deref(), Some("img-0.jpeg"));
        assert!(pages[1].first_image().is_none());
    }

    #[test]
    fn missing_index_markdown_and_empty_images_are_tolerated() {
        let body = r#"{ "pages": [ { "text": "plain", "images": [ { "id": "x", "image_base64": null } ] } ] }"#;
        let pages = parse_ocr_response(body).unwrap();
        assert_eq!(pages[0].index, None);
        assert_eq!(pages[0].text, "plain");
        assert!(pages[0].images.is_empty());
    }

    #[test]
    fn out_of_range_index_is_dropped_not_fatal() {
        let body = r#"{ "pages": [
            { "index": -1, "markdown": "a" },
            { "index": 1.5, "markdown": "b" },
            { "index": 3, "markdown": "c" }
        ] }"#;
        let pages = parse_ocr_response(body).unwrap();
        let indices: Vec<Option<usize>> = pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![None, None, Some(3)]);
    }

    #[test]
    fn unreadable_body_is_an_extraction_error_without_status() {
        let err = parse_ocr_response("<html>").unwrap_err();
        assert_eq!(err.status, None);
        assert_eq!(err.engine, crate::error::Engine::Extraction);
    }

    #[test]
    fn upstream_message_prefers_json_fields() {
        assert_eq!(upstream_message(r#"{"message":"bad doc"}"#, "x"), "bad doc");
        assert_eq!(
            upstream_message(r#"{"error":{"message":"quota"}}"#, "x"),
            "quota"
        );
        assert_eq!(upstream_message("gateway down", "x"), "gateway down");
        assert_eq!(upstream_message("", "Bad Gateway"), "Bad Gateway");
    }
}
