//! Document retrieval: download a remote resource into memory.
//!
//! The whole body is buffered; documents are request-scoped and dropped with
//! the response. Nothing touches the filesystem.

use crate::error::FetchError;
use crate::pipeline::encode;
use crate::request::DocumentKind;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// A downloaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub bytes: Vec<u8>,
    pub media_type: String,
    /// Base64 of `bytes` without a prefix.
    pub base64: String,
    /// `data:<media_type>;base64,<base64>`.
    pub data_uri: String,
}

impl FetchedDocument {
    /// Encode `bytes`, resolving the media type from an optional
    /// `content-type` value and the request kind.
    pub fn new(bytes: Vec<u8>, content_type: Option<&str>, kind: DocumentKind) -> Self {
        let media_type = resolve_media_type(content_type, kind);
        let base64 = encode::encode_bytes(&bytes);
        let data_uri = encode::data_uri(&media_type, &base64);
        Self {
            bytes,
            media_type,
            base64,
            data_uri,
        }
    }
}

/// `content-type` if present and non-empty, else the kind default.
pub fn resolve_media_type(content_type: Option<&str>, kind: DocumentKind) -> String {
    content_type
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(kind.default_media_type())
        .to_string()
}

/// Network-fetch capability.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn fetch(&self, url: &Url, kind: DocumentKind) -> Result<FetchedDocument, FetchError>;
}

/// [`DocumentSource`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests time out after `timeout_secs`.
    pub fn new(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                detail: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }

    /// Reuse an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentSource for HttpFetcher {
    async fn fetch(&self, url: &Url, kind: DocumentKind) -> Result<FetchedDocument, FetchError> {
        info!("Fetching {} document from: {}", kind, url);

        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            detail: if e.is_timeout() {
                format!("timed out: {e}")
            } else {
                e.to_string()
            },
        };

        let response = self.client.get(url.clone()).send().await.map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(network)?;
        debug!(
            "Fetched {} bytes ({})",
            bytes.len(),
            content_type.as_deref().unwrap_or("no content-type")
        );

        Ok(FetchedDocument::new(bytes.to_vec(), content_type.as_deref(), kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_prefers_header() {
        assert_eq!(
            resolve_media_type(Some("image/png"), DocumentKind::Image),
            "image/png"
        );
    }

    #[test]
    fn media_type_falls_back_to_kind_default() {
        assert_eq!(resolve_media_type(None, DocumentKind::Pdf), "application/pdf");
        assert_eq!(resolve_media_type(Some(""), DocumentKind::Image), "image/jpeg");
        assert_eq!(resolve_media_type(Some("  "), DocumentKind::Pdf), "application/pdf");
    }

    #[test]
    fn fetched_document_encodes_data_uri() {
        let doc = FetchedDocument::new(b"%PDF".to_vec(), None, DocumentKind::Pdf);
        assert_eq!(doc.base64, "JVBERg==");
        assert_eq!(doc.data_uri, "data:application/pdf;base64,JVBERg==");
    }
}
