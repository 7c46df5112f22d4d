//! Error types for the edgequake-ocr-gateway library.
//!
//! The taxonomy mirrors how far each failure is allowed to travel:
//!
//! * [`crate::request::ValidationIssue`] (**client-caused**): the request body
//!   is malformed. Collected in full and answered with HTTP 400.
//!
//! * [`FetchError`] and [`EngineError`] (**upstream**): the source document
//!   could not be downloaded, or an analysis engine rejected the call. Both
//!   are wrapped in [`PipelineError`] and caught exactly once at the flow
//!   boundary in [`crate::analyze`].
//!
//! * A failed vision call for one page of an enriched document never becomes
//!   an error value at all: the normalizer logs it and falls back to the
//!   extracted text.
//!
//! * [`ConfigError`] (**startup**): the process must not accept traffic.

use thiserror::Error;

/// Default HTTP status for failures that carry none of their own.
pub const DEFAULT_ERROR_STATUS: u16 = 500;

/// Default message for failures that carry no usable message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Internal Server Error";

/// Failure retrieving the source document.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The remote server answered with a non-success status.
    #[error("Failed to fetch '{url}': HTTP {status} {status_text}")]
    HttpStatus {
        url: String,
        status: u16,
        status_text: String,
    },

    /// Connection refused, DNS failure, timeout, or truncated body.
    #[error("Failed to fetch '{url}': {detail}")]
    Network { url: String, detail: String },
}

impl FetchError {
    /// Machine-readable reason: `"http-status"` or `"network"`.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::HttpStatus { .. } => "http-status",
            FetchError::Network { .. } => "network",
        }
    }

    /// Upstream status, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            FetchError::Network { .. } => None,
        }
    }
}

/// Which upstream analysis engine produced an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Extraction,
    Vision,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Extraction => f.write_str("extraction"),
            Engine::Vision => f.write_str("vision"),
        }
    }
}

/// An upstream analysis engine call failed.
#[derive(Debug, Clone, Error)]
#[error("{engine} engine error: {message}")]
pub struct EngineError {
    pub engine: Engine,
    /// Status reported by the upstream, when it reported one.
    pub status: Option<u16>,
    pub message: String,
}

impl EngineError {
    pub fn extraction(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            engine: Engine::Extraction,
            status,
            message: message.into(),
        }
    }

    pub fn vision(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            engine: Engine::Vision,
            status,
            message: message.into(),
        }
    }
}

/// Unrecovered failure of a request flow.
///
/// Converted into an [`crate::output::ErrorResult`] at the flow boundary.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl PipelineError {
    /// HTTP status to answer with.
    ///
    /// Upstream statuses outside the error range are not meaningful to the
    /// caller as-is and are reported as 502.
    pub fn status_code(&self) -> u16 {
        let upstream = match self {
            PipelineError::Fetch(e) => e.status(),
            PipelineError::Engine(e) => e.status,
        };
        match upstream {
            Some(s) if (400..=599).contains(&s) => s,
            Some(_) => 502,
            None => DEFAULT_ERROR_STATUS,
        }
    }

    /// Message for the error body.
    pub fn message(&self) -> String {
        let msg = match self {
            PipelineError::Engine(e) => e.message.trim().to_string(),
            other => other.to_string(),
        };
        if msg.is_empty() {
            DEFAULT_ERROR_MESSAGE.to_string()
        } else {
            msg
        }
    }
}

/// Startup configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The upstream API credential is absent.
    #[error("Missing credential: set {var} before starting the gateway")]
    MissingCredential { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
