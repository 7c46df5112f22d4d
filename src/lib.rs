//! # edgequake-ocr-gateway
//!
//! Document analysis behind a stable JSON contract: hand it the URL of a PDF
//! or an image, get back per-page text and markdown.
//!
//! Two upstream engines do the reading. An OCR engine (Mistral OCR by
//! default) turns a document into page records with embedded images; a
//! vision model (any edgequake-llm provider, pixtral by default) describes
//! single images. The gateway chains them, normalizes their different shapes
//! into one [`Page`] record, and falls back to the OCR text for any page
//! whose vision call fails.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request body
//!  │
//!  ├─ 1. Validate   kind + absolute URL, every issue reported at once
//!  ├─ 2. Fetch      download into memory, base64 data URI
//!  ├─ 3. Extract    OCR engine → RawPage (text + embedded images)
//!  ├─ 4. Describe   vision model → description (or sentinel)
//!  ├─ 5. Normalize  RawPage / description → Page
//!  └─ 6. Respond    AnalysisResult | DescribeResult | ErrorResult
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_ocr_gateway::{server, Analyzer, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Fails fast when MISTRAL_API_KEY is unset.
//!     let config = GatewayConfig::from_env()?;
//!     let analyzer = Analyzer::from_config(&config)?;
//!     server::serve(server::AppState::new(analyzer), "0.0.0.0:8080".parse()?).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ocr-gateway` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod request;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{Analyzer, Flow, FlowResponse};
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::{ConfigError, Engine, EngineError, FetchError, PipelineError};
pub use output::{AnalysisResult, DescribeResult, ErrorResult, Page, Status};
pub use pipeline::extract::{ExtractionEngine, ExtractionSource, RawImage, RawPage};
pub use pipeline::fetch::{DocumentSource, FetchedDocument, HttpFetcher};
pub use pipeline::vision::{VisionCompletion, VisionEngine, NO_DESCRIPTION};
pub use prompts::{AnalysisPrompt, PromptSet};
pub use request::{AnalysisRequest, DocumentKind, RequestMetadata, ValidationIssue};
