//! Request flows: validate, dispatch, and map the outcome to a response.
//!
//! [`Analyzer::run`] is the single boundary where failures are caught. Every
//! flow either produces its success body or one [`ErrorResult`] carrying the
//! most specific status available; nothing past this point sees an error
//! value.
//!
//! ```text
//! /extract           validate ─▶ extract(url) ─▶ normalize_extracted
//! /extract-enriched  validate ─▶ fetch ─┬─ pdf:   extract(url) ─▶ normalize_enriched
//!                                      └─ image: describe(fetched) ─▶ normalize_single_image
//! /describe-image    validate ─▶ fetch ─▶ describe(fetched) ─▶ normalize_single_image
//! ```

use crate::config::GatewayConfig;
use crate::error::PipelineError;
use crate::output::{AnalysisResult, DescribeResult, ErrorResult, Status};
use crate::pipeline::extract::{ExtractionEngine, ExtractionSource, MistralOcrClient};
use crate::pipeline::fetch::{DocumentSource, HttpFetcher};
use crate::pipeline::normalize;
use crate::pipeline::vision::{self, LlmVisionEngine, VisionEngine};
use crate::prompts::PromptSet;
use crate::request::{self, AnalysisRequest, DocumentKind};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The three request flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Plain extraction: the engine reads the URL directly.
    Extract,
    /// Extraction with vision enrichment of embedded page images.
    ExtractEnriched,
    /// A single image described by the vision engine.
    DescribeImage,
}

impl Flow {
    pub fn name(self) -> &'static str {
        match self {
            Flow::Extract => "extract",
            Flow::ExtractEnriched => "extract-enriched",
            Flow::DescribeImage => "describe-image",
        }
    }
}

/// The outcome of one flow, ready to serialise.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResponse {
    Analysis(AnalysisResult),
    Description(DescribeResult),
    Error { status: u16, body: ErrorResult },
}

impl FlowResponse {
    /// HTTP status for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            FlowResponse::Analysis(_) | FlowResponse::Description(_) => 200,
            FlowResponse::Error { status, .. } => *status,
        }
    }

    /// JSON body for this outcome.
    pub fn to_json(&self) -> Value {
        let body = match self {
            FlowResponse::Analysis(r) => serde_json::to_value(r),
            FlowResponse::Description(r) => serde_json::to_value(r),
            FlowResponse::Error { body, .. } => serde_json::to_value(body),
        };
        body.unwrap_or_else(|e| {
            serde_json::json!({ "status": "error", "message": format!("Serialisation failed: {e}") })
        })
    }
}

/// Composes the pipeline stages into request flows.
///
/// Immutable after construction; share it behind an `Arc` across requests.
pub struct Analyzer {
    source: Arc<dyn DocumentSource>,
    extraction: Arc<dyn ExtractionEngine>,
    vision: Arc<dyn VisionEngine>,
    prompts: PromptSet,
    vision_concurrency: usize,
}

impl Analyzer {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extraction: Arc<dyn ExtractionEngine>,
        vision: Arc<dyn VisionEngine>,
    ) -> Self {
        Self {
            source,
            extraction,
            vision,
            prompts: PromptSet::default(),
            vision_concurrency: 1,
        }
    }

    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_vision_concurrency(mut self, n: usize) -> Self {
        self.vision_concurrency = n.max(1);
        self
    }

    /// Wire up the HTTP fetcher, Mistral OCR client and edgequake-llm vision
    /// provider described by `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, PipelineError> {
        let source = HttpFetcher::new(config.fetch_timeout_secs)?;
        let extraction = MistralOcrClient::new(config)?;
        let vision = LlmVisionEngine::from_config(config)?;
        Ok(Self::new(Arc::new(source), Arc::new(extraction), Arc::new(vision))
            .with_prompts(config.prompts.clone())
            .with_vision_concurrency(config.vision_concurrency))
    }

    /// Run `flow` against an untyped request body.
    pub async fn run(&self, flow: Flow, body: &Value) -> FlowResponse {
        let start = Instant::now();

        let req = match request::validate(body) {
            Ok(req) => req,
            Err(issues) => {
                warn!("{}: rejected request with {} validation issue(s)", flow.name(), issues.len());
                return FlowResponse::Error {
                    status: 400,
                    body: ErrorResult::validation(issues),
                };
            }
        };

        let meta = req.metadata.clone().unwrap_or_default();
        info!(
            flow = flow.name(),
            kind = %req.kind,
            url = %req.url,
            source = meta.source.as_deref().unwrap_or("-"),
            document_id = meta.document_id.as_deref().unwrap_or("-"),
            "Starting analysis"
        );

        let outcome = match flow {
            Flow::Extract => self.extract(&req).await.map(FlowResponse::Analysis),
            Flow::ExtractEnriched => self.extract_enriched(&req).await.map(FlowResponse::Analysis),
            Flow::DescribeImage => self.describe_image(&req).await.map(FlowResponse::Description),
        };

        match outcome {
            Ok(response) => {
                info!(
                    "{}: completed in {}ms",
                    flow.name(),
                    start.elapsed().as_millis()
                );
                response
            }
            Err(e) => {
                let status = e.status_code();
                error!("{}: failed with {}: {}", flow.name(), status, e);
                FlowResponse::Error {
                    status,
                    body: ErrorResult::new(e.message()),
                }
            }
        }
    }

    /// Plain extraction. The document is never downloaded here.
    pub async fn extract(&self, req: &AnalysisRequest) -> Result<AnalysisResult, PipelineError> {
        let source = ExtractionSource::Url {
            url: req.url.clone(),
            kind: req.kind,
        };
        let raw_pages = self.extraction.extract(&source).await?;
        Ok(AnalysisResult::new(normalize::normalize_extracted(&raw_pages), None))
    }

    /// Extraction with vision enrichment.
    pub async fn extract_enriched(
        &self,
        req: &AnalysisRequest,
    ) -> Result<AnalysisResult, PipelineError> {
        let document = self.source.fetch(&req.url, req.kind).await?;

        let pages = match req.kind {
            DocumentKind::Pdf => {
                let source = ExtractionSource::Url {
                    url: req.url.clone(),
                    kind: req.kind,
                };
                let raw_pages = self.extraction.extract(&source).await?;
                normalize::normalize_enriched(
                    &raw_pages,
                    self.vision.as_ref(),
                    &self.prompts.page_analysis,
                    self.vision_concurrency,
                )
                .await
            }
            DocumentKind::Image => {
                let description = vision::describe(
                    self.vision.as_ref(),
                    &document.data_uri,
                    &self.prompts.page_analysis,
                )
                .await?;
                normalize::normalize_single_image(&document, description)
            }
        };

        Ok(AnalysisResult::new(pages, Some(document.data_uri)))
    }

    /// Vision-only description of the fetched document, whatever its kind.
    pub async fn describe_image(
        &self,
        req: &AnalysisRequest,
    ) -> Result<DescribeResult, PipelineError> {
        let document = self.source.fetch(&req.url, req.kind).await?;
        let description = vision::describe(
            self.vision.as_ref(),
            &document.data_uri,
            &self.prompts.image_description,
        )
        .await?;
        let pages = normalize::normalize_single_image(&document, description.clone());

        Ok(DescribeResult {
            status: Status::Success,
            data_uri: document.data_uri,
            description,
            pages,
        })
    }
}
