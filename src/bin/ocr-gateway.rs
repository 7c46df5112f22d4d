//! Server binary for edgequake-ocr-gateway.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GatewayConfig`, validates it, and serves the HTTP API.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_ocr_gateway::config::API_KEY_ENV;
use edgequake_ocr_gateway::{server, Analyzer, GatewayConfig};
use std::io;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINTS:
  POST /extract            OCR only; the engine reads the URL directly
  POST /extract-enriched   OCR + vision description of embedded page images
  POST /describe-image     Vision description of a single image
  GET  /health             Liveness probe

  Request body: { "kind": "pdf" | "image", "url": "https://…", "metadata": { … } }

ENVIRONMENT VARIABLES:
  MISTRAL_API_KEY              Upstream credential (required)
  OCR_GATEWAY_OCR_ENDPOINT     OCR endpoint URL
  OCR_GATEWAY_OCR_MODEL        OCR model ID
  OCR_GATEWAY_VISION_PROVIDER  edgequake-llm provider for vision (mistral, openai, …)
  OCR_GATEWAY_VISION_MODEL     Vision model ID
  RUST_LOG                     Log filter override
"#;

/// Document analysis gateway: OCR and vision enrichment over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "ocr-gateway",
    version,
    about = "Document analysis gateway: OCR extraction and vision enrichment over HTTP",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "OCR_GATEWAY_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Upstream API credential.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// OCR endpoint URL.
    #[arg(long, env = "OCR_GATEWAY_OCR_ENDPOINT")]
    ocr_endpoint: Option<String>,

    /// OCR model ID.
    #[arg(long, env = "OCR_GATEWAY_OCR_MODEL")]
    ocr_model: Option<String>,

    /// edgequake-llm provider used for vision calls.
    #[arg(long, env = "OCR_GATEWAY_VISION_PROVIDER")]
    vision_provider: Option<String>,

    /// Vision model ID.
    #[arg(long, env = "OCR_GATEWAY_VISION_MODEL")]
    vision_model: Option<String>,

    /// Per-page vision calls in flight during enrichment.
    #[arg(long, env = "OCR_GATEWAY_VISION_CONCURRENCY", default_value_t = 1)]
    vision_concurrency: usize,

    /// Max vision output tokens per call.
    #[arg(long, env = "OCR_GATEWAY_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Vision sampling temperature (0.0–2.0).
    #[arg(long, env = "OCR_GATEWAY_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Source document download timeout in seconds.
    #[arg(long, env = "OCR_GATEWAY_FETCH_TIMEOUT", default_value_t = 120)]
    fetch_timeout: u64,

    /// OCR / vision call timeout in seconds.
    #[arg(long, env = "OCR_GATEWAY_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "OCR_GATEWAY_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Startup validation ───────────────────────────────────────────────
    // Nothing is bound until the configuration and both engines are ready.
    let config = build_config(&cli).context("Invalid configuration")?;
    tracing::debug!("{:?}", config);

    let analyzer = Analyzer::from_config(&config).context("Failed to initialise upstream engines")?;

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", cli.host, cli.port))?;

    server::serve(server::AppState::new(analyzer), addr)
        .await
        .context("Server failed")?;

    Ok(())
}

/// Map CLI args to `GatewayConfig`.
fn build_config(cli: &Cli) -> Result<GatewayConfig> {
    let mut builder = GatewayConfig::builder()
        .vision_concurrency(cli.vision_concurrency)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .fetch_timeout_secs(cli.fetch_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key);
    }
    if let Some(ref endpoint) = cli.ocr_endpoint {
        builder = builder.ocr_endpoint(endpoint);
    }
    if let Some(ref model) = cli.ocr_model {
        builder = builder.ocr_model(model);
    }
    if let Some(ref provider) = cli.vision_provider {
        builder = builder.vision_provider(provider);
    }
    if let Some(ref model) = cli.vision_model {
        builder = builder.vision_model(model);
    }

    Ok(builder.build()?)
}
