//! Page normalization: map engine output onto the [`Page`] contract.
//!
//! Three policies, one output shape:
//!
//! | Policy | `text`/`markdown` | `imageBase64` | `dataUri` |
//! |--------|-------------------|---------------|-----------|
//! | [`normalize_extracted`] | raw text | first embedded image | omitted |
//! | [`normalize_enriched`] | vision description, raw text as fallback | first embedded image | image URI or `null` |
//! | [`normalize_single_image`] | vision description | fetched bytes | fetched URI |
//!
//! Page numbers come from the engine's zero-based index when present
//! (`index + 1`), else from 1-based position.

use crate::output::Page;
use crate::pipeline::encode::{self, EMBEDDED_IMAGE_MEDIA_TYPE};
use crate::pipeline::extract::RawPage;
use crate::pipeline::fetch::FetchedDocument;
use crate::pipeline::vision::{self, VisionEngine};
use crate::prompts::AnalysisPrompt;
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// 1-based page number for the raw page at `position`.
pub fn page_number(raw: &RawPage, position: usize) -> usize {
    raw.index.map_or(position + 1, |i| i.saturating_add(1))
}

/// Extraction-only policy.
pub fn normalize_extracted(raw_pages: &[RawPage]) -> Vec<Page> {
    raw_pages
        .iter()
        .enumerate()
        .map(|(pos, raw)| {
            let mut page = Page::new(page_number(raw, pos), raw.text.clone());
            page.image_base64 = raw.first_image().map(|img| img.base64.clone());
            page
        })
        .collect()
}

/// Extraction-plus-vision policy.
///
/// Each page with an embedded image is described by the vision engine. A
/// failed call is logged and the page keeps its extracted text; the rest of
/// the document is processed regardless. At most `concurrency` calls are in
/// flight and output order always matches input order.
pub async fn normalize_enriched(
    raw_pages: &[RawPage],
    engine: &dyn VisionEngine,
    prompt: &AnalysisPrompt,
    concurrency: usize,
) -> Vec<Page> {
    // Collected first: a borrowing `map` closure inside the stream makes the
    // flow future fail axum's `Send` bound.
    let pages: Vec<_> = raw_pages
        .iter()
        .enumerate()
        .map(|(pos, raw)| enrich_page(raw, pos, engine, prompt))
        .collect();
    stream::iter(pages)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

async fn enrich_page(
    raw: &RawPage,
    position: usize,
    engine: &dyn VisionEngine,
    prompt: &AnalysisPrompt,
) -> Page {
    let number = page_number(raw, position);

    let Some(image) = raw.first_image() else {
        let mut page = Page::new(number, raw.text.clone());
        page.data_uri = Some(None);
        return page;
    };

    let image_uri = encode::data_uri(EMBEDDED_IMAGE_MEDIA_TYPE, &image.base64);
    let content = match vision::describe(engine, &image_uri, prompt).await {
        Ok(description) => {
            debug!("Page {}: enriched ({} chars)", number, description.len());
            description
        }
        Err(e) => {
            warn!("Page {}: vision enrichment failed, keeping extracted text: {}", number, e);
            raw.text.clone()
        }
    };

    let mut page = Page::new(number, content);
    page.image_base64 = Some(image.base64.clone());
    page.data_uri = Some(Some(image_uri));
    page
}

/// Vision-only policy: exactly one page built from the fetched document.
pub fn normalize_single_image(document: &FetchedDocument, description: String) -> Vec<Page> {
    let mut page = Page::new(1, description);
    page.image_base64 = Some(document.base64.clone());
    page.data_uri = Some(Some(document.data_uri.clone()));
    vec![page]
}
