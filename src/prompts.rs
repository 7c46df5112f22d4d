//! Analysis prompts sent to the vision model.
//!
//! Prompts are named and versioned so a log line or a bug report can say
//! exactly which instruction produced a description. The vision client takes
//! an [`AnalysisPrompt`] by reference and never embeds prompt text itself.
//!
//! Callers can swap either prompt through [`crate::config::GatewayConfig::prompts`];
//! the constants here are the defaults.

use serde::{Deserialize, Serialize};

/// A named, versioned instruction for the vision model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisPrompt {
    pub name: String,
    pub version: u32,
    pub text: String,
}

impl AnalysisPrompt {
    pub fn new(name: impl Into<String>, version: u32, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version,
            text: text.into(),
        }
    }

    /// `name@vN`, used in log fields.
    pub fn label(&self) -> String {
        format!("{}@v{}", self.name, self.version)
    }
}

/// Prompt applied to each embedded page image during enrichment.
pub const PAGE_ANALYSIS_TEXT: &str = r#"You are analysing a single page image extracted from a document.

Describe the page so that someone who cannot see it understands its full content:

1. Transcribe every piece of visible text, preserving reading order.
2. Describe charts, diagrams, photos, and figures, including any values, labels, and legends they show.
3. Reproduce tables as Markdown tables.
4. Note handwriting, stamps, signatures, and annotations where present.

Output ONLY the description in Markdown. Do not add commentary about the task."#;

/// Prompt applied to a standalone image in the vision-only flow.
pub const IMAGE_DESCRIPTION_TEXT: &str = r#"Describe this image in detail.

Transcribe all visible text exactly as written, then describe the layout, any charts, diagrams, tables, or photos, and the information they convey.

Output ONLY the description in Markdown."#;

/// The pair of prompts the pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    /// Used by the enrichment flow, both per page and for single images.
    pub page_analysis: AnalysisPrompt,
    /// Used by the vision-only flow.
    pub image_description: AnalysisPrompt,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            page_analysis: AnalysisPrompt::new("page-analysis", 1, PAGE_ANALYSIS_TEXT),
            image_description: AnalysisPrompt::new("image-description", 1, IMAGE_DESCRIPTION_TEXT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prompts_are_named_and_versioned() {
        let set = PromptSet::default();
        assert_eq!(set.page_analysis.label(), "page-analysis@v1");
        assert_eq!(set.image_description.label(), "image-description@v1");
        assert_ne!(set.page_analysis.text, set.image_description.text);
    }

    #[test]
    fn prompts_ask_for_description_only() {
        for text in [PAGE_ANALYSIS_TEXT, IMAGE_DESCRIPTION_TEXT] {
            assert!(text.contains("Output ONLY"));
        }
    }
}
