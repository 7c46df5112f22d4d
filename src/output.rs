//! Response types: the stable output contract of every flow.
//!
//! Field names serialise in camelCase. Whichever upstream path produced a
//! page, it is reported through the same [`Page`] shape.

use crate::request::ValidationIssue;
use serde::{Deserialize, Serialize};

/// Top-level status discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// One normalized page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based page number.
    pub page_number: usize,
    pub text: String,
    /// Always identical to `text`.
    pub markdown: String,
    pub image_base64: Option<String>,
    /// `None` omits the field (extraction-only output); `Some(None)`
    /// serialises as `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_uri: Option<Option<String>>,
}

impl Page {
    /// Build a page whose `text` and `markdown` carry the same content.
    pub fn new(page_number: usize, content: String) -> Self {
        Self {
            page_number,
            markdown: content.clone(),
            text: content,
            image_base64: None,
            data_uri: None,
        }
    }
}

/// Body of a successful `/extract` or `/extract-enriched` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub status: Status,
    pub pages: Vec<Page>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_data_uri: Option<String>,
}

impl AnalysisResult {
    pub fn new(pages: Vec<Page>, document_data_uri: Option<String>) -> Self {
        Self {
            status: Status::Success,
            pages,
            document_data_uri,
        }
    }
}

/// Body of a successful `/describe-image` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeResult {
    pub status: Status,
    pub data_uri: String,
    pub description: String,
    pub pages: Vec<Page>,
}

/// Body of every failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResult {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_issues: Option<Vec<ValidationIssue>>,
}

impl ErrorResult {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            validation_issues: None,
        }
    }

    pub fn validation(issues: Vec<ValidationIssue>) -> Self {
        Self {
            status: Status::Error,
            message: "Invalid request body".to_string(),
            validation_issues: Some(issues),
        }
    }
}
