//! Inbound request validation.
//!
//! The HTTP layer hands the raw JSON body to [`validate`] untouched, so every
//! malformed request (wrong types, unknown kind, missing URL, even a body that
//! is not an object) is answered with the same issue-list shape. All issues
//! are collected before returning; the caller can fix every field at once.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

/// The two document kinds the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "pdf" => Some(DocumentKind::Pdf),
            "image" => Some(DocumentKind::Image),
            _ => None,
        }
    }

    /// Media type assumed when the remote server does not send one.
    pub fn default_media_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Image => "image/jpeg",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Pdf => f.write_str("pdf"),
            DocumentKind::Image => f.write_str("image"),
        }
    }
}

/// Optional caller-supplied labels, carried through for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub source: Option<String>,
    pub document_id: Option<String>,
}

/// A validated analysis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub kind: DocumentKind,
    pub url: Url,
    pub metadata: Option<RequestMetadata>,
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending field, e.g. `metadata.source`.
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate an untyped request body.
///
/// Unknown fields are dropped. On rejection every issue is returned, in the
/// order `kind`, `url`, `metadata`.
pub fn validate(body: &Value) -> Result<AnalysisRequest, Vec<ValidationIssue>> {
    let Some(obj) = body.as_object() else {
        return Err(vec![ValidationIssue::new(
            "body",
            "Expected a JSON object with `kind` and `url`",
        )]);
    };

    let mut issues = Vec::new();
    let kind = validate_kind(obj, &mut issues);
    let url = validate_url(obj, &mut issues);
    let metadata = validate_metadata(obj, &mut issues);

    match (kind, url) {
        (Some(kind), Some(url)) if issues.is_empty() => Ok(AnalysisRequest {
            kind,
            url,
            metadata,
        }),
        _ => Err(issues),
    }
}

fn validate_kind(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) -> Option<DocumentKind> {
    let kind = obj
        .get("kind")
        .and_then(Value::as_str)
        .and_then(DocumentKind::parse);
    if kind.is_none() {
        issues.push(ValidationIssue::new(
            "kind",
            "Invalid enum value. Expected 'pdf' | 'image'",
        ));
    }
    kind
}

fn validate_url(obj: &Map<String, Value>, issues: &mut Vec<ValidationIssue>) -> Option<Url> {
    match obj.get("url") {
        None | Some(Value::Null) => {
            issues.push(ValidationIssue::new("url", "Required"));
            None
        }
        Some(Value::String(raw)) => match Url::parse(raw) {
            // `Url::parse` only succeeds for absolute URLs with a scheme.
            Ok(url) => Some(url),
            Err(e) => {
                issues.push(ValidationIssue::new("url", format!("Invalid url: {e}")));
                None
            }
        },
        Some(_) => {
            issues.push(ValidationIssue::new("url", "Expected string"));
            None
        }
    }
}

fn validate_metadata(
    obj: &Map<String, Value>,
    issues: &mut Vec<ValidationIssue>,
) -> Option<RequestMetadata> {
    let meta = match obj.get("metadata") {
        None | Some(Value::Null) => return None,
        Some(Value::Object(meta)) => meta,
        Some(_) => {
            issues.push(ValidationIssue::new("metadata", "Expected object"));
            return None;
        }
    };

    let mut string_field = |key: &str| match meta.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            issues.push(ValidationIssue::new(
                &format!("metadata.{key}"),
                "Expected string",
            ));
            None
        }
    };

    let source = string_field("source");
    let document_id = string_field("documentId");
    Some(RequestMetadata {
        source,
        document_id,
    })
}
