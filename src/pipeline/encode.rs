//! Base64 and data-URI helpers.
//!
//! Every image crosses the pipeline as a `data:<type>;base64,<payload>` URI:
//! that is what vision APIs accept inline and what the response contract
//! exposes in `dataUri`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Media type assumed for images embedded in extracted pages.
pub const EMBEDDED_IMAGE_MEDIA_TYPE: &str = "image/jpeg";

/// Base64-encode raw bytes with the standard alphabet.
pub fn encode_bytes(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded {} bytes → {} bytes base64", bytes.len(), b64.len());
    b64
}

/// Wrap an existing base64 payload in a data URI.
pub fn data_uri(media_type: &str, base64: &str) -> String {
    format!("data:{media_type};base64,{base64}")
}

/// Split a base64 data URI into `(media_type, payload)`.
///
/// Returns `None` for anything that is not a base64 data URI.
pub fn split_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let media_type = header.strip_suffix(";base64")?;
    Some((media_type, payload))
}

/// Drop a `data:...;base64,` prefix if present, leaving the bare payload.
pub fn strip_data_uri_prefix(value: &str) -> &str {
    split_data_uri(value).map_or(value, |(_, payload)| payload)
}
