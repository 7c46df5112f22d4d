//! Pipeline stages for document analysis.
//!
//! Each submodule implements exactly one step, and the two upstream engines
//! sit behind traits so the orchestrator can be exercised without network.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──▶ vision ──▶ normalize
//! (URL)     (OCR)       (VLM)      (Page contract)
//! ```
//!
//! 1. [`fetch`]: download the source document into memory
//! 2. [`extract`]: OCR engine client; coerces its JSON into `RawPage`
//! 3. [`vision`]: vision model client; empty completions become a sentinel
//! 4. [`normalize`]: merge engine output into `Page` records
//! 5. [`encode`]: base64 / data-URI helpers shared by the stages above

pub mod encode;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod vision;
