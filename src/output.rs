//! Result types returned by the extraction entry points.

use crate::config::{ExtractionMethod, PAGE_BREAK_MARKER};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed sentinel returned for an unrecognised method string.
pub const UNSUPPORTED_METHOD_SENTINEL: &str = "[error] Unsupported extraction method";

/// Full result of a successful [`crate::extract`] call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// Assembled document text, pages joined by the configured page break.
    pub text: String,
    /// Per-page text in page order.
    pub pages: Vec<PageText>,
    /// Document metadata read while the file was open.
    pub metadata: DocumentMetadata,
    /// Counters and timings.
    pub stats: ExtractionStats,
}

/// Text of one extracted page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Markdown (layout strategy) or plain text (text strategy).
    pub text: String,
}

/// Document-level metadata extracted from the PDF info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Counters and timings of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages included in the output.
    pub extracted_pages: usize,
    /// Characters in the assembled text.
    pub total_chars: usize,
    /// Wall-clock time of the whole call.
    pub duration_ms: u64,
}

/// Which failure path produced an [`ExtractionOutcome::Failure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The named strategy failed (file, PDF structure, pdfium, page).
    Backend(ExtractionMethod),
    /// The method string was not recognised; nothing was attempted.
    UnsupportedMethod,
}

/// Tagged result of the never-failing extraction API.
///
/// `Display` renders the legacy string contract: the text itself on
/// success, `[docling error] …` / `[pypdf error] …` for backend failures and
/// exactly [`UNSUPPORTED_METHOD_SENTINEL`] for an unknown method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionOutcome {
    Success(String),
    Failure { kind: FailureKind, message: String },
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success(_))
    }

    /// The extracted text, if the extraction succeeded.
    pub fn text(&self) -> Option<&str> {
        match self {
            ExtractionOutcome::Success(text) => Some(text),
            ExtractionOutcome::Failure { .. } => None,
        }
    }

    /// Convert into a `Result`, keeping the failure tag.
    pub fn into_result(self) -> Result<String, (FailureKind, String)> {
        match self {
            ExtractionOutcome::Success(text) => Ok(text),
            ExtractionOutcome::Failure { kind, message } => Err((kind, message)),
        }
    }

    /// Interpret a legacy result string by its bracketed prefix.
    ///
    /// The message of an unsupported-method sentinel cannot be recovered and
    /// comes back empty.
    pub fn from_legacy(s: &str) -> Self {
        if s == UNSUPPORTED_METHOD_SENTINEL {
            return ExtractionOutcome::Failure {
                kind: FailureKind::UnsupportedMethod,
                message: String::new(),
            };
        }
        for method in [ExtractionMethod::Layout, ExtractionMethod::Text] {
            let prefix = format!("[{} error]", method.label());
            if let Some(rest) = s.strip_prefix(&prefix) {
                return ExtractionOutcome::Failure {
                    kind: FailureKind::Backend(method),
                    message: rest.strip_prefix(' ').unwrap_or(rest).to_string(),
                };
            }
        }
        ExtractionOutcome::Success(s.to_string())
    }
}

impl fmt::Display for ExtractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionOutcome::Success(text) => f.write_str(text),
            ExtractionOutcome::Failure {
                kind: FailureKind::Backend(method),
                message,
            } => write!(f, "[{} error] {}", method.label(), message),
            ExtractionOutcome::Failure {
                kind: FailureKind::UnsupportedMethod,
                ..
            } => f.write_str(UNSUPPORTED_METHOD_SENTINEL),
        }
    }
}

impl From<ExtractionOutcome> for String {
    fn from(outcome: ExtractionOutcome) -> Self {
        match outcome {
            ExtractionOutcome::Success(text) => text,
            failure => failure.to_string(),
        }
    }
}

/// Split a text-strategy result back into its pages.
///
/// Uses the marker with its surrounding newlines, so a document extracted
/// with the default page break yields exactly one slice per page.
pub fn split_pages(text: &str) -> Vec<&str> {
    let delimiter = format!("\n{PAGE_BREAK_MARKER}\n");
    text.split(delimiter.as_str()).collect()
}
