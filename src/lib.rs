//! # edgequake-pdftext
//!
//! Extract the text of PDF documents, either as layout-aware Markdown or as
//! plain per-page text, with explicit page-break markers between pages.
//!
//! ## Why this crate?
//!
//! Downstream consumers (summarisers, indexers, chunkers) need to know where
//! one page ends and the next begins, and they need a result they can always
//! hold on to, even when the PDF is broken. Every entry point here joins
//! pages with a `---PAGE_BREAK---` marker, and the legacy [`extract_text`]
//! contract folds every failure into a labelled string instead of an error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     validate path, permissions and %PDF header
//!  ├─ 2. Load      bind pdfium, open the document, read metadata
//!  ├─ 3. Glyphs    per-page characters with boxes, sizes, fonts, rotation
//!  ├─ 4. Render    "docling": blocks → Markdown   "pypdf": rows → text
//!  ├─ 5. Polish    deterministic cleanup (line endings, ligatures, spacing)
//!  └─ 6. Output    pages joined by the page-break marker + stats
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdftext::{extract, extract_text, ExtractionConfig, ExtractionMethod};
//!
//! // Legacy contract: always a string.
//! let markdown = extract_text("paper.pdf", "docling");
//! if markdown.starts_with("[docling error]") {
//!     eprintln!("{markdown}");
//! }
//!
//! // Typed API.
//! let config = ExtractionConfig::for_method(ExtractionMethod::Text);
//! let output = extract("paper.pdf", &config)?;
//! println!("{} pages, {} chars", output.stats.extracted_pages, output.stats.total_chars);
//! # Ok::<(), edgequake_pdftext::ExtractError>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftext` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-pdftext = { version = "0.1", default-features = false }
//! ```
//!
//! ## pdfium
//!
//! The native pdfium library is located at call time: `PDFIUM_LIB_PATH`
//! first, then the working directory, then the system library path.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, ExtractionMethod, MarkdownOptions, PageBreak,
    PageSelection, TextMode, DEFAULT_METHOD, PAGE_BREAK_MARKER,
};
pub use error::ExtractError;
pub use extract::{
    extract, extract_async, extract_from_bytes, extract_outcome, extract_outcome_with,
    extract_text, extract_to_file, inspect,
};
pub use output::{
    split_pages, DocumentMetadata, ExtractionOutcome, ExtractionOutput, ExtractionStats,
    FailureKind, PageText, UNSUPPORTED_METHOD_SENTINEL,
};
pub use progress::{
    ExtractionProgressCallback, ExtractionStage, NoopProgressCallback, ProgressCallback,
};
