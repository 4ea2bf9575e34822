//! Pipeline stages for PDF text extraction.
//!
//! Each submodule implements exactly one step. The geometry stages
//! ([`layout`], [`markdown`], [`text`]) work on plain [`layout::Glyph`]
//! values rather than pdfium handles, so they are testable without the
//! native library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ document ──▶ layout ──┬─▶ markdown ──▶ postprocess   ("docling")
//! (path)    (pdfium)     (glyphs) └─▶ text     ──▶ postprocess   ("pypdf")
//! ```
//!
//! 1. [`input`]    — validate the path and the `%PDF` header
//! 2. [`document`] — bind pdfium, open the file, read metadata and glyphs
//! 3. [`layout`]   — cluster glyphs into words, lines and blocks
//! 4. [`markdown`] — classify blocks and render Markdown
//! 5. [`text`]     — rebuild a page's text in layout or plain mode
//! 6. [`postprocess`] — deterministic whitespace and Unicode cleanup

pub mod document;
pub mod input;
pub mod layout;
pub mod markdown;
pub mod postprocess;
pub mod text;
