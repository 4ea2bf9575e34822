//! Configuration types for PDF text extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. The legacy string API only ever sets
//! [`ExtractionConfig::method`]; everything else keeps its default.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The literal delimiter placed between consecutive pages.
pub const PAGE_BREAK_MARKER: &str = "---PAGE_BREAK---";

/// Method string used when the caller does not choose one.
pub const DEFAULT_METHOD: &str = "docling";

/// Configuration for a PDF text extraction.
///
/// # Example
/// ```rust
/// use edgequake_pdftext::{ExtractionConfig, ExtractionMethod, TextMode};
///
/// let config = ExtractionConfig::builder()
///     .method(ExtractionMethod::Text)
///     .text_mode(TextMode::Plain)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Which strategy turns pages into text. Default: [`ExtractionMethod::Layout`].
    pub method: ExtractionMethod,

    /// What goes between consecutive pages. Default: [`PageBreak::Marker`].
    pub page_break: PageBreak,

    /// Extraction mode of the text strategy. Default: [`TextMode::Layout`].
    pub text_mode: TextMode,

    /// Drop glyphs that are not upright in layout text mode. Default: true.
    ///
    /// Rotated text is usually a watermark, a margin stamp or an axis label;
    /// interleaving it with upright lines scrambles both.
    pub strip_rotated: bool,

    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Geometry thresholds of the layout strategy.
    pub markdown: MarkdownOptions,

    /// Include YAML front-matter with document metadata (layout strategy only). Default: false.
    pub include_metadata: bool,

    /// Observer receiving per-stage and per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            method: ExtractionMethod::default(),
            page_break: PageBreak::default(),
            text_mode: TextMode::default(),
            strip_rotated: true,
            pages: PageSelection::default(),
            password: None,
            markdown: MarkdownOptions::default(),
            include_metadata: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("method", &self.method)
            .field("page_break", &self.page_break)
            .field("text_mode", &self.text_mode)
            .field("strip_rotated", &self.strip_rotated)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("markdown", &self.markdown)
            .field("include_metadata", &self.include_metadata)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default configuration for the given method.
    pub fn for_method(method: ExtractionMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn method(mut self, method: ExtractionMethod) -> Self {
        self.config.method = method;
        self
    }

    pub fn page_break(mut self, page_break: PageBreak) -> Self {
        self.config.page_break = page_break;
        self
    }

    pub fn text_mode(mut self, mode: TextMode) -> Self {
        self.config.text_mode = mode;
        self
    }

    pub fn strip_rotated(mut self, v: bool) -> Self {
        self.config.strip_rotated = v;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn markdown(mut self, options: MarkdownOptions) -> Self {
        self.config.markdown = options;
        self
    }

    pub fn include_metadata(mut self, v: bool) -> Self {
        self.config.include_metadata = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if let PageBreak::Custom(ref s) = c.page_break {
            if s.trim().is_empty() {
                return Err(ExtractError::InvalidConfig(
                    "Custom page break must not be blank".into(),
                ));
            }
        }
        let m = &c.markdown;
        if m.heading_min_ratio < 1.0 {
            return Err(ExtractError::InvalidConfig(format!(
                "heading_min_ratio must be ≥ 1.0, got {}",
                m.heading_min_ratio
            )));
        }
        if m.y_tolerance <= 0.0 || m.y_density <= 0.0 || m.x_density <= 0.0 {
            return Err(ExtractError::InvalidConfig(
                "Layout tolerances must be positive".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The two interchangeable extraction strategies.
///
/// The string forms `"docling"` and `"pypdf"` are the recognised method
/// values of [`crate::extract_text`] and the labels used in failure
/// sentinels (`[docling error] …`, `[pypdf error] …`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExtractionMethod {
    /// Layout-aware conversion to Markdown (reading order, headings, lists).
    #[default]
    #[serde(rename = "docling")]
    Layout,
    /// Per-page text extraction joined in page order.
    #[serde(rename = "pypdf")]
    Text,
}

impl ExtractionMethod {
    /// The method string accepted by [`crate::extract_text`].
    pub fn label(self) -> &'static str {
        match self {
            ExtractionMethod::Layout => "docling",
            ExtractionMethod::Text => "pypdf",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExtractionMethod {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docling" => Ok(ExtractionMethod::Layout),
            "pypdf" => Ok(ExtractionMethod::Text),
            other => Err(ExtractError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

/// How the text strategy reconstructs a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMode {
    /// Keep the visual layout: lines ordered top-to-bottom, words padded to
    /// their horizontal position, blank lines for vertical gaps. (default)
    #[default]
    Layout,
    /// pdfium's own text in content-stream order.
    Plain,
}

/// Specifies which pages of the PDF to extract.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Extract all pages (default).
    #[default]
    All,
    /// Extract a single page (1-indexed).
    Single(usize),
    /// Extract a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Extract specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// First requested page number, for error reporting.
    pub(crate) fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 0,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
        }
    }
}

/// What is inserted between consecutive pages of the assembled output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageBreak {
    /// No marker; layout pages joined with "\n\n", text pages with "\n".
    None,
    /// The literal [`PAGE_BREAK_MARKER`] on its own line. (default)
    #[default]
    Marker,
    /// Custom marker placed the same way as [`PageBreak::Marker`].
    Custom(String),
}

impl PageBreak {
    /// Render the separator for the given strategy.
    ///
    /// Markdown pages are block-level content, so their marker sits between
    /// blank lines; text pages are joined with a single newline either side.
    pub fn separator(&self, method: ExtractionMethod) -> String {
        let pad = match method {
            ExtractionMethod::Layout => "\n\n",
            ExtractionMethod::Text => "\n",
        };
        match self {
            PageBreak::None => pad.to_string(),
            PageBreak::Marker => format!("{pad}{PAGE_BREAK_MARKER}{pad}"),
            PageBreak::Custom(s) => format!("{pad}{s}{pad}"),
        }
    }
}

/// Geometry thresholds for the layout strategy, in PDF points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownOptions {
    /// Vertical tolerance for clustering glyphs into lines.
    pub y_tolerance: f32,
    /// Maximum vertical gap for grouping lines into blocks.
    pub y_density: f32,
    /// Minimum horizontal gap that splits a line into column segments.
    pub x_density: f32,
    /// Minimum font size ratio (relative to the page median) for a heading.
    pub heading_min_ratio: f32,
    /// Detect bullet/numbered lists from text patterns.
    pub detect_lists: bool,
    /// Detect bold/italic from font names.
    pub detect_emphasis: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            y_tolerance: 3.0,
            y_density: 10.0,
            x_density: 10.0,
            heading_min_ratio: 1.2,
            detect_lists: true,
            detect_emphasis: true,
        }
    }
}
