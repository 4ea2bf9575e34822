//! Extraction entry points.
//!
//! [`extract`] is the typed API every other entry point builds on. The
//! legacy [`extract_text`] contract (a plain string that is never an error)
//! is [`extract_outcome`] rendered through `Display`; the outcome functions
//! are the only place where errors and panics are turned into values.

use crate::config::{ExtractionConfig, ExtractionMethod, PageSelection, TextMode};
use crate::error::ExtractError;
use crate::output::{
    DocumentMetadata, ExtractionOutcome, ExtractionOutput, ExtractionStats, FailureKind, PageText,
};
use crate::pipeline::{document, input, markdown, postprocess, text};
use crate::progress::ExtractionStage;
use pdfium_render::prelude::*;
use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract the text of a PDF with the named method.
///
/// `method` is `"docling"` (layout-aware Markdown) or `"pypdf"` (plain text).
/// Never fails: errors come back as `[docling error] …` / `[pypdf error] …`
/// and an unknown method as `[error] Unsupported extraction method`.
///
/// ```rust,no_run
/// let text = edgequake_pdftext::extract_text("report.pdf", "pypdf");
/// for page in edgequake_pdftext::split_pages(&text) {
///     println!("{}", page.len());
/// }
/// ```
pub fn extract_text(path: impl AsRef<Path>, method: &str) -> String {
    extract_outcome(path, method).into()
}

/// Like [`extract_text`] but returns the tagged outcome.
///
/// An unknown method is rejected before the path is looked at.
pub fn extract_outcome(path: impl AsRef<Path>, method: &str) -> ExtractionOutcome {
    let method = match method.parse::<ExtractionMethod>() {
        Ok(m) => m,
        Err(_) => {
            warn!("Unsupported extraction method: {:?}", method);
            return ExtractionOutcome::Failure {
                kind: FailureKind::UnsupportedMethod,
                message: method.to_string(),
            };
        }
    };
    extract_outcome_with(path, &ExtractionConfig::for_method(method))
}

/// Run [`extract`] behind the error boundary with an explicit config.
///
/// Errors and panics raised while the document is being read become
/// [`ExtractionOutcome::Failure`] tagged with `config.method`.
pub fn extract_outcome_with(path: impl AsRef<Path>, config: &ExtractionConfig) -> ExtractionOutcome {
    let path = path.as_ref();
    let method = config.method;

    match panic::catch_unwind(AssertUnwindSafe(|| extract(path, config))) {
        Ok(Ok(output)) => ExtractionOutcome::Success(output.text),
        Ok(Err(e)) => {
            warn!("{} extraction failed for {}: {}", method, path.display(), e);
            ExtractionOutcome::Failure {
                kind: FailureKind::Backend(method),
                message: e.to_string(),
            }
        }
        Err(payload) => {
            let detail = panic_detail(payload.as_ref());
            warn!("{} extraction panicked for {}: {}", method, path.display(), detail);
            ExtractionOutcome::Failure {
                kind: FailureKind::Backend(method),
                message: format!("PDF backend panicked: {detail}"),
            }
        }
    }
}

/// Extract a PDF with full control over the output.
///
/// # Errors
/// - File not found / permission denied / not a PDF
/// - Corrupt document, missing or wrong password
/// - pdfium could not be bound
/// - A selected page could not be read, or the selection matches no page
pub fn extract(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    let path = path.as_ref();
    let method = config.method;
    info!("Starting {} extraction: {}", method, path.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    notify_stage(config, ExtractionStage::Resolving);
    let pdf_path = input::resolve_local(path)?;

    // ── Step 2: Load document ────────────────────────────────────────────
    notify_stage(config, ExtractionStage::Loading);
    let _session = document::lock_pdfium();
    let pdfium = document::bind_pdfium()?;
    let doc = document::open_document(&pdfium, &pdf_path, config.password.as_deref())?;
    let metadata = document::read_metadata(&doc);
    let total_pages = metadata.page_count;
    info!("PDF has {} pages", total_pages);

    // ── Step 3: Compute page indices ─────────────────────────────────────
    let indices = select_pages(&config.pages, total_pages)?;
    let selected = indices.len();
    if let Some(cb) = &config.progress_callback {
        cb.on_extraction_start(selected);
    }

    // ── Step 4: Extract pages ────────────────────────────────────────────
    notify_stage(config, ExtractionStage::Extracting);
    let pages = doc.pages();
    let mut page_texts = Vec::with_capacity(selected);

    for &idx in &indices {
        let page_num = idx + 1;
        if let Some(cb) = &config.progress_callback {
            cb.on_page_start(page_num, selected);
        }
        debug!("Extracting page {}/{}", page_num, total_pages);

        let page = pages
            .get(idx as u16)
            .map_err(|e| page_error(page_num, e))?;
        let text = match method {
            ExtractionMethod::Layout => layout_page(&page, config),
            ExtractionMethod::Text => text_page(&page, config),
        }
        .map_err(|e| page_error(page_num, e))?;

        let chars = text.chars().count();
        debug!("Page {} → {} chars", page_num, chars);
        if let Some(cb) = &config.progress_callback {
            cb.on_page_complete(page_num, selected, chars);
        }
        page_texts.push(PageText { page_num, text });
    }

    // ── Step 5: Assemble ─────────────────────────────────────────────────
    notify_stage(config, ExtractionStage::Assembling);
    let text = assemble_document(&page_texts, config, &metadata);

    let stats = ExtractionStats {
        total_pages,
        extracted_pages: page_texts.len(),
        total_chars: text.chars().count(),
        duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Extraction complete: {}/{} pages, {} chars, {}ms",
        stats.extracted_pages, stats.total_pages, stats.total_chars, stats.duration_ms
    );
    if let Some(cb) = &config.progress_callback {
        cb.on_extraction_complete(stats.extracted_pages, stats.total_chars);
    }

    Ok(ExtractionOutput {
        text,
        pages: page_texts,
        metadata,
        stats,
    })
}

/// Run [`extract`] on tokio's blocking pool.
///
/// pdfium calls are CPU-bound and blocking; this keeps them off the async
/// executor threads.
pub async fn extract_async(
    path: impl AsRef<Path>,
    config: ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || extract(&path, &config))
        .await
        .map_err(|e| ExtractError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Extract a PDF held in memory.
///
/// The bytes are written to a managed [`tempfile`] that is removed when the
/// call returns.
///
/// ```rust,no_run
/// use edgequake_pdftext::{extract_from_bytes, ExtractionConfig};
///
/// let bytes = std::fs::read("document.pdf")?;
/// let output = extract_from_bytes(&bytes, &ExtractionConfig::default())?;
/// println!("{}", output.text);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn extract_from_bytes(
    bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let mut tmp = tempfile::Builder::new()
        .prefix("pdftext-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| ExtractError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|e| ExtractError::Internal(format!("tempfile write: {e}")))?;
    // `tmp` is dropped (and the file deleted) when `extract` returns
    extract(tmp.path(), config)
}

/// Extract a PDF and write the text to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub fn extract_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionStats, ExtractError> {
    let output = extract(path, config)?;
    let out = output_path.as_ref();
    write_atomic(out, &output.text)?;

    info!("Wrote {} chars to {}", output.stats.total_chars, out.display());
    Ok(output.stats)
}

/// Read PDF metadata and page count without extracting any text.
pub fn inspect(path: impl AsRef<Path>) -> Result<DocumentMetadata, ExtractError> {
    let pdf_path = input::resolve_local(path.as_ref())?;
    let _session = document::lock_pdfium();
    let pdfium = document::bind_pdfium()?;
    let doc = document::open_document(&pdfium, &pdf_path, None)?;
    Ok(document::read_metadata(&doc))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn notify_stage(config: &ExtractionConfig, stage: ExtractionStage) {
    debug!("Stage: {}", stage);
    if let Some(cb) = &config.progress_callback {
        cb.on_stage(stage);
    }
}

/// Resolve the selection against the document.
///
/// An explicit selection that matches no page is an error, whatever the
/// page count; `All` on an empty document selects nothing.
fn select_pages(
    selection: &PageSelection,
    total_pages: usize,
) -> Result<Vec<usize>, ExtractError> {
    let indices = selection.to_indices(total_pages);
    if indices.is_empty() && !matches!(selection, PageSelection::All) {
        return Err(ExtractError::PageOutOfRange {
            page: selection.first_requested(),
            total: total_pages,
        });
    }
    Ok(indices)
}

/// Write `text` to `<out>.tmp`, then rename it over `out`.
///
/// The temp file is removed if the rename fails.
fn write_atomic(out: &Path, text: &str) -> Result<(), ExtractError> {
    let write_err = |e| ExtractError::OutputWriteFailed {
        path: out.to_path_buf(),
        source: e,
    };

    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut tmp_name = out.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, text).map_err(write_err)?;
    if let Err(e) = std::fs::rename(&tmp_path, out) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }
    Ok(())
}

fn page_error(page_num: usize, e: PdfiumError) -> ExtractError {
    ExtractError::PageExtractionFailed {
        page: page_num,
        detail: format!("{:?}", e),
    }
}

/// One page as cleaned Markdown, without a trailing newline.
fn layout_page(page: &PdfPage, config: &ExtractionConfig) -> Result<String, PdfiumError> {
    let glyphs = document::page_glyphs(page)?;
    let md = markdown::render_page(&glyphs, &config.markdown);
    Ok(postprocess::clean_markdown(&md).trim_end().to_string())
}

fn text_page(page: &PdfPage, config: &ExtractionConfig) -> Result<String, PdfiumError> {
    let raw = match config.text_mode {
        TextMode::Layout => {
            let glyphs = document::page_glyphs(page)?;
            text::render_layout_text(&glyphs, config.strip_rotated, config.markdown.y_tolerance)
        }
        TextMode::Plain => document::page_plain_text(page)?,
    };
    Ok(postprocess::clean_text(&raw))
}

/// Join page texts with the configured page break.
///
/// A separator is emitted between every pair of consecutive pages, empty
/// pages included, so the output always splits back into one segment per
/// extracted page. Markdown output ends with a newline.
fn assemble_document(
    pages: &[PageText],
    config: &ExtractionConfig,
    metadata: &DocumentMetadata,
) -> String {
    let mut out = String::new();

    // Optional YAML front-matter
    if config.include_metadata && config.method == ExtractionMethod::Layout {
        out.push_str(&format_yaml_front_matter(metadata));
    }

    let separator = config.page_break.separator(config.method);
    let body = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(&separator);
    out.push_str(&body);

    if config.method == ExtractionMethod::Layout && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Format document metadata as YAML front matter.
fn format_yaml_front_matter(meta: &DocumentMetadata) -> String {
    let mut yaml = String::from("---\n");

    let fields = [
        ("title", &meta.title),
        ("author", &meta.author),
        ("subject", &meta.subject),
        ("creator", &meta.creator),
        ("producer", &meta.producer),
    ];
    for (key, value) in fields {
        if let Some(v) = value {
            yaml.push_str(&format!("{}: \"{}\"\n", key, yaml_escape(v)));
        }
    }
    yaml.push_str(&format!("pages: {}\n", meta.page_count));
    if !meta.pdf_version.is_empty() {
        yaml.push_str(&format!("pdf_version: \"{}\"\n", meta.pdf_version));
    }

    yaml.push_str("---\n\n");
    yaml
}

/// Escape a value for a double-quoted YAML scalar.
fn yaml_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
