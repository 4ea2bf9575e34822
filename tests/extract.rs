//! Integration tests for the extraction entry points.
//!
//! Fixture PDFs are generated on the fly into temp dirs. Tests that open a
//! document need the native pdfium library and print `SKIP` when it cannot
//! be bound.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test extract -- --nocapture

#[macro_use]
mod common;

use common::{body_page, three_page_pdf, write_pdf, Line};
use edgequake_pdftext::{
    extract, extract_async, extract_from_bytes, extract_outcome, extract_outcome_with,
    extract_text, extract_to_file, inspect, split_pages, ExtractError, ExtractionConfig, ExtractionMethod, ExtractionOutcome,
    ExtractionProgressCallback, ExtractionStage, FailureKind, PageBreak, PageSelection, TextMode,
    PAGE_BREAK_MARKER,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Failure contract (no pdfium needed) ──────────────────────────────────────

#[test]
fn test_unsupported_method_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());
    assert_eq!(
        extract_text(&path, "xml"),
        "[error] Unsupported extraction method"
    );
    assert_eq!(extract_text(&path, ""), "[error] Unsupported extraction method");
}

#[test]
fn test_nonexistent_path_is_labelled() {
    let docling = extract_text("/nonexistent/path/report.pdf", "docling");
    assert!(docling.starts_with("[docling error] "), "{docling}");

    let pypdf = extract_text("/nonexistent/path/report.pdf", "pypdf");
    assert!(pypdf.starts_with("[pypdf error] "), "{pypdf}");
}

#[test]
fn test_non_pdf_file_is_labelled() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.pdf");
    std::fs::write(&path, "just some text, no header").unwrap();

    let result = extract_text(&path, "pypdf");
    assert!(result.starts_with("[pypdf error] "), "{result}");
    assert!(matches!(
        extract(&path, &ExtractionConfig::default()),
        Err(ExtractError::NotAPdf { .. })
    ));
}

#[test]
fn test_outcome_matches_legacy_string() {
    let outcome = extract_outcome("/nonexistent/path/report.pdf", "docling");
    assert!(matches!(
        outcome,
        ExtractionOutcome::Failure {
            kind: FailureKind::Backend(ExtractionMethod::Layout),
            ..
        }
    ));
    assert_eq!(
        outcome.to_string(),
        extract_text("/nonexistent/path/report.pdf", "docling")
    );
}

struct Exploding;

impl ExtractionProgressCallback for Exploding {
    fn on_stage(&self, _stage: ExtractionStage) {
        panic!("callback exploded");
    }
}

#[test]
fn test_panic_inside_extraction_becomes_backend_sentinel() {
    let config = ExtractionConfig::builder()
        .method(ExtractionMethod::Text)
        .progress_callback(Arc::new(Exploding))
        .build()
        .unwrap();

    let outcome = extract_outcome_with("/nonexistent/path/report.pdf", &config);
    assert_eq!(
        outcome.to_string(),
        "[pypdf error] PDF backend panicked: callback exploded"
    );
}

// ── Layout strategy ("docling") ──────────────────────────────────────────────

#[test]
fn test_single_page_docling_has_no_marker() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = write_pdf(
        dir.path(),
        "single.pdf",
        &[body_page(&["Hello from a single page."])],
        None,
    );

    let text = extract_text(&path, "docling");
    assert!(!text.starts_with('['), "unexpected failure: {text}");
    assert!(text.contains("Hello from a single page."), "{text}");
    assert!(!text.contains(PAGE_BREAK_MARKER));
    assert!(text.ends_with('\n'));
}

#[test]
fn test_multi_page_docling_marker_count() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());

    let text = extract_text(&path, "docling");
    assert_eq!(text.matches(PAGE_BREAK_MARKER).count(), 2, "{text}");
    assert_eq!(text.matches("\n\n---PAGE_BREAK---\n\n").count(), 2);

    let one = text.find("Page one text").unwrap();
    let two = text.find("Page two text").unwrap();
    let three = text.find("Page three text").unwrap();
    assert!(one < two && two < three);
}

#[test]
fn test_docling_detects_heading_and_bold() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let mut page = vec![Line::new(72.0, 720.0, 24.0, "Quarterly Report")];
    page.extend(
        [
            "Revenue grew across every region this quarter.",
            "Costs were flat compared with the previous year.",
            "The outlook for next quarter remains positive.",
        ]
        .iter()
        .enumerate()
        .map(|(i, t)| Line::new(72.0, 670.0 - i as f32 * 16.0, 12.0, t)),
    );
    page.push(Line::new(72.0, 560.0, 12.0, "Important notice").bold());
    let path = write_pdf(dir.path(), "report.pdf", &[page], None);

    let text = extract_text(&path, "docling");
    assert!(text.starts_with("# Quarterly Report\n"), "{text}");
    assert!(text.contains("**Important notice**"), "{text}");
}

#[test]
fn test_docling_front_matter() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());
    let config = ExtractionConfig::builder()
        .include_metadata(true)
        .build()
        .unwrap();

    let output = extract(&path, &config).unwrap();
    assert!(output.text.starts_with("---\ntitle: \"Fixture\"\n"), "{}", output.text);
    assert!(output.text.contains("pages: 3\n"));
}

// ── Text strategy ("pypdf") ──────────────────────────────────────────────────

#[test]
fn test_multi_page_pypdf_splits_into_pages() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());

    let text = extract_text(&path, "pypdf");
    let pages = split_pages(&text);
    assert_eq!(pages.len(), 3, "{text}");
    assert_eq!(pages, vec!["Page one text", "Page two text", "Page three text"]);
}

#[test]
fn test_pypdf_empty_page_still_has_a_segment() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let pages = vec![body_page(&["first"]), Vec::new(), body_page(&["third"])];
    let path = write_pdf(dir.path(), "gap.pdf", &pages, None);

    let text = extract_text(&path, "pypdf");
    assert_eq!(split_pages(&text), vec!["first", "", "third"]);
}

#[test]
fn test_pypdf_layout_mode_keeps_columns() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let page = vec![
        Line::new(72.0, 720.0, 12.0, "Name"),
        Line::new(300.0, 720.0, 12.0, "Total"),
        Line::new(72.0, 704.0, 12.0, "Widgets"),
        Line::new(300.0, 704.0, 12.0, "42"),
    ];
    let path = write_pdf(dir.path(), "table.pdf", &[page], None);

    let text = extract_text(&path, "pypdf");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2, "{text}");
    let col = lines[0].find("Total").unwrap();
    assert_eq!(lines[1].find("42"), Some(col), "{text}");
}

#[test]
fn test_pypdf_plain_mode() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());
    let config = ExtractionConfig::builder()
        .method(ExtractionMethod::Text)
        .text_mode(TextMode::Plain)
        .build()
        .unwrap();

    let output = extract(&path, &config).unwrap();
    assert_eq!(output.pages.len(), 3);
    assert!(output.pages[1].text.contains("Page two text"));
}

#[test]
fn test_page_break_none_joins_plainly() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());
    let config = ExtractionConfig::builder()
        .method(ExtractionMethod::Text)
        .page_break(PageBreak::None)
        .build()
        .unwrap();

    let output = extract(&path, &config).unwrap();
    assert_eq!(output.text, "Page one text\nPage two text\nPage three text");
}

// ── Selection, metadata, files ───────────────────────────────────────────────

#[test]
fn test_page_selection() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());

    let config = ExtractionConfig::builder()
        .method(ExtractionMethod::Text)
        .pages(PageSelection::Set(vec![3, 1]))
        .build()
        .unwrap();
    let output = extract(&path, &config).unwrap();
    let nums: Vec<usize> = output.pages.iter().map(|p| p.page_num).collect();
    assert_eq!(nums, vec![1, 3]);
    assert_eq!(output.stats.total_pages, 3);
    assert_eq!(output.stats.extracted_pages, 2);

    let config = ExtractionConfig::builder()
        .pages(PageSelection::Single(9))
        .build()
        .unwrap();
    assert!(matches!(
        extract(&path, &config),
        Err(ExtractError::PageOutOfRange { page: 9, total: 3 })
    ));
}

#[test]
fn test_inspect_reads_metadata() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());

    let meta = inspect(&path).unwrap();
    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.title.as_deref(), Some("Fixture"));
    assert_eq!(meta.producer.as_deref(), Some("pdftext fixtures"));
    assert!(!meta.pdf_version.is_empty());
}

#[test]
fn test_corrupt_pdf_is_labelled() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"%PDF-1.4\n1 0 obj << garbage").unwrap();

    let docling = extract_text(&path, "docling");
    assert!(docling.starts_with("[docling error] "), "{docling}");
    let pypdf = extract_text(&path, "pypdf");
    assert!(pypdf.starts_with("[pypdf error] "), "{pypdf}");
}

#[test]
fn test_extract_to_file_is_atomic() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());
    let out = dir.path().join("nested/out.md");
    let config = ExtractionConfig::default();

    let stats = extract_to_file(&path, &out, &config).unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written, extract(&path, &config).unwrap().text);
    assert_eq!(stats.extracted_pages, 3);
    assert!(!dir.path().join("nested/out.md.tmp").exists());
}

#[test]
fn test_extract_from_bytes_matches_file() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());
    let config = ExtractionConfig::for_method(ExtractionMethod::Text);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(
        extract_from_bytes(&bytes, &config).unwrap().text,
        extract(&path, &config).unwrap().text
    );
}

#[test]
fn test_extraction_is_idempotent() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());

    for method in ["docling", "pypdf"] {
        assert_eq!(extract_text(&path, method), extract_text(&path, method));
    }
}

#[test]
fn test_parallel_extractions_agree() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            std::thread::spawn(move || extract_text(&path, "pypdf"))
        })
        .collect();
    let results: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for result in &results {
        assert!(!result.starts_with('['), "unexpected failure: {result}");
        assert_eq!(result, &results[0]);
        assert_eq!(split_pages(result).len(), 3);
    }
}

// ── Progress events ──────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    stages: Mutex<Vec<ExtractionStage>>,
    pages: Mutex<Vec<usize>>,
    completed: AtomicUsize,
}

impl ExtractionProgressCallback for Recorder {
    fn on_stage(&self, stage: ExtractionStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_page_complete(&self, page_num: usize, _total: usize, _chars: usize) {
        self.pages.lock().unwrap().push(page_num);
    }

    fn on_extraction_complete(&self, total_pages: usize, _chars: usize) {
        self.completed.store(total_pages, Ordering::SeqCst);
    }
}

#[test]
fn test_progress_events() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());
    let recorder = Arc::new(Recorder::default());
    let config = ExtractionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    extract(&path, &config).unwrap();

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            ExtractionStage::Resolving,
            ExtractionStage::Loading,
            ExtractionStage::Extracting,
            ExtractionStage::Assembling,
        ]
    );
    assert_eq!(*recorder.pages.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(recorder.completed.load(Ordering::SeqCst), 3);
}

// ── Async wrapper ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_extract_async_matches_sync() {
    skip_unless_pdfium!();
    let dir = tempfile::tempdir().unwrap();
    let path = three_page_pdf(dir.path());
    let config = ExtractionConfig::for_method(ExtractionMethod::Text);

    let async_out = extract_async(&path, config.clone()).await.unwrap();
    let sync_out = extract(&path, &config).unwrap();
    assert_eq!(async_out.text, sync_out.text);
}

#[tokio::test]
async fn test_extract_async_reports_missing_file() {
    let result = extract_async("/nonexistent/file.pdf", ExtractionConfig::default()).await;
    assert!(matches!(result, Err(ExtractError::FileNotFound { .. })));
}
