//! Progress-callback trait for extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractionConfigBuilder::progress_callback`] to receive
//! events as the extractor moves through its stages and pages. The same
//! events are always logged through `tracing`; the callback is for callers
//! that want them as data (progress bars, job records).
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdftext::{ExtractionConfig, ExtractionProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl ExtractionProgressCallback for PageCounter {
//!     fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _chars: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = ExtractionConfig::builder()
//!     .progress_callback(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Coarse phases of a single extraction call, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStage {
    /// Validating the input path.
    Resolving,
    /// Binding pdfium and opening the document.
    Loading,
    /// Walking the selected pages.
    Extracting,
    /// Joining pages into the final text.
    Assembling,
}

impl fmt::Display for ExtractionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtractionStage::Resolving => "resolving",
            ExtractionStage::Loading => "loading",
            ExtractionStage::Extracting => "extracting",
            ExtractionStage::Assembling => "assembling",
        };
        f.write_str(s)
    }
}

/// Called by the extractor as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because
/// [`crate::extract_async`] runs the extraction on a blocking-pool thread.
/// Events fire while the pdfium session lock is held, so a callback must
/// not start another extraction.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called when the extractor enters a new stage.
    fn on_stage(&self, stage: ExtractionStage) {
        let _ = stage;
    }

    /// Called once the document is open and the page selection is known.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be extracted
    fn on_extraction_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before a page is read.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — pages in the selection
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page's text has been produced.
    ///
    /// `char_count` is the number of characters of that page's text.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, char_count: usize) {
        let _ = (page_num, total_pages, char_count);
    }

    /// Called once after the output has been assembled.
    fn on_extraction_complete(&self, total_pages: usize, char_count: usize) {
        let _ = (total_pages, char_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractionConfig`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        stages: Mutex<Vec<ExtractionStage>>,
        starts: AtomicUsize,
        completes: AtomicUsize,
        chars: AtomicUsize,
    }

    impl ExtractionProgressCallback for TrackingCallback {
        fn on_stage(&self, stage: ExtractionStage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, char_count: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
            self.chars.fetch_add(char_count, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage(ExtractionStage::Loading);
        cb.on_extraction_start(5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5, 42);
        cb.on_extraction_complete(5, 420);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_stage(ExtractionStage::Resolving);
        tracker.on_stage(ExtractionStage::Loading);
        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, 100);
        tracker.on_page_start(2, 2);
        tracker.on_page_complete(2, 2, 50);

        assert_eq!(
            *tracker.stages.lock().unwrap(),
            vec![ExtractionStage::Resolving, ExtractionStage::Loading]
        );
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.chars.load(Ordering::SeqCst), 150);
    }

    #[test]
    fn stage_display_is_lowercase() {
        assert_eq!(ExtractionStage::Extracting.to_string(), "extracting");
    }
}
