//! pdfium access: bind the library, open documents, read metadata and glyphs.
//!
//! Everything here is blocking and must not run on an async executor thread;
//! [`crate::extract_async`] moves the whole extraction onto the blocking pool.

use crate::error::ExtractError;
use crate::output::DocumentMetadata;
use crate::pipeline::layout::{BBox, Glyph};
use pdfium_render::prelude::*;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

static PDFIUM_SESSION: Mutex<()> = Mutex::new(());

/// Serialise pdfium sessions across threads.
///
/// A session initialises pdfium's process-global state on bind and tears it
/// down on drop, so two sessions must never overlap. Hold the guard for as
/// long as the [`Pdfium`] value and every document opened from it.
pub fn lock_pdfium() -> MutexGuard<'static, ()> {
    PDFIUM_SESSION.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Bind to a pdfium library. Callers hold [`lock_pdfium`] first.
///
/// Search order: `PDFIUM_LIB_PATH`, the platform library name in the
/// working directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, ExtractError> {
    let mut failures = Vec::new();

    if let Ok(explicit) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        match Pdfium::bind_to_library(&explicit) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}={}", PDFIUM_LIB_PATH_ENV, explicit);
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => {
                warn!("Could not bind pdfium at {}: {:?}", explicit, e);
                failures.push(format!("{explicit}: {e:?}"));
            }
        }
    }

    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|e| {
            failures.push(format!("./: {e:?}"));
            Pdfium::bind_to_system_library()
        })
        .map_err(|e| {
            failures.push(format!("system: {e:?}"));
            ExtractError::PdfiumBindingFailed(failures.join("; "))
        })?;

    Ok(Pdfium::new(bindings))
}

/// Open `path`, mapping pdfium's load errors onto the crate taxonomy.
pub fn open_document<'a>(
    pdfium: &'a Pdfium,
    path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, ExtractError> {
    pdfium.load_pdf_from_file(path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ExtractError::WrongPassword {
                    path: path.to_path_buf(),
                }
            } else {
                ExtractError::PasswordRequired {
                    path: path.to_path_buf(),
                }
            }
        } else {
            ExtractError::CorruptPdf {
                path: path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Read the info dictionary, page count and header version.
pub fn read_metadata(document: &PdfDocument) -> DocumentMetadata {
    let metadata = document.metadata();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().trim().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        creation_date: get_meta(PdfDocumentMetadataTagType::CreationDate),
        modification_date: get_meta(PdfDocumentMetadataTagType::ModificationDate),
        page_count: document.pages().len() as usize,
        pdf_version: format!("{:?}", document.version()),
    }
}

/// Collect the page's characters as [`Glyph`]s in top-down coordinates.
///
/// Characters without a Unicode value or bounds (generated spaces, some
/// ligature halves) are skipped, as are control characters.
pub fn page_glyphs(page: &PdfPage) -> Result<Vec<Glyph>, PdfiumError> {
    let page_height = page.height().value;
    let text = page.text()?;
    let chars = text.chars();

    let mut glyphs = Vec::with_capacity(chars.len() as usize);
    for ch in chars.iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        if c.is_control() {
            continue;
        }
        let Ok(rect) = ch.loose_bounds() else {
            continue;
        };
        glyphs.push(Glyph {
            ch: c,
            bbox: BBox::new(
                rect.left().value,
                page_height - rect.top().value,
                rect.right().value,
                page_height - rect.bottom().value,
            ),
            font_size: ch.scaled_font_size().value,
            font_name: ch.font_name(),
            angle: ch.angle_degrees().unwrap_or(0.0),
        });
    }
    Ok(glyphs)
}

/// pdfium's own text for the page, in content-stream order.
pub fn page_plain_text(page: &PdfPage) -> Result<String, PdfiumError> {
    Ok(page.text()?.all())
}
