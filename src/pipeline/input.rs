//! Input validation: make sure the path names a readable PDF before pdfium
//! ever sees it.
//!
//! pdfium reports every unreadable input as the same opaque load failure.
//! Checking existence, permissions and the `%PDF` header up front gives the
//! caller a precise error, and lets the legacy API report a missing file
//! without needing the native library at all.

use crate::error::ExtractError;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bytes scanned for the `%PDF-` header. Readers accept leading junk up to
/// this offset.
const HEADER_SCAN_LEN: usize = 1024;

/// Validate that `path` is an existing, readable file carrying a PDF header.
pub fn resolve_local(path: &Path) -> Result<PathBuf, ExtractError> {
    if !path.exists() {
        return Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(ExtractError::NotAPdf {
            path: path.to_path_buf(),
            magic: Vec::new(),
        });
    }

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut head = Vec::with_capacity(HEADER_SCAN_LEN);
    file.by_ref()
        .take(HEADER_SCAN_LEN as u64)
        .read_to_end(&mut head)
        .map_err(|e| ExtractError::Internal(format!("Failed to read '{}': {e}", path.display())))?;

    if !has_pdf_header(&head) {
        let magic = head.iter().take(4).copied().collect();
        return Err(ExtractError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

fn has_pdf_header(head: &[u8]) -> bool {
    head.windows(5).any(|w| w == b"%PDF-")
}
