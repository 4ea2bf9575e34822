//! Shared helpers for integration tests: lopdf-built fixture PDFs and the
//! pdfium availability gate.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Skip the current test when pdfium cannot be bound.
macro_rules! skip_unless_pdfium {
    () => {{
        if !crate::common::pdfium_available() {
            println!("SKIP: pdfium library not found (set PDFIUM_LIB_PATH)");
            return;
        }
    }};
}

pub fn pdfium_available() -> bool {
    static AVAILABLE: OnceLock<bool> = OnceLock::new();
    *AVAILABLE.get_or_init(|| {
        init_tracing();
        use edgequake_pdftext::pipeline::document;
        let _session = document::lock_pdfium();
        document::bind_pdfium().is_ok()
    })
}

/// Route library logs through the test harness; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Standard-14 fonts registered on every fixture page.
#[derive(Debug, Clone, Copy)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// One line of text drawn at (`x`, `y`) in PDF user space (origin bottom-left).
#[derive(Debug, Clone)]
pub struct Line {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub font: Font,
    pub text: String,
}

impl Line {
    pub fn new(x: f32, y: f32, size: f32, text: &str) -> Self {
        Self {
            x,
            y,
            size,
            font: Font::Regular,
            text: text.to_string(),
        }
    }

    pub fn bold(mut self) -> Self {
        self.font = Font::Bold;
        self
    }
}

/// A page of body text: 12pt lines from the top margin down, 16pt apart.
pub fn body_page(lines: &[&str]) -> Vec<Line> {
    lines
        .iter()
        .enumerate()
        .map(|(i, t)| Line::new(72.0, 720.0 - i as f32 * 16.0, 12.0, t))
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

fn content_stream(lines: &[Line]) -> Vec<u8> {
    lines
        .iter()
        .map(|l| {
            format!(
                "BT /{} {} Tf {} {} Td ({}) Tj ET\n",
                l.font.resource(),
                l.size,
                l.x,
                l.y,
                escape(&l.text)
            )
        })
        .collect::<String>()
        .into_bytes()
}

/// Serialise `pages` as a PDF 1.4 document with Helvetica (F1) and
/// Helvetica-Bold (F2) on every page.
pub fn pdf_bytes(pages: &[Vec<Line>], title: Option<&str>) -> Vec<u8> {
    use lopdf::{dictionary, Object, Stream};

    let mut doc = lopdf::Document::with_version("1.4");

    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ];

    let mut page_ids = Vec::with_capacity(pages.len());
    for lines in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content_stream(lines)));
        let resources = dictionary! {
            "Font" => dictionary! {
                "F1" => Object::Reference(regular_id),
                "F2" => Object::Reference(bold_id),
            },
        };
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => media_box.clone(),
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        }));
    }

    let kids: Vec<Object> = page_ids.iter().map(|id| Object::Reference(*id)).collect();
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_ids.len() as i64),
    });
    for pid in &page_ids {
        if let Ok(page_obj) = doc.get_object_mut(*pid) {
            if let Ok(dict) = page_obj.as_dict_mut() {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut info = dictionary! {
        "Producer" => Object::string_literal("pdftext fixtures"),
    };
    if let Some(t) = title {
        info.set("Title", Object::string_literal(t));
    }
    let info_id = doc.add_object(info);
    doc.trailer.set("Info", Object::Reference(info_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialise fixture pdf");
    buf
}

/// Write a fixture PDF into `dir` and return its path.
pub fn write_pdf(dir: &Path, name: &str, pages: &[Vec<Line>], title: Option<&str>) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, pdf_bytes(pages, title)).expect("write fixture pdf");
    path
}

/// Three one-line pages reading "Page one text", "Page two text", "Page three text".
pub fn three_page_pdf(dir: &Path) -> PathBuf {
    let pages: Vec<Vec<Line>> = ["one", "two", "three"]
        .iter()
        .map(|n| body_page(&[&format!("Page {n} text")]))
        .collect();
    write_pdf(dir, "three.pdf", &pages, Some("Fixture"))
}
