//! Markdown rendering for one page of glyphs.
//!
//! Blocks are classified by font size relative to the page median
//! (headings), by leading markers (list items) and otherwise become
//! paragraphs. Font names drive bold/italic emphasis.

use crate::config::MarkdownOptions;
use crate::pipeline::layout::{
    cluster_lines_into_blocks, glyphs_to_lines, median_font_size, sort_blocks_reading_order,
    split_lines_at_columns, Glyph, TextBlock, TextLine, Word,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Longest block, in lines, that may still be a heading.
const MAX_HEADING_LINES: usize = 2;
/// Longest line, in words, that may still be part of a heading.
const MAX_HEADING_WORDS: usize = 15;

/// A leading heading, bullet, quote or ordered-list marker. Group 2 holds
/// the digits of an ordered marker.
static RE_BLOCK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6}|[-*+>]|(\d{1,9})[.)])( |$)").unwrap());

/// A content element identified on the page.
#[derive(Debug, Clone, PartialEq)]
enum ContentElement {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { prefix: String, text: String },
}

/// Render the glyphs of one page as Markdown.
///
/// Returns an empty string for a page without text.
pub fn render_page(glyphs: &[Glyph], options: &MarkdownOptions) -> String {
    if glyphs.iter().all(|g| g.ch.is_whitespace()) {
        return String::new();
    }

    let median = median_font_size(glyphs);
    let lines = glyphs_to_lines(glyphs, options.y_tolerance);
    let lines = split_lines_at_columns(lines, options.x_density);
    let mut blocks = cluster_lines_into_blocks(lines, options.y_density);
    sort_blocks_reading_order(&mut blocks);

    let elements = classify_blocks(&blocks, median, options);
    render_elements(&elements)
}

/// Detect heading level from font size ratio.
///
/// H1 from 2.0× the median, H2 from 1.6×, H3 from 1.3×, H4 from `min_ratio`.
pub fn detect_heading_level(font_size: f32, median_size: f32, min_ratio: f32) -> Option<u8> {
    if median_size <= 0.0 || font_size <= 0.0 {
        return None;
    }

    let ratio = font_size / median_size;
    if ratio < min_ratio {
        return None;
    }

    if ratio >= 2.0 {
        Some(1)
    } else if ratio >= 1.6 {
        Some(2)
    } else if ratio >= 1.3 {
        Some(3)
    } else {
        Some(4)
    }
}

/// Detect if text is a list item. Returns `(prefix, rest)`.
pub fn detect_list_item(text: &str) -> Option<(String, String)> {
    let trimmed = text.trim_start();

    for prefix in &["- ", "* ", "• ", "– ", "— ", "◦ ", "▪ "] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return Some((prefix.to_string(), rest.to_string()));
        }
    }

    try_parse_numbered_list(trimmed)
}

/// Parse a numbered prefix like `1. ` or `2) `.
fn try_parse_numbered_list(text: &str) -> Option<(String, String)> {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || digits > 3 {
        return None;
    }
    let rest = &text[digits..];
    let sep = rest.as_bytes().first()?;
    if (*sep == b'.' || *sep == b')') && rest.as_bytes().get(1) == Some(&b' ') {
        let prefix = &text[..digits + 2];
        return Some((prefix.to_string(), text[digits + 2..].to_string()));
    }
    None
}

fn is_bold_font(font_name: &str) -> bool {
    let lower = font_name.to_ascii_lowercase();
    lower.contains("bold") || lower.contains("heavy") || lower.contains("black")
}

fn is_italic_font(font_name: &str) -> bool {
    let lower = font_name.to_ascii_lowercase();
    lower.contains("italic") || lower.contains("oblique")
}

fn classify_blocks(
    blocks: &[TextBlock],
    median: f32,
    options: &MarkdownOptions,
) -> Vec<ContentElement> {
    let mut elements = Vec::new();

    for block in blocks {
        let heading = detect_heading_level(block.dominant_size(), median, options.heading_min_ratio)
            .filter(|_| {
                block.lines.len() <= MAX_HEADING_LINES
                    && block.lines.iter().all(|l| l.words.len() <= MAX_HEADING_WORDS)
            });
        if let Some(level) = heading {
            elements.push(ContentElement::Heading {
                level,
                text: render_words(&join_lines(&block.lines), false),
            });
            continue;
        }

        let starts_list = options.detect_lists
            && block
                .lines
                .first()
                .is_some_and(|l| detect_list_item(&l.text()).is_some());
        if starts_list {
            elements.extend(list_items(&block.lines, options.detect_emphasis));
            continue;
        }

        let text = render_words(&join_lines(&block.lines), options.detect_emphasis);
        if !text.is_empty() {
            elements.push(ContentElement::Paragraph(text));
        }
    }

    elements
}

/// Split a block's lines into list items; unmarked lines continue the
/// previous item.
fn list_items(lines: &[TextLine], emphasis: bool) -> Vec<ContentElement> {
    let mut items: Vec<(String, Vec<TextLine>)> = Vec::new();

    for line in lines {
        match detect_list_item(&line.text()) {
            Some((prefix, _)) => {
                // The marker is always the line's first word.
                let body = TextLine {
                    words: line.words.iter().skip(1).cloned().collect(),
                    bbox: line.bbox,
                };
                items.push((prefix, vec![body]));
            }
            None => {
                if let Some((_, item_lines)) = items.last_mut() {
                    item_lines.push(line.clone());
                }
            }
        }
    }

    items
        .into_iter()
        .map(|(prefix, item_lines)| ContentElement::ListItem {
            prefix,
            text: render_words(&join_lines(&item_lines), emphasis),
        })
        .collect()
}

/// Flatten lines into one word sequence, rejoining words hyphenated across
/// a line break (`exam-` + `ple` → `example`).
fn join_lines(lines: &[TextLine]) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();

    for line in lines {
        let mut iter = line.words.iter();
        if let (Some(prev), Some(first)) = (words.last_mut(), line.words.first()) {
            if is_line_end_hyphenation(&prev.text, &first.text) {
                prev.text.pop();
                prev.text.push_str(&first.text);
                prev.bbox = prev.bbox.union(&first.bbox);
                iter.next();
            }
        }
        words.extend(iter.cloned());
    }

    words
}

fn is_line_end_hyphenation(prev: &str, next: &str) -> bool {
    let mut tail = prev.chars().rev();
    tail.next() == Some('-')
        && tail.next().is_some_and(char::is_alphabetic)
        && next.chars().next().is_some_and(char::is_lowercase)
}

/// Join words with single spaces, wrapping runs of bold/italic words in
/// emphasis markers when `emphasis` is set.
fn render_words(words: &[Word], emphasis: bool) -> String {
    let mut runs: Vec<(&'static str, Vec<&str>)> = Vec::new();

    for word in words {
        let marker = if emphasis {
            match (is_bold_font(&word.font_name), is_italic_font(&word.font_name)) {
                (true, true) => "***",
                (true, false) => "**",
                (false, true) => "*",
                (false, false) => "",
            }
        } else {
            ""
        };
        match runs.last_mut() {
            Some((m, texts)) if *m == marker => texts.push(&word.text),
            _ => runs.push((marker, vec![&word.text])),
        }
    }

    runs.iter()
        .map(|(marker, texts)| format!("{marker}{}{marker}", texts.join(" ")))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Backslash-escape a leading marker so paragraph text is not read back as
/// a heading, list item or quote.
fn escape_block_marker(text: &str) -> Cow<'_, str> {
    let Some(caps) = RE_BLOCK_MARKER.captures(text) else {
        return Cow::Borrowed(text);
    };
    match caps.get(2) {
        Some(digits) => {
            let (number, rest) = text.split_at(digits.end());
            Cow::Owned(format!("{number}\\{rest}"))
        }
        None => Cow::Owned(format!("\\{text}")),
    }
}

/// Render content elements into a Markdown string.
fn render_elements(elements: &[ContentElement]) -> String {
    let mut out = String::new();

    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            let tight = matches!(
                (&elements[i - 1], element),
                (ContentElement::ListItem { .. }, ContentElement::ListItem { .. })
            );
            out.push_str(if tight { "\n" } else { "\n\n" });
        }
        match element {
            ContentElement::Heading { level, text } => {
                out.push_str(&"#".repeat(*level as usize));
                out.push(' ');
                out.push_str(text);
            }
            ContentElement::Paragraph(text) => out.push_str(&escape_block_marker(text)),
            ContentElement::ListItem { prefix, text } => {
                // Normalise bullets to standard Markdown; keep numbering.
                if prefix.starts_with(|c: char| c.is_ascii_digit()) {
                    out.push_str(prefix);
                } else {
                    out.push_str("- ");
                }
                out.push_str(text);
            }
        }
    }

    out
}
