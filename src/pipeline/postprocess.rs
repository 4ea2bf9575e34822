//! Post-processing: deterministic cleanup of extracted page text.
//!
//! pdfium hands back text with artefacts that are correct as far as the
//! content stream is concerned but noisy for a reader:
//!
//! - `\r\n` line endings from [`PdfPageText::all`](pdfium_render::prelude::PdfPageText::all)
//! - presentation-form ligatures (`ﬁ`, `ﬂ`) instead of their letters
//! - zero-width spaces, BOMs and soft hyphens copied from the font's ToUnicode map
//! - trailing spaces from right-padded layout lines
//!
//! Each rule is a pure `&str → String` pass. [`clean_markdown`] runs the full
//! set for the layout strategy; [`clean_text`] runs the subset that does not
//! change line structure, so the text strategy keeps its column layout.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so every later rule can split on `\n`.
//! Heading spacing runs after blank-line collapsing so it never produces
//! more than one blank line around a heading.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all Markdown rules to one page of rendered Markdown.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
/// 3. Expand presentation-form ligatures
/// 4. Trim trailing whitespace per line
/// 5. Collapse runs of blank lines to a single blank line
/// 6. Ensure headings are separated from their neighbours by a blank line
/// 7. Ensure the text ends with exactly one newline
pub fn clean_markdown(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = expand_ligatures(&s);
    let s = trim_trailing_whitespace(&s);
    let s = collapse_blank_lines(&s);
    let s = normalise_heading_spacing(&s);
    ensure_final_newline(&s)
}

/// Apply the layout-preserving rules to one page of plain text.
///
/// Leading indentation and interior blank lines are kept; trailing blank
/// lines are dropped. An all-whitespace page becomes the empty string.
pub fn clean_text(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = expand_ligatures(&s);
    let s = trim_trailing_whitespace(&s);
    s.trim_end_matches('\n').to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Expand ligatures ─────────────────────────────────────────────────

fn expand_ligatures(input: &str) -> String {
    if !input.chars().any(|c| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB05}' | '\u{FB06}' => out.push_str("st"),
            other => out.push(other),
        }
    }
    out
}

// ── Rule 4: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 5: Collapse excessive blank lines ───────────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}

// ── Rule 6: Normalise heading spacing ────────────────────────────────────────

static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6} \S").unwrap());

fn normalise_heading_spacing(input: &str) -> String {
    let lines: Vec<&str> = input.lines().collect();
    let mut result: Vec<&str> = Vec::with_capacity(lines.len() + 8);

    for (i, line) in lines.iter().enumerate() {
        let is_heading = RE_HEADING.is_match(line);
        if is_heading && result.last().is_some_and(|prev| !prev.is_empty()) {
            result.push("");
        }
        result.push(line);
        if is_heading && lines.get(i + 1).is_some_and(|next| !next.is_empty()) {
            result.push("");
        }
    }

    result.join("\n")
}

// ── Rule 7: Ensure file ends with single newline ─────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{}\n", trimmed)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
