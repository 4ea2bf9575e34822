//! Layout-mode plain text: rebuild a page as a character grid.
//!
//! Each row becomes one output line. Words are padded to the column their
//! x position maps to at the page's median character width, and vertical
//! gaps between rows turn into blank lines, so tables and indented blocks
//! keep their shape.

use crate::pipeline::layout::{glyphs_to_lines, median, Glyph, TextLine};

/// Upper bound on blank lines emitted for a single vertical gap.
const MAX_BLANK_LINES: usize = 2;

/// Leading assumed between single-spaced rows, as a multiple of row height.
const LINE_SPACING: f32 = 1.2;

/// Character width used when no glyph on the page has a usable width.
const FALLBACK_CHAR_WIDTH: f32 = 5.0;

/// Render one page in layout mode.
///
/// With `strip_rotated`, glyphs that are not upright are dropped before
/// layout. Returns an empty string for a page without text.
pub fn render_layout_text(glyphs: &[Glyph], strip_rotated: bool, y_tolerance: f32) -> String {
    let kept: Vec<Glyph> = if strip_rotated {
        glyphs.iter().filter(|g| g.is_upright()).cloned().collect()
    } else {
        glyphs.to_vec()
    };

    let lines = glyphs_to_lines(&kept, y_tolerance);
    if lines.is_empty() {
        return String::new();
    }

    let char_width = median_char_width(&kept);
    let line_height = median_line_height(&lines);
    let min_x = lines
        .iter()
        .map(|l| l.bbox.x0)
        .fold(f32::INFINITY, f32::min);

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            let delta = line.bbox.top - lines[i - 1].bbox.top;
            let blanks = ((delta / line_height).round() as usize)
                .saturating_sub(1)
                .min(MAX_BLANK_LINES);
            out.extend(std::iter::repeat_n(String::new(), blanks));
        }
        out.push(render_row(line, min_x, char_width));
    }

    out.join("\n")
}

fn render_row(line: &TextLine, min_x: f32, char_width: f32) -> String {
    let mut row = String::new();
    let mut col = 0usize;

    for word in &line.words {
        let target = ((word.bbox.x0 - min_x) / char_width).round().max(0.0) as usize;
        if target > col {
            row.extend(std::iter::repeat_n(' ', target - col));
            col = target;
        } else if col > 0 {
            row.push(' ');
            col += 1;
        }
        row.push_str(&word.text);
        col += word.text.chars().count();
    }

    row
}

fn median_char_width(glyphs: &[Glyph]) -> f32 {
    let mut widths: Vec<f32> = glyphs
        .iter()
        .filter(|g| !g.ch.is_whitespace() && g.bbox.width() > 0.0)
        .map(|g| g.bbox.width())
        .collect();
    median(&mut widths).unwrap_or(FALLBACK_CHAR_WIDTH)
}

/// Expected distance between consecutive row tops: the median row height
/// at single-spaced leading.
fn median_line_height(lines: &[TextLine]) -> f32 {
    let mut heights: Vec<f32> = lines
        .iter()
        .map(|l| l.bbox.height())
        .filter(|h| *h > 0.0)
        .collect();
    median(&mut heights).map_or(12.0, |h| h * LINE_SPACING)
}
