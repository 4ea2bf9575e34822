//! Page geometry: cluster glyphs into words, lines and blocks.
//!
//! All coordinates are in PDF points with a top-down y axis (`top < bottom`),
//! so sorting by `top` yields visual reading order. [`crate::pipeline::document`]
//! flips pdfium's bottom-up rectangles when it builds [`Glyph`]s.

use std::cmp::Ordering;

/// Fraction of the font size above which a horizontal gap separates words.
const WORD_GAP_RATIO: f32 = 0.1;

/// Font-size ratio beyond which two consecutive lines never share a block.
const BLOCK_SIZE_RATIO: f32 = 1.15;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x0: f32,
    pub top: f32,
    pub x1: f32,
    pub bottom: f32,
}

impl BBox {
    pub fn new(x0: f32, top: f32, x1: f32, bottom: f32) -> Self {
        Self {
            x0: x0.min(x1),
            top: top.min(bottom),
            x1: x0.max(x1),
            bottom: top.max(bottom),
        }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn mid_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            top: self.top.min(other.top),
            x1: self.x1.max(other.x1),
            bottom: self.bottom.max(other.bottom),
        }
    }

    fn overlaps_x(&self, other: &BBox) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1
    }
}

/// One character placed on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub bbox: BBox,
    pub font_size: f32,
    pub font_name: String,
    /// Text rotation in degrees, counter-clockwise.
    pub angle: f32,
}

impl Glyph {
    /// True when the glyph runs left-to-right on a horizontal baseline.
    pub fn is_upright(&self) -> bool {
        let a = self.angle.rem_euclid(360.0);
        a < 1.0 || a > 359.0
    }
}

/// A run of glyphs without an intervening gap or whitespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
    pub font_size: f32,
    pub font_name: String,
}

/// Words sharing a baseline, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub words: Vec<Word>,
    pub bbox: BBox,
}

impl TextLine {
    fn from_words(words: Vec<Word>) -> Option<Self> {
        let first = words.first()?.bbox;
        let bbox = words.iter().fold(first, |acc, w| acc.union(&w.bbox));
        Some(Self { words, bbox })
    }

    /// Words joined by single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Most common font size among the line's words.
    pub fn dominant_size(&self) -> f32 {
        dominant_size(self.words.iter().map(|w| w.font_size))
    }
}

/// Consecutive lines forming one paragraph-like region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
    pub bbox: BBox,
}

impl TextBlock {
    pub fn dominant_size(&self) -> f32 {
        dominant_size(
            self.lines
                .iter()
                .flat_map(|l| l.words.iter().map(|w| w.font_size)),
        )
    }
}

/// Group glyphs into rows, top to bottom, each sorted left to right.
///
/// A glyph joins the first row whose vertical midpoint lies within
/// `y_tolerance` of its own.
pub fn cluster_glyphs_into_rows(glyphs: &[Glyph], y_tolerance: f32) -> Vec<Vec<Glyph>> {
    let mut sorted: Vec<&Glyph> = glyphs.iter().collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut rows: Vec<(BBox, Vec<Glyph>)> = Vec::new();
    for glyph in sorted {
        let mid = glyph.bbox.mid_y();
        match rows
            .iter_mut()
            .find(|(bbox, _)| (bbox.mid_y() - mid).abs() <= y_tolerance)
        {
            Some((bbox, row)) => {
                *bbox = bbox.union(&glyph.bbox);
                row.push(glyph.clone());
            }
            None => rows.push((glyph.bbox, vec![glyph.clone()])),
        }
    }

    rows.sort_by(|a, b| a.0.top.total_cmp(&b.0.top));
    rows.into_iter()
        .map(|(_, mut row)| {
            row.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
            row
        })
        .collect()
}

/// Split a left-to-right row of glyphs into words.
///
/// Whitespace glyphs end the current word; so does a horizontal gap wider
/// than a tenth of the font size, which covers PDFs that position words
/// individually instead of emitting space characters.
pub fn row_to_words(row: &[Glyph]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current: Option<Word> = None;

    for glyph in row {
        if glyph.ch.is_whitespace() {
            words.extend(current.take());
            continue;
        }
        if let Some(word) = current.as_mut() {
            let gap = glyph.bbox.x0 - word.bbox.x1;
            let threshold = (glyph.font_size.max(word.font_size) * WORD_GAP_RATIO).max(0.5);
            if gap <= threshold {
                word.text.push(glyph.ch);
                word.bbox = word.bbox.union(&glyph.bbox);
                word.font_size = word.font_size.max(glyph.font_size);
                continue;
            }
            words.extend(current.take());
        }
        current = Some(Word {
            text: glyph.ch.to_string(),
            bbox: glyph.bbox,
            font_size: glyph.font_size,
            font_name: glyph.font_name.clone(),
        });
    }
    words.extend(current);
    words
}

/// Rows → words → lines, dropping rows that hold only whitespace.
pub fn glyphs_to_lines(glyphs: &[Glyph], y_tolerance: f32) -> Vec<TextLine> {
    cluster_glyphs_into_rows(glyphs, y_tolerance)
        .iter()
        .filter_map(|row| TextLine::from_words(row_to_words(row)))
        .collect()
}

/// Split lines at horizontal gaps wider than `x_density` (column gutters).
pub fn split_lines_at_columns(lines: Vec<TextLine>, x_density: f32) -> Vec<TextLine> {
    let mut result = Vec::new();
    for line in lines {
        let mut segment: Vec<Word> = Vec::new();
        for word in line.words {
            if let Some(prev) = segment.last() {
                if word.bbox.x0 - prev.bbox.x1 > x_density {
                    result.extend(TextLine::from_words(std::mem::take(&mut segment)));
                }
            }
            segment.push(word);
        }
        result.extend(TextLine::from_words(segment));
    }

    result.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    result
}

/// Group line segments into blocks.
///
/// A line joins the vertically closest block that ends at most `y_density`
/// above it, overlaps it horizontally, and whose last line has a similar
/// font size. The size check keeps a heading out of the paragraph it
/// introduces.
pub fn cluster_lines_into_blocks(lines: Vec<TextLine>, y_density: f32) -> Vec<TextBlock> {
    let mut blocks: Vec<TextBlock> = Vec::new();

    for line in lines {
        let line_size = line.dominant_size();
        let best = blocks
            .iter()
            .enumerate()
            .filter_map(|(i, block)| {
                let gap = line.bbox.top - block.bbox.bottom;
                let last_size = block.lines.last().map(TextLine::dominant_size)?;
                let similar = size_ratio(line_size, last_size) <= BLOCK_SIZE_RATIO;
                (gap > -y_density / 2.0
                    && gap <= y_density
                    && line.bbox.overlaps_x(&block.bbox)
                    && similar)
                    .then_some((i, gap))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        match best {
            Some(i) => {
                blocks[i].bbox = blocks[i].bbox.union(&line.bbox);
                blocks[i].lines.push(line);
            }
            None => blocks.push(TextBlock {
                bbox: line.bbox,
                lines: vec![line],
            }),
        }
    }

    for block in &mut blocks {
        block.lines.sort_by(|a, b| a.bbox.top.total_cmp(&b.bbox.top));
    }
    blocks
}

/// Sort blocks top to bottom, then left to right.
pub fn sort_blocks_reading_order(blocks: &mut [TextBlock]) {
    blocks.sort_by(|a, b| {
        a.bbox
            .top
            .total_cmp(&b.bbox.top)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
}

/// Median font size of the non-whitespace glyphs, or 12.0 when there are none.
pub fn median_font_size(glyphs: &[Glyph]) -> f32 {
    let mut sizes: Vec<f32> = glyphs
        .iter()
        .filter(|g| g.font_size > 0.0 && !g.ch.is_whitespace())
        .map(|g| g.font_size)
        .collect();
    median(&mut sizes).unwrap_or(12.0)
}

pub(crate) fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Mode of a set of font sizes, treating sizes within 0.1pt as equal.
fn dominant_size(sizes: impl Iterator<Item = f32>) -> f32 {
    let mut sizes: Vec<f32> = sizes.filter(|s| *s > 0.0).collect();
    if sizes.is_empty() {
        return 0.0;
    }
    sizes.sort_by(f32::total_cmp);

    let mut best = (sizes[0], 0usize);
    let mut run = (sizes[0], 0usize);
    for &s in &sizes {
        if (s - run.0).abs() < 0.1 {
            run.1 += 1;
        } else {
            run = (s, 1);
        }
        if run.1 > best.1 {
            best = run;
        }
    }
    best.0
}

fn size_ratio(a: f32, b: f32) -> f32 {
    if a <= 0.0 || b <= 0.0 {
        return 1.0;
    }
    match a.partial_cmp(&b) {
        Some(Ordering::Less) => b / a,
        _ => a / b,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Lay out `text` as glyphs starting at (`x`, `top`), each half an em wide.
    pub(crate) fn glyph_run(text: &str, x: f32, top: f32, size: f32, font: &str) -> Vec<Glyph> {
        let w = size * 0.5;
        text.chars()
            .enumerate()
            .map(|(i, ch)| Glyph {
                ch,
                bbox: BBox::new(x + i as f32 * w, top, x + (i + 1) as f32 * w, top + size),
                font_size: size,
                font_name: font.to_string(),
                angle: 0.0,
            })
            .collect()
    }

    #[test]
    fn bbox_new_normalises_corners() {
        let b = BBox::new(10.0, 20.0, 0.0, 5.0);
        assert_eq!(b, BBox { x0: 0.0, top: 5.0, x1: 10.0, bottom: 20.0 });
        assert_eq!(b.width(), 10.0);
        assert_eq!(b.height(), 15.0);
    }

    #[test]
    fn upright_detection_wraps_angles() {
        let mut g = glyph_run("a", 0.0, 0.0, 10.0, "F")[0].clone();
        assert!(g.is_upright());
        g.angle = 359.5;
        assert!(g.is_upright());
        g.angle = -0.5;
        assert!(g.is_upright());
        g.angle = 90.0;
        assert!(!g.is_upright());
    }

    #[test]
    fn spaces_split_words() {
        let row = glyph_run("hello world", 0.0, 0.0, 10.0, "F");
        let words = row_to_words(&row);
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn gaps_split_words_without_space_glyphs() {
        let mut row = glyph_run("ab", 0.0, 0.0, 10.0, "F");
        row.extend(glyph_run("cd", 20.0, 0.0, 10.0, "F"));
        let words = row_to_words(&row);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text, "cd");
    }

    #[test]
    fn rows_are_ordered_top_to_bottom_regardless_of_input_order() {
        let mut glyphs = glyph_run("second", 0.0, 40.0, 10.0, "F");
        glyphs.extend(glyph_run("first", 0.0, 10.0, 10.0, "F"));
        let lines = glyphs_to_lines(&glyphs, 3.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "first");
        assert_eq!(lines[1].text(), "second");
    }

    #[test]
    fn wide_gutter_splits_columns() {
        let mut glyphs = glyph_run("left", 0.0, 0.0, 10.0, "F");
        glyphs.extend(glyph_run("right", 200.0, 0.0, 10.0, "F"));
        let lines = split_lines_at_columns(glyphs_to_lines(&glyphs, 3.0), 10.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "left");
        assert_eq!(lines[1].text(), "right");
    }

    #[test]
    fn close_lines_form_one_block_and_far_lines_two() {
        let mut glyphs = glyph_run("line one", 0.0, 0.0, 10.0, "F");
        glyphs.extend(glyph_run("line two", 0.0, 12.0, 10.0, "F"));
        glyphs.extend(glyph_run("far away", 0.0, 80.0, 10.0, "F"));
        let blocks = cluster_lines_into_blocks(glyphs_to_lines(&glyphs, 3.0), 10.0);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].lines.len(), 2);
        assert_eq!(blocks[1].lines[0].text(), "far away");
    }

    #[test]
    fn font_size_change_starts_new_block() {
        let mut glyphs = glyph_run("Heading", 0.0, 0.0, 20.0, "F");
        glyphs.extend(glyph_run("body text", 0.0, 24.0, 10.0, "F"));
        let blocks = cluster_lines_into_blocks(glyphs_to_lines(&glyphs, 3.0), 10.0);
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn median_and_dominant_sizes() {
        let mut glyphs = glyph_run("aaa", 0.0, 0.0, 10.0, "F");
        glyphs.extend(glyph_run("b", 0.0, 20.0, 30.0, "F"));
        assert_eq!(median_font_size(&glyphs), 10.0);
        assert_eq!(median_font_size(&[]), 12.0);
        assert_eq!(dominant_size([10.0, 10.05, 14.0].into_iter()), 10.0);
    }
}
