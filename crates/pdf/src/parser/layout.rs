//! Layout-aware text extraction.
//!
//! Turns a page's content-stream operators into positioned spans, groups the
//! spans into lines by baseline, and groups lines into text blocks separated
//! by vertical whitespace. Blocks are the layout elements the title scanner
//! walks; each one carries its lines in reading order.
//!
//! Spans on one baseline that are further apart than a column gap start a new
//! line, and blocks only grow downwards within their own column, so the two
//! columns of a paper never share a line or a block.
//!
//! ```text
//! content ops  ->  TextSpan[]  ->  TextLine[]  ->  TextElement[]
//!   (per page)      extract         group_spans      group_lines
//! ```

use super::backend::{
    decode_text_simple, get_number_from_value, BackendFontInfo, PageId, PdfBackend, PdfValue,
    TextDecoder,
};
use super::normalize::normalize_text;
use crate::types::{Page, TextElement};
use crate::PdfError;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A run of text drawn at one position.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub font_size: f32,
    pub font_name: String,
}

/// Spans sharing (approximately) one baseline, merged left to right.
#[derive(Debug, Clone, Default)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
    pub y: f32,
    pub font_size: f32,
}

impl TextLine {
    /// Span texts joined by [`joint`], the same rule the flat pass uses.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut prev: Option<&TextSpan> = None;
        for span in &self.spans {
            let link = prev.map_or(Joint::Adjacent, |p| joint(p, span));
            push_joined(&mut out, link, &span.text);
            prev = Some(span);
        }
        out
    }

    fn left(&self) -> f32 {
        self.spans.first().map_or(0.0, |s| s.x)
    }

    fn right(&self) -> f32 {
        self.spans.last().map_or(0.0, |s| s.x + s.width)
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Baselines closer than this (points) belong to the same line.
const Y_TOLERANCE: f32 = 1.0;

/// Glyph width as a fraction of font size; we have no width tables.
const APPROX_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Horizontal gap (points) above which adjacent spans get a space.
const MIN_WORD_GAP: f32 = 1.5;

/// A horizontal gap of at least this multiple of the font size separates
/// columns rather than words.
const COLUMN_GAP_FACTOR: f32 = 2.0;

/// A vertical gap larger than this multiple of the font size ends a block.
const BLOCK_GAP_FACTOR: f32 = 1.4;

/// Fonts whose sizes differ by less than this are considered the same.
const FONT_SIZE_EPSILON: f32 = 0.5;

/// The identity 2x3 text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f32; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

// ---------------------------------------------------------------------------
// Internal: PDF text-state machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct TextState {
    font_key: Vec<u8>,
    font_name: String,
    font_size: f32,
    text_matrix: [f32; 6],
    line_matrix: [f32; 6],
    horiz_scale: f32,
    char_spacing: f32,
    word_spacing: f32,
    text_rise: f32,
    leading: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_name: String::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f32 {
        self.text_matrix[4]
    }

    fn y(&self) -> f32 {
        self.text_matrix[5]
    }

    /// Rendered size: `font_size * sqrt(b^2 + d^2)` of the text matrix.
    fn effective_font_size(&self) -> f32 {
        let scale = self.text_matrix[1].hypot(self.text_matrix[3]);
        (self.font_size * scale).abs()
    }

    fn glyph_width(&self) -> f32 {
        self.font_size * APPROX_CHAR_WIDTH_RATIO * self.horiz_scale
    }

    fn advance_x(&mut self, dx: f32) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// `Td`: translate the line matrix and restart the text matrix from it.
    fn translate_line(&mut self, tx: f32, ty: f32) {
        let m = self.line_matrix;
        self.line_matrix[4] = m[0] * tx + m[2] * ty + m[4];
        self.line_matrix[5] = m[1] * tx + m[3] * ty + m[5];
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.translate_line(0.0, -self.leading);
    }

    fn estimate_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.glyph_width()
    }

    /// Move past `text` as if it had been painted.
    fn advance_after_show(&mut self, text: &str) {
        let dx: f32 = text
            .chars()
            .map(|ch| {
                let spacing = if ch == ' ' { self.word_spacing } else { 0.0 };
                self.glyph_width() + self.char_spacing + spacing
            })
            .sum();
        self.advance_x(dx);
    }
}

fn first_number(operands: &[PdfValue]) -> Option<f32> {
    operands.first().and_then(get_number_from_value)
}

fn number_pair(operands: &[PdfValue]) -> Option<(f32, f32)> {
    match operands {
        [a, b, ..] => Some((
            get_number_from_value(a).unwrap_or(0.0),
            get_number_from_value(b).unwrap_or(0.0),
        )),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Span joining
// ---------------------------------------------------------------------------

/// How the text of one span follows the text of the span before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Joint {
    /// Same word.
    Adjacent,
    /// Same line, next word.
    Space,
    /// Different line or column.
    Break,
}

/// Decide how `next` continues `prev`.
///
/// A baseline change, a jump back to the left of `prev`, or a horizontal gap
/// of a column width is a [`Joint::Break`]; a gap of at least
/// [`MIN_WORD_GAP`] is a [`Joint::Space`].
pub fn joint(prev: &TextSpan, next: &TextSpan) -> Joint {
    let font_size = prev.font_size.max(next.font_size);
    let gap = next.x - (prev.x + prev.width);

    if (next.y - prev.y).abs() > Y_TOLERANCE
        || next.x + font_size < prev.x
        || gap >= font_size * COLUMN_GAP_FACTOR
    {
        Joint::Break
    } else if gap >= MIN_WORD_GAP {
        Joint::Space
    } else {
        Joint::Adjacent
    }
}

/// Append `text` to `out`, separated as `joint` says. Never doubles
/// whitespace already present on either side.
pub fn push_joined(out: &mut String, joint: Joint, text: &str) {
    let separator = match joint {
        Joint::Adjacent => None,
        Joint::Space => Some(' '),
        Joint::Break => Some('\n'),
    };
    if let Some(separator) = separator {
        let separated = out.is_empty()
            || out.ends_with(char::is_whitespace)
            || (separator == ' ' && text.starts_with(char::is_whitespace));
        if !separated {
            out.push(separator);
        }
    }
    out.push_str(text);
}

// ---------------------------------------------------------------------------
// Public API: span extraction
// ---------------------------------------------------------------------------

/// Walk one page's content stream and collect every painted text run.
///
/// Handles the text object, positioning, state and showing operators
/// (`BT ET Tf Tm Td TD T* TL Tc Tw Tz Ts Tj TJ ' "`); everything else is
/// ignored.
pub fn extract_page_spans(
    backend: &dyn PdfBackend,
    page_id: PageId,
) -> Result<Vec<TextSpan>, PdfError> {
    let raw_content = backend.page_content(page_id)?;
    let ops = backend.decode_content(&raw_content)?;
    let fonts = backend.page_fonts(page_id).unwrap_or_default();
    let decoder = backend.text_decoder(page_id);

    let mut state = TextState::default();
    let mut spans: Vec<TextSpan> = Vec::new();
    let mut painter = Painter {
        decoder: decoder.as_ref(),
        spans: &mut spans,
    };

    for op in &ops {
        let operands = op.operands.as_slice();
        match op.operator.as_str() {
            "BT" => {
                state.text_matrix = IDENTITY_MATRIX;
                state.line_matrix = IDENTITY_MATRIX;
            }
            // Font state survives ET.
            "ET" => {}
            "Tf" => set_font(operands, &fonts, &mut state),
            "Tm" => set_text_matrix(operands, &mut state),
            "Td" => {
                if let Some((tx, ty)) = number_pair(operands) {
                    state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let Some((tx, ty)) = number_pair(operands) {
                    state.leading = -ty;
                    state.translate_line(tx, ty);
                }
            }
            "T*" => state.next_line(),
            "TL" => {
                if let Some(v) = first_number(operands) {
                    state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = first_number(operands) {
                    state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = first_number(operands) {
                    state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = first_number(operands) {
                    state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = first_number(operands) {
                    state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(first) = operands.first() {
                    painter.show(first, &mut state);
                }
            }
            "TJ" => {
                if let Some(PdfValue::Array(arr)) = operands.first() {
                    painter.show_kerned(arr, &mut state);
                }
            }
            "'" => {
                state.next_line();
                if let Some(first) = operands.first() {
                    painter.show(first, &mut state);
                }
            }
            "\"" => {
                if let [aw, ac, text, ..] = operands {
                    if let Some(aw) = get_number_from_value(aw) {
                        state.word_spacing = aw;
                    }
                    if let Some(ac) = get_number_from_value(ac) {
                        state.char_spacing = ac;
                    }
                    state.next_line();
                    painter.show(text, &mut state);
                }
            }
            _ => {}
        }
    }

    Ok(spans)
}

fn set_font(operands: &[PdfValue], fonts: &[BackendFontInfo], state: &mut TextState) {
    let [key, size, ..] = operands else {
        return;
    };
    let key = match key {
        PdfValue::Name(n) | PdfValue::Str(n) => n.clone(),
        _ => return,
    };
    let name = fonts
        .iter()
        .find(|info| info.name == key)
        .map(|info| info.base_font.clone().unwrap_or_default())
        .unwrap_or_else(|| String::from_utf8_lossy(&key).into_owned());

    state.font_size = get_number_from_value(size).unwrap_or(0.0);
    state.font_key = key;
    state.font_name = name;
}

fn set_text_matrix(operands: &[PdfValue], state: &mut TextState) {
    let vals: Vec<f32> = operands
        .iter()
        .take(6)
        .filter_map(get_number_from_value)
        .collect();
    if let Ok(matrix) = <[f32; 6]>::try_from(vals) {
        state.text_matrix = matrix;
        state.line_matrix = matrix;
    }
}

/// Emits spans for text-showing operators.
struct Painter<'a> {
    decoder: &'a dyn TextDecoder,
    spans: &'a mut Vec<TextSpan>,
}

impl Painter<'_> {
    fn decode(&self, val: &PdfValue, state: &TextState) -> String {
        match val {
            PdfValue::Str(bytes) => {
                let decoded = self.decoder.decode(&state.font_key, bytes);
                if decoded.is_empty() {
                    decode_text_simple(bytes)
                } else {
                    decoded
                }
            }
            _ => String::new(),
        }
    }

    fn push(&mut self, text: String, x: f32, y: f32, state: &TextState) {
        self.spans.push(TextSpan {
            width: state.estimate_width(&text),
            text,
            x,
            y,
            font_size: state.effective_font_size(),
            font_name: state.font_name.clone(),
        });
    }

    /// `Tj`, `'` and `"`.
    fn show(&mut self, operand: &PdfValue, state: &mut TextState) {
        let text = self.decode(operand, state);
        if text.is_empty() {
            return;
        }
        let (x, y) = (state.x(), state.y() + state.text_rise);
        state.advance_after_show(&text);
        self.push(text, x, y, state);
    }

    /// `TJ`: strings interleaved with kerning in thousandths of text space.
    /// A large enough negative kern reads as a word gap.
    fn show_kerned(&mut self, arr: &[PdfValue], state: &mut TextState) {
        let mut buf = String::new();
        let mut span_x = state.x();
        let span_y = state.y() + state.text_rise;

        for elem in arr {
            if let PdfValue::Str(_) = elem {
                let fragment = self.decode(elem, state);
                if buf.is_empty() {
                    span_x = state.x();
                }
                buf.push_str(&fragment);
                state.advance_after_show(&fragment);
            } else if let Some(adj) = get_number_from_value(elem) {
                let dx = -adj / 1000.0 * state.font_size * state.horiz_scale;
                if dx > state.glyph_width() * 0.3 && !buf.is_empty() {
                    buf.push(' ');
                }
                state.advance_x(dx);
            }
        }

        let text = buf.trim_end();
        if !text.is_empty() {
            self.push(text.to_string(), span_x, span_y, state);
        }
    }
}

// ---------------------------------------------------------------------------
// Public API: span -> line grouping
// ---------------------------------------------------------------------------

/// Group spans into lines, top of page first.
///
/// Spans within [`Y_TOLERANCE`] of the current baseline share a row. Inside a
/// row, spans are ordered by X; a [`Joint::Break`] between neighbours starts
/// a new line, and neighbours in the same font are merged.
pub fn group_spans_into_lines(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<TextLine> = Vec::new();
    let mut row: Vec<TextSpan> = Vec::new();

    for span in spans {
        let same_row = row
            .first()
            .is_some_and(|first| (span.y - first.y).abs() <= Y_TOLERANCE);
        if !same_row && !row.is_empty() {
            lines.extend(split_row(std::mem::take(&mut row)));
        }
        row.push(span);
    }

    if !row.is_empty() {
        lines.extend(split_row(row));
    }

    lines
}

fn split_row(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| a.x.total_cmp(&b.x));
    // The row shares one baseline; compare positions only.
    let baseline = spans.first().map_or(0.0, |s| s.y);

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();

    for mut span in spans {
        span.y = baseline;
        let Some(link) = current.last().map(|prev| joint(prev, &span)) else {
            current.push(span);
            continue;
        };

        if link == Joint::Break {
            lines.push(assemble_line(std::mem::take(&mut current)));
            current.push(span);
            continue;
        }

        let merge = current.last().is_some_and(|prev| same_font(prev, &span));
        match current.last_mut() {
            Some(prev) if merge => {
                push_joined(&mut prev.text, link, &span.text);
                prev.width = prev.width.max((span.x + span.width) - prev.x);
            }
            _ => current.push(span),
        }
    }

    if !current.is_empty() {
        lines.push(assemble_line(current));
    }

    lines
}

fn same_font(a: &TextSpan, b: &TextSpan) -> bool {
    a.font_name == b.font_name && (a.font_size - b.font_size).abs() < FONT_SIZE_EPSILON
}

fn assemble_line(spans: Vec<TextSpan>) -> TextLine {
    let y = spans.first().map(|s| s.y).unwrap_or(0.0);
    let font_size = spans
        .iter()
        .max_by_key(|s| s.text.chars().count())
        .map(|s| s.font_size)
        .unwrap_or(0.0);

    TextLine { spans, y, font_size }
}

// ---------------------------------------------------------------------------
// Public API: line -> block grouping
// ---------------------------------------------------------------------------

/// Group lines (top of page first) into blocks.
///
/// A line continues the most recent block whose last line sits above it in
/// the same column, no further down than [`BLOCK_GAP_FACTOR`] times that
/// line's font size. Otherwise it opens a new block. Blocks are returned in
/// the order they were opened.
pub fn group_lines_into_blocks(lines: Vec<TextLine>) -> Vec<Vec<TextLine>> {
    let mut blocks: Vec<Vec<TextLine>> = Vec::new();

    for line in lines {
        let open = blocks
            .iter_mut()
            .rev()
            .find(|block| block.last().is_some_and(|prev| continues_block(prev, &line)));
        match open {
            Some(block) => block.push(line),
            None => blocks.push(vec![line]),
        }
    }

    blocks
}

fn continues_block(prev: &TextLine, line: &TextLine) -> bool {
    let descent = prev.y - line.y;
    let same_column = line.left() < prev.right() && prev.left() < line.right();
    descent > Y_TOLERANCE && descent <= prev.font_size * BLOCK_GAP_FACTOR && same_column
}

// ---------------------------------------------------------------------------
// Public API: full pass
// ---------------------------------------------------------------------------

/// Build the text elements of one page from its spans.
pub fn page_elements(spans: Vec<TextSpan>) -> Vec<TextElement> {
    group_lines_into_blocks(group_spans_into_lines(spans))
        .into_iter()
        .map(|block| TextElement {
            lines: block
                .iter()
                .map(|line| normalize_text(&line.text()))
                .filter(|text| !text.trim().is_empty())
                .collect(),
        })
        .filter(|element| !element.lines.is_empty())
        .collect()
}

/// Run the layout pass over every page, in page order.
pub fn extract_layout(backend: &dyn PdfBackend) -> Result<Vec<Page>, PdfError> {
    let page_map = backend.pages();
    let mut pages = Vec::with_capacity(page_map.len());

    for (&number, &page_id) in &page_map {
        let spans = extract_page_spans(backend, page_id)?;
        let elements = page_elements(spans);
        log::debug!("page {}: {} text elements", number, elements.len());
        pages.push(Page {
            number: number as usize,
            elements,
        });
    }

    Ok(pages)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
