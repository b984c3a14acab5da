use std::sync::LazyLock;

use log::debug;

use crate::content::path::{IDENTITY, Matrix, PathBuilder, multiply, transform};
use crate::content::{PageContent, Resources};
use crate::error::{PdfError, Result};
use crate::font::Font;
use crate::parser::MAX_NESTING;
use crate::parser::lexer::{hex_pairs_to_bytes, is_delimiter, is_whitespace};

/// Forms nested deeper than this are not painted
const MAX_FORM_DEPTH: usize = 8;

/// A `TJ` adjustment wider than this (in em) starts a new span
const TJ_SPLIT_EM: f64 = 1.0;

/// A `TJ` adjustment wider than this (in em) reads as a space
const TJ_SPACE_EM: f64 = 0.2;

static FALLBACK_FONT: LazyLock<Font> = LazyLock::new(Font::default);

/// Extracted text with position information
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    /// Baseline origin of the first visible glyph, user space
    pub x: f64,
    pub y: f64,
    /// Advance from the first to the end of the last visible glyph
    pub width: f64,
    pub font_size: f64,
    pub font_name: Option<String>,
}

impl TextSpan {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }

    /// Vertical middle of the glyph body, roughly a third of the size above
    /// the baseline
    pub fn center_y(&self) -> f64 {
        self.y + self.font_size / 3.0
    }
}

/// Graphics state for text positioning
#[derive(Debug, Clone)]
struct GraphicsState {
    // Current transformation matrix, user space to device space
    ctm: Matrix,
    // Text matrix, text space to user space
    text_matrix: Matrix,
    // Line matrix - reset at start of each line
    line_matrix: Matrix,
    font_size: f64,
    font_name: Option<String>,
    leading: f64,
    char_spacing: f64,
    word_spacing: f64,
    // Tz / 100
    horizontal_scale: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 12.0,
            font_name: None,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
        }
    }
}

impl GraphicsState {
    /// Text rendering matrix without the font size
    fn render_matrix(&self) -> Matrix {
        multiply(&self.text_matrix, &self.ctm)
    }

    fn translate_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn advance(&mut self, tx: f64) {
        self.text_matrix = multiply(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &self.text_matrix);
    }
}

/// Span being assembled from consecutive glyphs
#[derive(Debug, Default)]
struct PendingSpan {
    text: String,
    origin: Option<(f64, f64)>,
    end_x: f64,
    font_size: f64,
    /// Blank glyphs seen since the last visible one
    spaces: usize,
}

/// Content stream interpreter
pub struct ContentParser<'r> {
    resources: &'r Resources,
    state: GraphicsState,
    state_stack: Vec<GraphicsState>,
    path: PathBuilder,
    pending: PendingSpan,
    out: PageContent,
    depth: usize,
}

impl<'r> ContentParser<'r> {
    pub fn new(resources: &'r Resources) -> Self {
        Self {
            resources,
            state: GraphicsState::default(),
            state_stack: Vec::new(),
            path: PathBuilder::default(),
            pending: PendingSpan::default(),
            out: PageContent::default(),
            depth: 0,
        }
    }

    /// Interpret a content stream into text spans and ruling geometry
    pub fn parse(mut self, data: &[u8]) -> Result<PageContent> {
        self.run(data)?;
        Ok(self.out)
    }

    fn run(&mut self, data: &[u8]) -> Result<()> {
        let mut lexer = ContentLexer::new(data);
        let mut operands: Vec<Operand> = Vec::new();

        while let Some(item) = lexer.next_item()? {
            match item {
                Item::Operand(operand) => operands.push(operand),
                Item::Operator(op) => {
                    if op == "BI" {
                        lexer.skip_inline_image();
                    } else {
                        self.execute_operator(&op, &operands);
                    }
                    operands.clear();
                }
            }
        }

        Ok(())
    }

    fn execute_operator(&mut self, op: &str, operands: &[Operand]) {
        match op {
            // Graphics state
            "q" => self.state_stack.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.state_stack.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = last_numbers::<6>(operands) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }

            // Text objects
            "BT" => {
                self.state.text_matrix = IDENTITY;
                self.state.line_matrix = IDENTITY;
            }
            "ET" => {}

            // Text state
            "Tf" => {
                if let [.., Operand::Name(name), Operand::Number(size)] = operands {
                    self.state.font_name = Some(name.clone());
                    self.state.font_size = *size;
                }
            }
            "TL" => {
                if let Some([leading]) = last_numbers(operands) {
                    self.state.leading = leading;
                }
            }
            "Tc" => {
                if let Some([spacing]) = last_numbers(operands) {
                    self.state.char_spacing = spacing;
                }
            }
            "Tw" => {
                if let Some([spacing]) = last_numbers(operands) {
                    self.state.word_spacing = spacing;
                }
            }
            "Tz" => {
                if let Some([scale]) = last_numbers(operands) {
                    self.state.horizontal_scale = scale / 100.0;
                }
            }

            // Text positioning
            "Td" => {
                if let Some([tx, ty]) = last_numbers(operands) {
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = last_numbers(operands) {
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = last_numbers::<6>(operands) {
                    self.state.text_matrix = m;
                    self.state.line_matrix = m;
                }
            }
            "T*" => {
                let leading = self.state.leading;
                self.state.translate_line(0.0, -leading);
            }

            // Text showing
            "Tj" => {
                if let Some(Operand::String(bytes)) = operands.last() {
                    self.show_string(bytes);
                    self.finish_span();
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = operands.last() {
                    self.show_array(items);
                }
            }
            "'" => {
                let leading = self.state.leading;
                self.state.translate_line(0.0, -leading);
                if let Some(Operand::String(bytes)) = operands.last() {
                    self.show_string(bytes);
                    self.finish_span();
                }
            }
            "\"" => {
                if let [Operand::Number(aw), Operand::Number(ac), Operand::String(bytes)] = operands {
                    self.state.word_spacing = *aw;
                    self.state.char_spacing = *ac;
                    let leading = self.state.leading;
                    self.state.translate_line(0.0, -leading);
                    self.show_string(bytes);
                    self.finish_span();
                }
            }

            // Path construction
            "m" => {
                if let Some([x, y]) = last_numbers(operands) {
                    let p = transform(&self.state.ctm, x, y);
                    self.path.move_to(p);
                }
            }
            "l" => {
                if let Some([x, y]) = last_numbers(operands) {
                    let p = transform(&self.state.ctm, x, y);
                    self.path.line_to(p);
                }
            }
            "c" | "v" | "y" => {
                if let Some([x, y]) = last_numbers(operands) {
                    let p = transform(&self.state.ctm, x, y);
                    self.path.curve_to(p);
                }
            }
            "re" => {
                if let Some([x, y, w, h]) = last_numbers(operands) {
                    let ctm = self.state.ctm;
                    self.path.rect([
                        transform(&ctm, x, y),
                        transform(&ctm, x + w, y),
                        transform(&ctm, x + w, y + h),
                        transform(&ctm, x, y + h),
                    ]);
                }
            }
            "h" => self.path.close(),

            // Path painting
            "S" => self.path.paint(false, &mut self.out.segments, &mut self.out.bars),
            "s" | "b" | "b*" => {
                self.path.close();
                self.path.paint(false, &mut self.out.segments, &mut self.out.bars);
            }
            "B" | "B*" => self.path.paint(false, &mut self.out.segments, &mut self.out.bars),
            "f" | "F" | "f*" => self.path.paint(true, &mut self.out.segments, &mut self.out.bars),
            "n" => self.path.discard(),

            // External objects
            "Do" => {
                if let Some(Operand::Name(name)) = operands.last() {
                    self.paint_form(name);
                }
            }

            _ => {
                // Colour, clipping, marked content: no effect on layout
            }
        }
    }

    fn font(&self) -> &'r Font {
        let resources: &'r Resources = self.resources;
        self.state
            .font_name
            .as_ref()
            .and_then(|name| resources.fonts.get(name))
            .unwrap_or(&*FALLBACK_FONT)
    }

    /// Place the glyphs of one string, extending the pending span
    fn show_string(&mut self, bytes: &[u8]) {
        let font = self.font();
        let size = self.state.font_size;
        let scale = self.state.horizontal_scale;

        for glyph in font.decode(bytes) {
            let glyph_width = glyph.width / 1000.0 * size;
            let mut advance = glyph_width + self.state.char_spacing;
            if glyph.is_space {
                advance += self.state.word_spacing;
            }

            let trm = self.state.render_matrix();
            if glyph.text.trim().is_empty() {
                if self.pending.origin.is_some() {
                    self.pending.spaces += 1;
                }
            } else {
                // Space-aligned columns: two or more blanks end the span
                if self.pending.spaces >= 2 {
                    self.finish_span();
                }
                if self.pending.origin.is_none() {
                    self.pending.origin = Some(transform(&trm, 0.0, 0.0));
                    self.pending.font_size = size * trm[2].hypot(trm[3]);
                } else if self.pending.spaces == 1 {
                    self.pending.text.push(' ');
                }
                self.pending.spaces = 0;
                self.pending.text.push_str(&glyph.text);
                self.pending.end_x = transform(&trm, glyph_width * scale, 0.0).0;
            }

            self.state.advance(advance * scale);
        }
    }

    fn show_array(&mut self, items: &[Operand]) {
        for item in items {
            match item {
                Operand::String(bytes) => self.show_string(bytes),
                Operand::Number(n) => {
                    // Negative adjustments move right
                    let em = -n / 1000.0;
                    if em > TJ_SPLIT_EM {
                        self.finish_span();
                    } else if em > TJ_SPACE_EM && self.pending.origin.is_some() {
                        self.pending.spaces = self.pending.spaces.max(1);
                    }
                    let tx = em * self.state.font_size * self.state.horizontal_scale;
                    self.state.advance(tx);
                }
                _ => {}
            }
        }
        self.finish_span();
    }

    fn finish_span(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let Some((x, y)) = pending.origin else {
            return;
        };

        if pending.text.is_empty() {
            return;
        }

        self.out.spans.push(TextSpan {
            text: pending.text,
            x,
            y,
            width: (pending.end_x - x).max(0.0),
            font_size: pending.font_size,
            font_name: self.state.font_name.clone(),
        });
    }

    fn paint_form(&mut self, name: &str) {
        let resources: &'r Resources = self.resources;
        let Some(form) = resources.forms.get(name) else {
            return;
        };
        if self.depth >= MAX_FORM_DEPTH {
            debug!("Skipping form {} nested deeper than {}", name, MAX_FORM_DEPTH);
            return;
        }

        let mut nested = ContentParser::new(&form.resources);
        nested.depth = self.depth + 1;
        nested.state.ctm = multiply(&form.matrix, &self.state.ctm);

        if let Err(e) = nested.run(&form.content) {
            debug!("Form {} content stopped early: {}", name, e);
        }
        nested.finish_span();

        self.out.spans.append(&mut nested.out.spans);
        self.out.segments.append(&mut nested.out.segments);
        self.out.bars.append(&mut nested.out.bars);
    }
}

/// The last `N` operands as numbers
fn last_numbers<const N: usize>(operands: &[Operand]) -> Option<[f64; N]> {
    let tail = operands.get(operands.len().checked_sub(N)?..)?;
    let mut out = [0.0; N];
    for (slot, operand) in out.iter_mut().zip(tail) {
        let Operand::Number(n) = operand else {
            return None;
        };
        *slot = *n;
    }
    Some(out)
}

/// Operand types in content stream
#[derive(Debug, Clone)]
enum Operand {
    Number(f64),
    String(Vec<u8>),
    Name(String),
    Array(Vec<Operand>),
}

#[derive(Debug)]
enum Item {
    Operand(Operand),
    Operator(String),
}

/// Tokenizer for content streams, which mix operands and bare operators
struct ContentLexer<'a> {
    data: &'a [u8],
    pos: usize,
    /// Open operand arrays
    depth: usize,
}

impl<'a> ContentLexer<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, depth: 0 }
    }

    fn next_item(&mut self) -> Result<Option<Item>> {
        loop {
            self.skip_whitespace();
            let Some(&b) = self.data.get(self.pos) else {
                return Ok(None);
            };

            if b.is_ascii_alphabetic() || b == b'\'' || b == b'"' {
                return Ok(Some(Item::Operator(self.read_operator())));
            }

            if let Some(operand) = self.parse_operand()? {
                return Ok(Some(Item::Operand(operand)));
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.data.len() {
            match self.data[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' | 0x0C | 0x00 => self.pos += 1,
                b'%' => {
                    // Skip comment
                    while self.pos < self.data.len() && self.data[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn read_operator(&mut self) -> String {
        let start = self.pos;
        while self.pos < self.data.len() {
            let b = self.data[self.pos];
            if b.is_ascii_alphanumeric() || b == b'*' || b == b'\'' || b == b'"' {
                self.pos += 1;
            } else {
                break;
            }
        }
        String::from_utf8_lossy(&self.data[start..self.pos]).into_owned()
    }

    /// Parse one operand; `None` means something was skipped
    fn parse_operand(&mut self) -> Result<Option<Operand>> {
        let b = self.data[self.pos];

        match b {
            b'+' | b'-' | b'.' | b'0'..=b'9' => Ok(Some(Operand::Number(self.read_number()?))),
            b'(' => Ok(Some(Operand::String(self.read_string()))),
            b'<' => {
                self.pos += 1;
                if self.data.get(self.pos) == Some(&b'<') {
                    // Inline dictionary (marked content properties)
                    self.skip_dict();
                    Ok(None)
                } else {
                    Ok(Some(Operand::String(self.read_hex_string())))
                }
            }
            b'/' => Ok(Some(Operand::Name(self.read_name()))),
            b'[' => Ok(Some(Operand::Array(self.read_array()?))),
            _ => {
                self.pos += 1;
                Ok(None)
            }
        }
    }

    fn read_number(&mut self) -> Result<f64> {
        let start = self.pos;

        if matches!(self.data[self.pos], b'+' | b'-') {
            self.pos += 1;
        }
        while self.pos < self.data.len() && matches!(self.data[self.pos], b'0'..=b'9' | b'.') {
            self.pos += 1;
        }

        let num_str = std::str::from_utf8(&self.data[start..self.pos]).map_err(|_| PdfError::Parse {
            position: start,
            message: "Invalid number".into(),
        })?;

        // A bare sign or point reads as zero
        if num_str.bytes().all(|c| matches!(c, b'+' | b'-' | b'.')) {
            return Ok(0.0);
        }

        num_str.parse().map_err(|_| PdfError::Parse {
            position: start,
            message: format!("Invalid number: {}", num_str),
        })
    }

    fn read_string(&mut self) -> Vec<u8> {
        self.pos += 1; // Skip '('
        let mut result = Vec::new();
        let mut depth = 1;

        while self.pos < self.data.len() && depth > 0 {
            let b = self.data[self.pos];
            self.pos += 1;

            match b {
                b'(' => {
                    depth += 1;
                    result.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth > 0 {
                        result.push(b);
                    }
                }
                b'\\' if self.pos < self.data.len() => {
                    let escaped = self.data[self.pos];
                    self.pos += 1;
                    match escaped {
                        b'n' => result.push(b'\n'),
                        b'r' => result.push(b'\r'),
                        b't' => result.push(b'\t'),
                        b'b' => result.push(0x08),
                        b'f' => result.push(0x0C),
                        b'0'..=b'7' => {
                            let mut val = escaped - b'0';
                            for _ in 0..2 {
                                match self.data.get(self.pos) {
                                    Some(&d) if (b'0'..=b'7').contains(&d) => {
                                        self.pos += 1;
                                        val = val.wrapping_mul(8).wrapping_add(d - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            result.push(val);
                        }
                        b'\r' => {
                            // Line continuation
                            if self.data.get(self.pos) == Some(&b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        _ => result.push(escaped),
                    }
                }
                _ => result.push(b),
            }
        }

        result
    }

    fn read_hex_string(&mut self) -> Vec<u8> {
        let mut digits = Vec::new();

        while self.pos < self.data.len() {
            let b = self.data[self.pos];
            self.pos += 1;
            if b == b'>' {
                break;
            }
            if b.is_ascii_hexdigit() {
                digits.push(b);
            }
        }

        hex_pairs_to_bytes(&digits)
    }

    fn read_name(&mut self) -> String {
        self.pos += 1; // Skip '/'
        let start = self.pos;

        while self.pos < self.data.len() {
            let b = self.data[self.pos];
            if is_whitespace(b) || is_delimiter(b) {
                break;
            }
            self.pos += 1;
        }

        String::from_utf8_lossy(&self.data[start..self.pos]).into_owned()
    }

    fn read_array(&mut self) -> Result<Vec<Operand>> {
        if self.depth >= MAX_NESTING {
            return Err(PdfError::Parse {
                position: self.pos,
                message: "Nesting too deep".into(),
            });
        }
        self.depth += 1;
        let items = self.read_array_items();
        self.depth -= 1;
        items
    }

    fn read_array_items(&mut self) -> Result<Vec<Operand>> {
        self.pos += 1; // Skip '['
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            match self.data.get(self.pos) {
                None => break,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    if let Some(operand) = self.parse_operand()? {
                        items.push(operand);
                    }
                }
            }
        }

        Ok(items)
    }

    fn skip_dict(&mut self) {
        self.pos += 1; // Skip second '<'
        let mut depth = 1;

        while self.pos < self.data.len() && depth > 0 {
            match &self.data[self.pos..] {
                [b'<', b'<', ..] => {
                    depth += 1;
                    self.pos += 2;
                }
                [b'>', b'>', ..] => {
                    depth -= 1;
                    self.pos += 2;
                }
                _ => self.pos += 1,
            }
        }
    }

    /// Skip `... ID <binary> EI` after a `BI` operator
    fn skip_inline_image(&mut self) {
        let Some(id) = find_keyword(self.data, self.pos, b"ID") else {
            self.pos = self.data.len();
            return;
        };
        let data_start = id + 3;
        self.pos = find_keyword(self.data, data_start, b"EI")
            .map(|ei| ei + 2)
            .unwrap_or(self.data.len());
    }
}

/// Find `keyword` standing alone between whitespace (or the ends of data)
fn find_keyword(data: &[u8], from: usize, keyword: &[u8]) -> Option<usize> {
    let n = keyword.len();
    (from..data.len().saturating_sub(n - 1)).find(|&i| {
        &data[i..i + n] == keyword
            && (i == 0 || is_whitespace(data[i - 1]))
            && data.get(i + n).is_none_or(|&b| is_whitespace(b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &[u8]) -> PageContent {
        ContentParser::new(&Resources::default()).parse(content).unwrap()
    }

    #[test]
    fn test_deeply_nested_operands_are_rejected() {
        let content = format!("BT {} TJ ET", "[".repeat(100_000));
        let result = ContentParser::new(&Resources::default()).parse(content.as_bytes());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Nesting too deep"), "{}", err);

        let shallow = format!("BT /F1 10 Tf 5 5 Td {}(x){} TJ ET", "[".repeat(3), "]".repeat(3));
        assert_eq!(parse(shallow.as_bytes()).spans.len(), 0);
    }

    #[test]
    fn test_simple_text() {
        let page = parse(b"BT /F1 12 Tf 100 700 Td (Hello World) Tj ET");
        let spans = page.spans;

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Hello World");
        assert_eq!(spans[0].x, 100.0);
        assert_eq!(spans[0].y, 700.0);
        assert_eq!(spans[0].font_size, 12.0);
        // 11 glyphs at the 500/1000 fallback width, last one not advanced past
        assert_eq!(spans[0].width, 11.0 * 6.0);
    }

    #[test]
    fn test_multiple_spans() {
        let page = parse(b"BT /F1 10 Tf 50 500 Td (First) Tj 0 -20 Td (Second) Tj ET");
        let spans = page.spans;

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "First");
        assert_eq!(spans[1].text, "Second");
        assert_eq!(spans[1].y, 480.0); // 500 - 20
    }

    #[test]
    fn test_tj_array_kerning_and_gaps() {
        let page = parse(b"BT /F1 12 Tf 100 700 Td [(Hel) -50 (lo) -300 (big) -2000 (World)] TJ ET");
        let spans = page.spans;

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Hello big");
        assert_eq!(spans[1].text, "World");
        assert!(spans[1].x > spans[0].right() + 12.0);
    }

    #[test]
    fn test_leading_spaces_do_not_move_origin() {
        let page = parse(b"BT /F1 10 Tf 0 0 Td (  42) Tj ET");
        assert_eq!(page.spans[0].text, "42");
        assert_eq!(page.spans[0].x, 10.0);
    }

    #[test]
    fn test_space_aligned_columns_split() {
        let page = parse(b"BT /F1 10 Tf 0 0 Td (Name    Age) Tj ET");
        let texts: Vec<&str> = page.spans.iter().map(|s| s.text.as_str()).collect();

        assert_eq!(texts, vec!["Name", "Age"]);
        assert_eq!(page.spans[1].x, 40.0);
    }

    #[test]
    fn test_cm_scales_text() {
        let page = parse(b"q 2 0 0 2 10 10 cm BT /F1 6 Tf 5 5 Td (A) Tj ET Q");
        let span = &page.spans[0];

        assert_eq!((span.x, span.y), (20.0, 20.0));
        assert_eq!(span.font_size, 12.0);
    }

    #[test]
    fn test_tm_and_next_line() {
        let page = parse(b"BT /F1 10 Tf 14 TL 1 0 0 1 72 720 Tm (a) Tj T* (b) Tj (c) ' ET");
        let ys: Vec<f64> = page.spans.iter().map(|s| s.y).collect();
        assert_eq!(ys, vec![720.0, 706.0, 692.0]);
    }

    #[test]
    fn test_stroked_lines_and_rects() {
        let page = parse(b"0.5 w 10 10 m 110 10 l S 10 10 100 50 re S 0 0 5 5 re n");

        assert_eq!(page.segments.len(), 5);
        assert!(page.bars.is_empty());
    }

    #[test]
    fn test_filled_rect_is_a_bar() {
        let page = parse(b"q 1 0 0 1 0 100 cm 10 0 200 0.8 re f Q");
        assert_eq!(page.bars.len(), 1);
        assert_eq!(page.bars[0].y0, 100.0);
        assert_eq!(page.bars[0].width(), 200.0);
    }

    #[test]
    fn test_marked_content_dict_is_skipped() {
        let page = parse(b"/Span << /ActualText (x) >> BDC BT 5 5 Td (ok) Tj ET EMC");
        assert_eq!(page.spans.len(), 1);
        assert_eq!(page.spans[0].text, "ok");
    }

    #[test]
    fn test_inline_image_is_skipped() {
        let page = parse(b"BI /W 2 /H 1 /BPC 8 /CS /G ID \x00(Tj\xff EI BT 1 1 Td (after) Tj ET");
        assert_eq!(page.spans.len(), 1);
        assert_eq!(page.spans[0].text, "after");
    }

    #[test]
    fn test_form_xobject_is_painted_with_matrix() {
        let mut resources = Resources::default();
        resources.forms.insert(
            "Fm0".into(),
            crate::content::Form {
                content: b"BT 0 0 Td (inner) Tj ET 0 0 m 50 0 l S".to_vec(),
                matrix: [1.0, 0.0, 0.0, 1.0, 100.0, 200.0],
                resources: Resources::default(),
            },
        );

        let page = ContentParser::new(&resources).parse(b"/Fm0 Do").unwrap();
        assert_eq!(page.spans[0].text, "inner");
        assert_eq!((page.spans[0].x, page.spans[0].y), (100.0, 200.0));
        assert_eq!(page.segments[0].x1, 150.0);
    }
}
