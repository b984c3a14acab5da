mod parser;
mod path;

use std::collections::HashMap;

use crate::font::Font;

pub use parser::{ContentParser, TextSpan};
pub use path::{IDENTITY, Matrix, Rect, Segment, multiply, transform};

/// Everything the interpreter draws from one page (or form)
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub spans: Vec<TextSpan>,
    /// Stroked straight path pieces
    pub segments: Vec<Segment>,
    /// Filled axis-aligned rectangles; thin ones are drawn rulings
    pub bars: Vec<Rect>,
    /// `[x0 y0 x1 y1]`
    pub media_box: [f64; 4],
}

/// Named resources a content stream can refer to
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub fonts: HashMap<String, Font>,
    pub forms: HashMap<String, Form>,
}

/// A form XObject, painted by `Do`
#[derive(Debug, Clone)]
pub struct Form {
    pub content: Vec<u8>,
    pub matrix: Matrix,
    pub resources: Resources,
}
