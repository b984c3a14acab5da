//! Font resources: byte codes to Unicode text and glyph advances.

mod cmap;
mod encoding;

use std::collections::HashMap;

use crate::document::Document;
use crate::types::{Dict, PdfObject};

pub use cmap::{ToUnicodeMap, parse_tounicode_cmap};
pub use encoding::{DifferenceEntry, FontEncoding, glyph_to_char};

/// Fallback advance when a font carries no metrics, in 1/1000 em
const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// One decoded character code
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    /// Horizontal advance in 1/1000 of the font size
    pub width: f64,
    /// Single-byte code 32, which also receives word spacing
    pub is_space: bool,
}

/// A font as seen by the content interpreter
#[derive(Debug, Clone)]
pub struct Font {
    encoding: FontEncoding,
    to_unicode: Option<ToUnicodeMap>,
    /// Type0 fonts use multi-byte codes
    code_bytes: usize,
    widths: HashMap<u32, f64>,
    default_width: f64,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            encoding: FontEncoding::default(),
            to_unicode: None,
            code_bytes: 1,
            widths: HashMap::new(),
            default_width: DEFAULT_GLYPH_WIDTH,
        }
    }
}

impl Font {
    /// Build a font from its dictionary, resolving indirect entries.
    ///
    /// Broken pieces (bad ToUnicode stream, odd width arrays) degrade to
    /// defaults rather than failing the page.
    pub fn load(doc: &mut Document<'_>, font: &Dict) -> Self {
        let subtype = font.get("Subtype").and_then(|s| s.as_name()).unwrap_or("");
        let base_font = font.get("BaseFont").and_then(|s| s.as_name()).unwrap_or("");

        let to_unicode = font
            .get("ToUnicode")
            .and_then(|obj| obj.as_ref())
            .and_then(|r| doc.get_stream_data(r).ok())
            .map(|data| parse_tounicode_cmap(&data))
            .filter(|map| !map.is_empty());

        let mut result = Font {
            encoding: load_encoding(doc, font),
            to_unicode,
            ..Font::default()
        };

        if base_font.contains("Courier") {
            result.default_width = 600.0;
        }

        if subtype == "Type0" {
            result.code_bytes = 2;
            let descendant = font
                .get("DescendantFonts")
                .and_then(|d| doc.get_object(d).ok())
                .and_then(|d| d.as_array().and_then(|a| a.first()).cloned())
                .and_then(|d| doc.get_object(&d).ok());
            if let Some(dict) = descendant.as_ref().and_then(|d| d.as_dict()) {
                if let Some(dw) = dict.get("DW").and_then(|w| w.as_number()) {
                    result.default_width = dw;
                }
                if let Some(w) = dict.get("W").and_then(|w| doc.get_object(w).ok()) {
                    result.widths = parse_cid_widths(doc, &w);
                }
            }
        } else {
            let first_char = font.get("FirstChar").and_then(|f| f.as_int()).unwrap_or(0);
            if let Some(widths) = font.get("Widths").and_then(|w| doc.get_object(w).ok()) {
                for (i, w) in widths.as_array().into_iter().flatten().enumerate() {
                    if let Some(w) = doc.get_object(w).ok().and_then(|w| w.as_number()) {
                        result.widths.insert((first_char + i as i64) as u32, w);
                    }
                }
            }

            // Type3 widths are in glyph space
            if subtype == "Type3" {
                let scale = font
                    .get("FontMatrix")
                    .and_then(|m| m.as_numbers::<6>())
                    .map(|m| m[0] * 1000.0)
                    .unwrap_or(1.0);
                for w in result.widths.values_mut() {
                    *w *= scale;
                }
            }
        }

        result
    }

    /// Split a shown string into glyphs
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        let step = match &self.to_unicode {
            Some(map) if self.code_bytes == 1 => map.code_bytes().min(2),
            _ => self.code_bytes,
        };

        bytes
            .chunks(step)
            .map(|chunk| {
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                let text = match self.to_unicode.as_ref().and_then(|m| m.get(code)) {
                    Some(t) => t.to_string(),
                    None if step == 1 => self.encoding.decode_byte(chunk[0]).to_string(),
                    None => char::from_u32(code)
                        .filter(|c| !c.is_control())
                        .map(String::from)
                        .unwrap_or_default(),
                };
                Glyph {
                    text,
                    width: self.widths.get(&code).copied().unwrap_or(self.default_width),
                    is_space: step == 1 && code == 32,
                }
            })
            .collect()
    }
}

fn load_encoding(doc: &mut Document<'_>, font: &Dict) -> FontEncoding {
    let Some(encoding) = font.get("Encoding").and_then(|e| doc.get_object(e).ok()) else {
        return FontEncoding::default();
    };

    match &encoding {
        PdfObject::Name(name) => FontEncoding::named(name),
        PdfObject::Dict(dict) => {
            let mut enc = dict
                .get("BaseEncoding")
                .and_then(|b| b.as_name())
                .map(FontEncoding::named)
                .unwrap_or_default();
            if let Some(diffs) = dict.get("Differences").and_then(|d| d.as_array()) {
                let entries: Vec<DifferenceEntry> = diffs
                    .iter()
                    .filter_map(|item| match item {
                        PdfObject::Int(n) => Some(DifferenceEntry::Code(*n as u32)),
                        PdfObject::Name(name) => Some(DifferenceEntry::Glyph(name.clone())),
                        _ => None,
                    })
                    .collect();
                enc.apply_differences(&entries);
            }
            enc
        }
        _ => FontEncoding::default(),
    }
}

/// Parse a CIDFont `/W` array: `c [w1 w2 ...]` or `c_first c_last w`
fn parse_cid_widths(doc: &mut Document<'_>, w: &PdfObject) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let Some(items) = w.as_array() else {
        return widths;
    };

    let mut i = 0;
    while i < items.len() {
        let Some(first) = items[i].as_int() else {
            i += 1;
            continue;
        };
        match items.get(i + 1).and_then(|n| doc.get_object(n).ok()) {
            Some(PdfObject::Array(list)) => {
                for (offset, width) in list.iter().enumerate() {
                    if let Some(width) = width.as_number() {
                        widths.insert((first + offset as i64) as u32, width);
                    }
                }
                i += 2;
            }
            Some(PdfObject::Int(last)) => {
                if let Some(width) = items.get(i + 2).and_then(|w| w.as_number()) {
                    for code in first..=last.min(first + 0xFFFF) {
                        widths.insert(code as u32, width);
                    }
                }
                i += 3;
            }
            _ => i += 1,
        }
    }

    widths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_font_decodes_ascii() {
        let font = Font::default();
        let glyphs = font.decode(b"A 1");
        let text: String = glyphs.iter().map(|g| g.text.as_str()).collect();

        assert_eq!(text, "A 1");
        assert!(glyphs[1].is_space);
        assert_eq!(glyphs[0].width, DEFAULT_GLYPH_WIDTH);
    }

    #[test]
    fn test_two_byte_codes_use_to_unicode() {
        let cmap = parse_tounicode_cmap(b"beginbfchar\n<0041> <0058>\nendbfchar");
        let font = Font {
            to_unicode: Some(cmap),
            code_bytes: 2,
            ..Font::default()
        };

        let glyphs = font.decode(&[0x00, 0x41]);
        assert_eq!(glyphs.len(), 1);
        assert_eq!(glyphs[0].text, "X");
        assert!(!glyphs[0].is_space);
    }

    #[test]
    fn test_widths_are_per_code() {
        let mut font = Font::default();
        font.widths.insert(b'W' as u32, 944.0);

        let glyphs = font.decode(b"Wi");
        assert_eq!(glyphs[0].width, 944.0);
        assert_eq!(glyphs[1].width, DEFAULT_GLYPH_WIDTH);
    }
}
