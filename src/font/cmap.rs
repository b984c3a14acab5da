use std::collections::HashMap;

/// Parsed `/ToUnicode` CMap: source code → Unicode text
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeMap {
    map: HashMap<u32, String>,
    /// Byte width of source codes, from `begincodespacerange` or the
    /// width of the first mapping seen
    code_bytes: usize,
}

impl ToUnicodeMap {
    pub fn get(&self, code: u32) -> Option<&str> {
        self.map.get(&code).map(String::as_str)
    }

    pub fn code_bytes(&self) -> usize {
        self.code_bytes.max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Parse a ToUnicode CMap
pub fn parse_tounicode_cmap(data: &[u8]) -> ToUnicodeMap {
    let text = String::from_utf8_lossy(data);
    let mut cmap = ToUnicodeMap::default();

    for section in sections(&text, "begincodespacerange", "endcodespacerange") {
        if let Some(lo) = hex_strings(section).first() {
            cmap.code_bytes = lo.len().div_ceil(2);
        }
    }

    for section in sections(&text, "beginbfchar", "endbfchar") {
        for pair in hex_strings(section).chunks(2) {
            let [src, dst] = pair else { continue };
            cmap.note_width(src.len());
            if let Ok(code) = u32::from_str_radix(src, 16) {
                cmap.map.insert(code, utf16_hex_to_string(dst));
            }
        }
    }

    for section in sections(&text, "beginbfrange", "endbfrange") {
        parse_bfrange_entries(section, &mut cmap);
    }

    cmap
}

impl ToUnicodeMap {
    fn note_width(&mut self, digits: usize) {
        if self.code_bytes == 0 {
            self.code_bytes = digits.div_ceil(2);
        }
    }
}

/// Bodies between each `begin`...`end` keyword pair
fn sections<'t>(text: &'t str, begin: &str, end: &str) -> Vec<&'t str> {
    let mut out = Vec::new();
    let mut remaining = text;

    while let Some(start_idx) = remaining.find(begin) {
        remaining = &remaining[start_idx + begin.len()..];
        let Some(end_idx) = remaining.find(end) else {
            break;
        };
        out.push(&remaining[..end_idx]);
        remaining = &remaining[end_idx + end.len()..];
    }

    out
}

/// Raw hex digits of every `<...>` token in order
fn hex_strings(section: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = section;

    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else { break };
        tokens.push(after[..close].chars().filter(|c| c.is_ascii_hexdigit()).collect());
        rest = &after[close + 1..];
    }

    tokens
}

/// Parse bfrange entries: `<lo> <hi> <dst>` or `<lo> <hi> [<d1> <d2> ...]`
fn parse_bfrange_entries(section: &str, cmap: &mut ToUnicodeMap) {
    let mut rest = section;

    loop {
        let Some((lo_digits, lo, after_lo)) = next_hex(rest) else { break };
        let Some((_, hi, after_hi)) = next_hex(after_lo) else { break };
        cmap.note_width(lo_digits);

        let trimmed = after_hi.trim_start();
        if let Some(array_body) = trimmed.strip_prefix('[') {
            let Some(close) = array_body.find(']') else { break };
            for (i, hex) in hex_strings(&array_body[..close]).iter().enumerate() {
                let code = lo + i as u64;
                if code > hi {
                    break;
                }
                cmap.map.insert(code as u32, utf16_hex_to_string(hex));
            }
            rest = &array_body[close + 1..];
        } else {
            let Some(open) = trimmed.find('<') else { break };
            let after = &trimmed[open + 1..];
            let Some(close) = after.find('>') else { break };
            let dst_hex: String = after[..close].chars().filter(|c| c.is_ascii_hexdigit()).collect();
            let units = utf16_units(&dst_hex);

            // Incrementing the last UTF-16 unit walks the destination range
            for offset in 0..=hi.saturating_sub(lo).min(0xFFFF) {
                let mut dst = units.clone();
                if let Some(last) = dst.last_mut() {
                    *last = last.wrapping_add(offset as u16);
                }
                cmap.map
                    .insert((lo + offset) as u32, String::from_utf16_lossy(&dst));
            }
            rest = &after[close + 1..];
        }
    }
}

fn next_hex(text: &str) -> Option<(usize, u64, &str)> {
    let open = text.find('<')?;
    let after = &text[open + 1..];
    let close = after.find('>')?;
    let digits: String = after[..close].chars().filter(|c| c.is_ascii_hexdigit()).collect();
    let value = u64::from_str_radix(&digits[..digits.len().min(16)], 16).ok()?;
    Some((digits.len(), value, &after[close + 1..]))
}

fn utf16_units(hex: &str) -> Vec<u16> {
    hex.as_bytes()
        .chunks(4)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|s| u16::from_str_radix(s, 16).ok())
        .collect()
}

fn utf16_hex_to_string(hex: &str) -> String {
    String::from_utf16_lossy(&utf16_units(hex))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bfrange() {
        let cmap = r#"
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
beginbfrange
<0003><0003><0020>
<0024><0026><0041>
endbfrange
"#;
        let map = parse_tounicode_cmap(cmap.as_bytes());
        assert_eq!(map.code_bytes(), 2);
        assert_eq!(map.get(0x0003), Some(" "));
        assert_eq!(map.get(0x0024), Some("A"));
        assert_eq!(map.get(0x0026), Some("C"));
    }

    #[test]
    fn test_parse_bfrange_array() {
        let cmap = r#"
beginbfrange
<0010> <0011> [<0058> <0059>]
endbfrange
"#;
        let map = parse_tounicode_cmap(cmap.as_bytes());
        assert_eq!(map.get(0x10), Some("X"));
        assert_eq!(map.get(0x11), Some("Y"));
    }

    #[test]
    fn test_parse_bfchar_with_ligature() {
        let cmap = r#"
2 beginbfchar
<03> <0020>
<1F> <00660069>
endbfchar
"#;
        let map = parse_tounicode_cmap(cmap.as_bytes());
        assert_eq!(map.code_bytes(), 1);
        assert_eq!(map.get(0x03), Some(" "));
        assert_eq!(map.get(0x1F), Some("fi"));
    }
}
