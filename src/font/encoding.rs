use std::collections::HashMap;

/// Single-byte encoding for simple fonts (Type1, TrueType, Type3)
#[derive(Debug, Clone)]
pub struct FontEncoding {
    /// Map from byte code to Unicode character
    map: HashMap<u8, char>,
}

impl Default for FontEncoding {
    fn default() -> Self {
        Self::standard()
    }
}

impl FontEncoding {
    /// Base encoding by `/Encoding` or `/BaseEncoding` name
    pub fn named(name: &str) -> Self {
        match name {
            "WinAnsiEncoding" => Self::win_ansi(),
            "MacRomanEncoding" => Self::mac_roman(),
            _ => Self::standard(),
        }
    }

    /// StandardEncoding, reduced to the printable ASCII range plus the
    /// curly quotes it places at 0x27 and 0x60
    pub fn standard() -> Self {
        let mut map = HashMap::new();
        for i in 0x20u8..=0x7E {
            map.insert(i, i as char);
        }
        map.insert(0x27, '\u{2019}');
        map.insert(0x60, '\u{2018}');
        FontEncoding { map }
    }

    /// WinAnsiEncoding - standard Windows encoding
    pub fn win_ansi() -> Self {
        let mut map = HashMap::new();

        for i in 0x20u8..=0x7E {
            map.insert(i, i as char);
        }

        // Windows-1252 specific mappings for 0x80-0x9F range
        let high_mappings: [(u8, char); 27] = [
            (0x80, '\u{20AC}'), // Euro sign
            (0x82, '\u{201A}'), // Single Low-9 Quotation Mark
            (0x83, '\u{0192}'), // Latin Small Letter F With Hook
            (0x84, '\u{201E}'), // Double Low-9 Quotation Mark
            (0x85, '\u{2026}'), // Horizontal Ellipsis
            (0x86, '\u{2020}'), // Dagger
            (0x87, '\u{2021}'), // Double Dagger
            (0x88, '\u{02C6}'), // Modifier Letter Circumflex Accent
            (0x89, '\u{2030}'), // Per Mille Sign
            (0x8A, '\u{0160}'), // Latin Capital Letter S With Caron
            (0x8B, '\u{2039}'), // Single Left-Pointing Angle Quotation Mark
            (0x8C, '\u{0152}'), // Latin Capital Ligature OE
            (0x8E, '\u{017D}'), // Latin Capital Letter Z With Caron
            (0x91, '\u{2018}'), // Left Single Quotation Mark
            (0x92, '\u{2019}'), // Right Single Quotation Mark
            (0x93, '\u{201C}'), // Left Double Quotation Mark
            (0x94, '\u{201D}'), // Right Double Quotation Mark
            (0x95, '\u{2022}'), // Bullet
            (0x96, '\u{2013}'), // En Dash
            (0x97, '\u{2014}'), // Em Dash
            (0x98, '\u{02DC}'), // Small Tilde
            (0x99, '\u{2122}'), // Trade Mark Sign
            (0x9A, '\u{0161}'), // Latin Small Letter S With Caron
            (0x9B, '\u{203A}'), // Single Right-Pointing Angle Quotation Mark
            (0x9C, '\u{0153}'), // Latin Small Ligature OE
            (0x9E, '\u{017E}'), // Latin Small Letter Z With Caron
            (0x9F, '\u{0178}'), // Latin Capital Letter Y With Diaeresis
        ];

        for (code, ch) in high_mappings {
            map.insert(code, ch);
        }

        // Latin-1 Supplement (0xA0-0xFF)
        for i in 0xA0u8..=0xFF {
            map.insert(i, i as char);
        }

        FontEncoding { map }
    }

    /// MacRomanEncoding
    pub fn mac_roman() -> Self {
        let mut map = HashMap::new();

        for i in 0x20u8..=0x7E {
            map.insert(i, i as char);
        }

        let mac_mappings: [(u8, char); 128] = [
            (0x80, 'Ä'), (0x81, 'Å'), (0x82, 'Ç'), (0x83, 'É'),
            (0x84, 'Ñ'), (0x85, 'Ö'), (0x86, 'Ü'), (0x87, 'á'),
            (0x88, 'à'), (0x89, 'â'), (0x8A, 'ä'), (0x8B, 'ã'),
            (0x8C, 'å'), (0x8D, 'ç'), (0x8E, 'é'), (0x8F, 'è'),
            (0x90, 'ê'), (0x91, 'ë'), (0x92, 'í'), (0x93, 'ì'),
            (0x94, 'î'), (0x95, 'ï'), (0x96, 'ñ'), (0x97, 'ó'),
            (0x98, 'ò'), (0x99, 'ô'), (0x9A, 'ö'), (0x9B, 'õ'),
            (0x9C, 'ú'), (0x9D, 'ù'), (0x9E, 'û'), (0x9F, 'ü'),
            (0xA0, '†'), (0xA1, '°'), (0xA2, '¢'), (0xA3, '£'),
            (0xA4, '§'), (0xA5, '•'), (0xA6, '¶'), (0xA7, 'ß'),
            (0xA8, '®'), (0xA9, '©'), (0xAA, '™'), (0xAB, '´'),
            (0xAC, '¨'), (0xAD, '≠'), (0xAE, 'Æ'), (0xAF, 'Ø'),
            (0xB0, '∞'), (0xB1, '±'), (0xB2, '≤'), (0xB3, '≥'),
            (0xB4, '¥'), (0xB5, 'µ'), (0xB6, '∂'), (0xB7, '∑'),
            (0xB8, '∏'), (0xB9, 'π'), (0xBA, '∫'), (0xBB, 'ª'),
            (0xBC, 'º'), (0xBD, 'Ω'), (0xBE, 'æ'), (0xBF, 'ø'),
            (0xC0, '¿'), (0xC1, '¡'), (0xC2, '¬'), (0xC3, '√'),
            (0xC4, 'ƒ'), (0xC5, '≈'), (0xC6, '∆'), (0xC7, '«'),
            (0xC8, '»'), (0xC9, '…'), (0xCA, ' '), (0xCB, 'À'),
            (0xCC, 'Ã'), (0xCD, 'Õ'), (0xCE, 'Œ'), (0xCF, 'œ'),
            (0xD0, '–'), (0xD1, '—'), (0xD2, '\u{201C}'), (0xD3, '\u{201D}'),
            (0xD4, '\u{2018}'), (0xD5, '\u{2019}'), (0xD6, '÷'), (0xD7, '◊'),
            (0xD8, 'ÿ'), (0xD9, 'Ÿ'), (0xDA, '⁄'), (0xDB, '€'),
            (0xDC, '‹'), (0xDD, '›'), (0xDE, 'ﬁ'), (0xDF, 'ﬂ'),
            (0xE0, '‡'), (0xE1, '·'), (0xE2, '‚'), (0xE3, '„'),
            (0xE4, '‰'), (0xE5, 'Â'), (0xE6, 'Ê'), (0xE7, 'Á'),
            (0xE8, 'Ë'), (0xE9, 'È'), (0xEA, 'Í'), (0xEB, 'Î'),
            (0xEC, 'Ï'), (0xED, 'Ì'), (0xEE, 'Ó'), (0xEF, 'Ô'),
            (0xF0, '\u{F8FF}'), (0xF1, 'Ò'), (0xF2, 'Ú'), (0xF3, 'Û'),
            (0xF4, 'Ù'), (0xF5, 'ı'), (0xF6, 'ˆ'), (0xF7, '˜'),
            (0xF8, '¯'), (0xF9, '˘'), (0xFA, '˙'), (0xFB, '˚'),
            (0xFC, '¸'), (0xFD, '˝'), (0xFE, '˛'), (0xFF, 'ˇ'),
        ];

        for (code, ch) in mac_mappings {
            map.insert(code, ch);
        }

        FontEncoding { map }
    }

    /// Apply a `/Differences` array: a code followed by the glyph names
    /// assigned to consecutive codes
    pub fn apply_differences(&mut self, differences: &[DifferenceEntry]) {
        let mut code: Option<u32> = None;
        for entry in differences {
            match entry {
                DifferenceEntry::Code(c) => code = Some(*c),
                DifferenceEntry::Glyph(name) => {
                    let Some(c) = code else { continue };
                    if let (Ok(byte), Some(ch)) = (u8::try_from(c), glyph_to_char(name)) {
                        self.map.insert(byte, ch);
                    }
                    code = Some(c + 1);
                }
            }
        }
    }

    /// Decode a single byte; unmapped control bytes become spaces
    pub fn decode_byte(&self, byte: u8) -> char {
        match self.map.get(&byte) {
            Some(ch) => *ch,
            None if byte < 0x20 => ' ',
            None => byte as char,
        }
    }
}

/// One item of a `/Differences` array
#[derive(Debug, Clone, PartialEq)]
pub enum DifferenceEntry {
    Code(u32),
    Glyph(String),
}

/// Map an Adobe glyph name to Unicode.
///
/// Covers the names that show up in table text: letters, digits,
/// punctuation, currency, and the `uniXXXX` / `uXXXX` forms.
pub fn glyph_to_char(name: &str) -> Option<char> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return c.is_ascii_alphabetic().then_some(c);
    }

    let hex = match name.strip_prefix("uni") {
        Some(rest) => rest.get(..4),
        None => name.strip_prefix('u').filter(|rest| (4..=6).contains(&rest.len())),
    };
    if let Some(ch) = hex
        .and_then(|h| u32::from_str_radix(h, 16).ok())
        .and_then(char::from_u32)
    {
        return Some(ch);
    }

    let ch = match name {
        "space" | "nbspace" => ' ',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "period" => '.',
        "comma" => ',',
        "colon" => ':',
        "semicolon" => ';',
        "hyphen" | "minus" => '-',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "slash" => '/',
        "backslash" => '\\',
        "parenleft" => '(',
        "parenright" => ')',
        "bracketleft" => '[',
        "bracketright" => ']',
        "braceleft" => '{',
        "braceright" => '}',
        "percent" => '%',
        "dollar" => '$',
        "euro" | "Euro" => '\u{20AC}',
        "sterling" => '\u{00A3}',
        "yen" => '\u{00A5}',
        "cent" => '\u{00A2}',
        "ampersand" => '&',
        "at" => '@',
        "numbersign" => '#',
        "asterisk" => '*',
        "plus" => '+',
        "equal" => '=',
        "less" => '<',
        "greater" => '>',
        "underscore" => '_',
        "bar" => '|',
        "exclam" => '!',
        "question" => '?',
        "quotesingle" => '\'',
        "quotedbl" => '"',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "bullet" => '\u{2022}',
        "ellipsis" => '\u{2026}',
        "degree" => '\u{00B0}',
        "plusminus" => '\u{00B1}',
        "multiply" => '\u{00D7}',
        "divide" => '\u{00F7}',
        "section" => '\u{00A7}',
        "copyright" => '\u{00A9}',
        "registered" => '\u{00AE}',
        "trademark" => '\u{2122}',
        _ => return None,
    };
    Some(ch)
}
