use crate::error::{PdfError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Null,
    True,
    False,
    Int(i64),
    Real(f64),
    String(Vec<u8>),
    HexString(Vec<u8>),
    Name(String),

    ArrayStart, // [
    ArrayEnd,   // ]
    DictStart,  // <<
    DictEnd,    // >>

    Obj,       // obj
    EndObj,    // endobj
    Stream,    // stream
    EndStream, // endstream
    Ref,       // R

    /// Any other bare word (xref, trailer, startxref, ...)
    Keyword(String),
}

/// PDF whitespace characters (ISO 32000-1, 7.2.2)
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0C | 0x00)
}

/// PDF delimiter characters
pub fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Byte-level tokenizer over a whole file or a decoded object stream
pub struct Lexer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos.min(self.data.len());
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Consume `b` if it is the next byte
    fn eat(&mut self, b: u8) -> bool {
        let hit = self.peek() == Some(b);
        if hit {
            self.pos += 1;
        }
        hit
    }

    fn read_byte(&mut self) -> Result<u8> {
        let b = self
            .peek()
            .ok_or_else(|| self.error(self.pos, "Unexpected end of file"))?;
        self.pos += 1;
        Ok(b)
    }

    /// Advance while `pred` holds, returning the consumed bytes
    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        &self.data[start..self.pos]
    }

    fn error(&self, position: usize, message: impl Into<String>) -> PdfError {
        PdfError::Parse {
            position,
            message: message.into(),
        }
    }

    /// Skip whitespace and comments
    pub fn skip_whitespace(&mut self) {
        loop {
            self.take_while(is_whitespace);
            if !self.eat(b'%') {
                return;
            }
            self.take_while(|b| b != b'\n' && b != b'\r');
        }
    }

    /// Consume the single end-of-line marker after the `stream` keyword.
    /// Stream data may itself begin with whitespace, so only CRLF or LF goes.
    pub fn skip_stream_eol(&mut self) {
        self.take_while(|b| b == b' ');
        self.eat(b'\r');
        self.eat(b'\n');
    }

    /// Next token, `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace();

        let Some(b) = self.peek() else {
            return Ok(None);
        };

        let token = match b {
            b'[' | b']' => {
                self.pos += 1;
                if b == b'[' { Token::ArrayStart } else { Token::ArrayEnd }
            }
            b'<' => {
                self.pos += 1;
                if self.eat(b'<') {
                    Token::DictStart
                } else {
                    Token::HexString(self.read_hex_string()?)
                }
            }
            b'>' => {
                self.pos += 1;
                if !self.eat(b'>') {
                    return Err(self.error(self.pos, "Unexpected '>'"));
                }
                Token::DictEnd
            }
            b'(' => Token::String(self.read_literal_string()?),
            b'/' => Token::Name(self.read_name()?),
            b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number()?,
            b'a'..=b'z' | b'A'..=b'Z' => self.read_keyword(),
            _ => {
                return Err(self.error(self.pos, format!("Unexpected byte: 0x{:02X}", b)));
            }
        };

        Ok(Some(token))
    }

    /// Integer or real; "4." and "-.5" are valid reals
    fn read_number(&mut self) -> Result<Token> {
        let start = self.pos;
        let sign = if self.eat(b'-') {
            -1.0
        } else {
            self.eat(b'+');
            1.0
        };

        let whole = self.take_while(|b| b.is_ascii_digit());
        if !self.eat(b'.') {
            let text = String::from_utf8_lossy(&self.data[start..self.pos]);
            return text
                .parse()
                .map(Token::Int)
                .map_err(|_| self.error(start, format!("Invalid integer: {}", text)));
        }
        let fraction = self.take_while(|b| b.is_ascii_digit());

        let digits_value = |digits: &[u8]| digits.iter().fold(0.0, |acc, d| acc * 10.0 + f64::from(d - b'0'));
        let value = digits_value(whole) + digits_value(fraction) / 10f64.powi(fraction.len() as i32);
        Ok(Token::Real(sign * value))
    }

    fn read_keyword(&mut self) -> Token {
        match self.take_while(|b| b.is_ascii_alphabetic()) {
            b"null" => Token::Null,
            b"true" => Token::True,
            b"false" => Token::False,
            b"obj" => Token::Obj,
            b"endobj" => Token::EndObj,
            b"stream" => Token::Stream,
            b"endstream" => Token::EndStream,
            b"R" => Token::Ref,
            word => Token::Keyword(String::from_utf8_lossy(word).into_owned()),
        }
    }

    /// Literal string (...) with balanced parentheses
    fn read_literal_string(&mut self) -> Result<Vec<u8>> {
        self.pos += 1;

        let mut out = Vec::new();
        let mut depth = 1usize;

        loop {
            match self.read_byte()? {
                b'(' => {
                    depth += 1;
                    out.push(b'(');
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b')');
                }
                b'\\' => {
                    if let Some(b) = self.read_escape()? {
                        out.push(b);
                    }
                }
                b => out.push(b),
            }
        }
    }

    /// The byte a backslash escape stands for; `None` for a line continuation
    fn read_escape(&mut self) -> Result<Option<u8>> {
        let b = self.read_byte()?;
        let byte = match b {
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'b' => 0x08,
            b'f' => 0x0C,
            b'0'..=b'7' => {
                let mut value = u32::from(b - b'0');
                for _ in 0..2 {
                    match self.peek() {
                        Some(d @ b'0'..=b'7') => {
                            self.pos += 1;
                            value = value * 8 + u32::from(d - b'0');
                        }
                        _ => break,
                    }
                }
                (value & 0xFF) as u8
            }
            b'\r' => {
                self.eat(b'\n');
                return Ok(None);
            }
            b'\n' => return Ok(None),
            // \( \) \\ and unknown escapes keep the byte itself
            other => other,
        };
        Ok(Some(byte))
    }

    /// Hex string <...>, opening '<' already consumed
    fn read_hex_string(&mut self) -> Result<Vec<u8>> {
        let mut digits = Vec::new();

        loop {
            match self.read_byte()? {
                b'>' => return Ok(hex_pairs_to_bytes(&digits)),
                b if b.is_ascii_hexdigit() => digits.push(b),
                b if is_whitespace(b) => {}
                b => {
                    return Err(self.error(self.pos - 1, format!("Invalid hex char: 0x{:02X}", b)));
                }
            }
        }
    }

    /// Name /..., with #xx escapes
    fn read_name(&mut self) -> Result<String> {
        self.pos += 1;

        let mut name = Vec::new();
        while let Some(b) = self.peek().filter(|&b| !is_whitespace(b) && !is_delimiter(b)) {
            self.pos += 1;
            if b == b'#' {
                let high = hex_value(self.read_byte()?);
                let low = hex_value(self.read_byte()?);
                name.push((high << 4) | low);
            } else {
                name.push(b);
            }
        }

        // Lossy so odd font names stay usable
        Ok(String::from_utf8_lossy(&name).into_owned())
    }
}

/// Collected hex digits as bytes; an odd trailing digit is padded with 0
pub fn hex_pairs_to_bytes(digits: &[u8]) -> Vec<u8> {
    digits
        .chunks(2)
        .map(|pair| {
            let high = hex_value(pair[0]);
            let low = pair.get(1).copied().map(hex_value).unwrap_or(0);
            (high << 4) | low
        })
        .collect()
}

pub fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        while let Some(token) = lexer.next_token().unwrap() {
            out.push(token);
        }
        out
    }

    #[test]
    fn numbers_and_literals() {
        assert_eq!(
            tokens(b"42 -7 3.5 true null"),
            vec![Token::Int(42), Token::Int(-7), Token::Real(3.5), Token::True, Token::Null]
        );
    }

    #[test]
    fn loose_reals() {
        assert_eq!(
            tokens(b"-.5 4. +1.25 ."),
            vec![Token::Real(-0.5), Token::Real(4.0), Token::Real(1.25), Token::Real(0.0)]
        );
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            tokens(b"(Hello\\nWorld \\(x\\) \\101)"),
            vec![Token::String(b"Hello\nWorld (x) A".to_vec())]
        );
        assert_eq!(tokens(b"(split\\\r\nline)"), vec![Token::String(b"splitline".to_vec())]);
    }

    #[test]
    fn nested_parens() {
        assert_eq!(tokens(b"(a(b)c)"), vec![Token::String(b"a(b)c".to_vec())]);
    }

    #[test]
    fn hex_string_with_odd_length() {
        assert_eq!(
            tokens(b"<48 65 6C 6C 6F 7>"),
            vec![Token::HexString(b"Hello\x70".to_vec())]
        );
    }

    #[test]
    fn dictionary_delimiters() {
        assert_eq!(
            tokens(b"<< /Type /Catalog /Kids [1 0 R] >>"),
            vec![
                Token::DictStart,
                Token::Name("Type".into()),
                Token::Name("Catalog".into()),
                Token::Name("Kids".into()),
                Token::ArrayStart,
                Token::Int(1),
                Token::Int(0),
                Token::Ref,
                Token::ArrayEnd,
                Token::DictEnd,
            ]
        );
    }

    #[test]
    fn name_hex_escape() {
        assert_eq!(
            tokens(b"/Font#20Name/Next"),
            vec![Token::Name("Font Name".into()), Token::Name("Next".into())]
        );
    }

    #[test]
    fn comments_skipped() {
        assert_eq!(tokens(b"% header comment\n7 % trailing\n"), vec![Token::Int(7)]);
    }

    #[test]
    fn structural_words_are_keywords() {
        assert_eq!(
            tokens(b"trailer startxref"),
            vec![Token::Keyword("trailer".into()), Token::Keyword("startxref".into())]
        );
    }

    #[test]
    fn stray_closing_bracket_is_an_error() {
        let mut lexer = Lexer::new(b"> 1");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn stream_eol_keeps_leading_data_whitespace() {
        let mut lexer = Lexer::new(b"\r\n  data");
        lexer.skip_stream_eol();
        assert_eq!(lexer.position(), 2);
    }
}
