use crate::error::{PdfError, Result};
use crate::parser::MAX_NESTING;
use crate::parser::lexer::{Lexer, Token};
use crate::types::{Dict, ObjRef, PdfObject};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Lookahead buffer for handling "42 0 R" vs "42"
    peeked: Vec<Token>,
    /// Open arrays and dictionaries around the current token
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
            peeked: Vec::new(),
            depth: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.lexer.position()
    }

    pub fn seek(&mut self, pos: usize) {
        self.lexer.seek(pos);
        self.peeked.clear();
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(tok) = self.peeked.pop() {
            Ok(Some(tok))
        } else {
            self.lexer.next_token()
        }
    }

    fn push_back(&mut self, tok: Token) {
        self.peeked.push(tok);
    }

    fn error(&self, message: impl Into<String>) -> PdfError {
        PdfError::Parse {
            position: self.position(),
            message: message.into(),
        }
    }

    /// Run `parse` one container level deeper, failing past `MAX_NESTING`
    fn nested(&mut self, parse: fn(&mut Self) -> Result<PdfObject>) -> Result<PdfObject> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("Nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Parse a single PDF object
    pub fn parse_object(&mut self) -> Result<Option<PdfObject>> {
        let Some(token) = self.next_token()? else {
            return Ok(None);
        };

        match token {
            Token::Null => Ok(Some(PdfObject::Null)),
            Token::True => Ok(Some(PdfObject::Bool(true))),
            Token::False => Ok(Some(PdfObject::Bool(false))),
            Token::Real(f) => Ok(Some(PdfObject::Real(f))),
            Token::String(s) | Token::HexString(s) => Ok(Some(PdfObject::String(s))),
            Token::Name(n) => Ok(Some(PdfObject::Name(n))),
            Token::ArrayStart => self.nested(Self::parse_array).map(Some),
            Token::DictStart => self.nested(Self::parse_dict_or_stream).map(Some),
            Token::Int(n) => self.parse_int_or_ref(n).map(Some),
            other => Err(self.error(format!("Unexpected token: {:?}", other))),
        }
    }

    /// Parse "N G obj <object> endobj" at the current position.
    ///
    /// The object number must match `expected`; the generation is not
    /// checked because damaged files often disagree with their xref.
    pub fn parse_indirect_object(&mut self, expected: ObjRef) -> Result<PdfObject> {
        let start = self.position();
        let (found, obj) = self.parse_indirect()?;
        if found.obj_num != expected.obj_num {
            return Err(PdfError::Parse {
                position: start,
                message: format!("Expected object {}, found {}", expected.obj_num, found.obj_num),
            });
        }
        Ok(obj)
    }

    /// Parse "N G obj <object> endobj" whatever its number
    pub fn parse_indirect(&mut self) -> Result<(ObjRef, PdfObject)> {
        let obj_num = match self.next_token()? {
            Some(Token::Int(n)) if n >= 0 => n as u32,
            _ => return Err(self.error("Expected object number")),
        };
        let gen_num = match self.next_token()? {
            Some(Token::Int(g)) if g >= 0 => g as u16,
            _ => return Err(self.error("Expected generation number")),
        };
        match self.next_token()? {
            Some(Token::Obj) => {}
            _ => return Err(self.error("Expected 'obj' keyword")),
        }
        let obj_ref = ObjRef::new(obj_num, gen_num);

        // An empty object body ("5 0 obj endobj") reads as null
        match self.next_token()? {
            Some(Token::EndObj) | None => Ok((obj_ref, PdfObject::Null)),
            Some(tok) => {
                self.push_back(tok);
                let obj = self
                    .parse_object()?
                    .ok_or_else(|| self.error("Expected object content"))?;
                Ok((obj_ref, obj))
            }
        }
    }

    /// Parse integer or reference (42 vs 42 0 R)
    fn parse_int_or_ref(&mut self, first: i64) -> Result<PdfObject> {
        let Some(tok2) = self.next_token()? else {
            return Ok(PdfObject::Int(first));
        };

        let Token::Int(second) = tok2 else {
            self.push_back(tok2);
            return Ok(PdfObject::Int(first));
        };

        let Some(tok3) = self.next_token()? else {
            self.push_back(Token::Int(second));
            return Ok(PdfObject::Int(first));
        };

        if tok3 == Token::Ref && first >= 0 && second >= 0 {
            Ok(PdfObject::Ref(ObjRef::new(first as u32, second as u16)))
        } else {
            // Stack order: last pushed is read first
            self.push_back(tok3);
            self.push_back(Token::Int(second));
            Ok(PdfObject::Int(first))
        }
    }

    fn parse_array(&mut self) -> Result<PdfObject> {
        let mut items = Vec::new();

        loop {
            let Some(token) = self.next_token()? else {
                return Err(self.error("Unterminated array"));
            };

            if token == Token::ArrayEnd {
                break;
            }

            self.push_back(token);
            if let Some(obj) = self.parse_object()? {
                items.push(obj);
            }
        }

        Ok(PdfObject::Array(items))
    }

    fn parse_dict_or_stream(&mut self) -> Result<PdfObject> {
        let mut dict = Dict::new();

        loop {
            let Some(token) = self.next_token()? else {
                return Err(self.error("Unterminated dictionary"));
            };

            if token == Token::DictEnd {
                break;
            }

            let Token::Name(key) = token else {
                return Err(self.error(format!("Dictionary key must be name, got {:?}", token)));
            };

            let value = self
                .parse_object()?
                .ok_or_else(|| self.error("Missing dictionary value"))?;

            dict.insert(key, value);
        }

        // Lookahead tokens would be lost if a stream follows; the dict body
        // never leaves any behind, so the lexer position is authoritative.
        let pos_after_dict = self.lexer.position();
        if self.peeked.is_empty() {
            if let Ok(Some(Token::Stream)) = self.lexer.next_token() {
                let data = self.read_stream_data(&dict)?;
                return Ok(PdfObject::Stream { dict, data });
            }
            self.lexer.seek(pos_after_dict);
        }
        Ok(PdfObject::Dict(dict))
    }

    /// Read stream data after "stream" keyword
    fn read_stream_data(&mut self, dict: &Dict) -> Result<Vec<u8>> {
        self.lexer.skip_stream_eol();
        let start = self.lexer.position();

        // Indirect /Length cannot be resolved from here; scan for the marker
        let Some(length) = dict.get("Length").and_then(|l| l.as_int()) else {
            return self.read_stream_until_endstream();
        };
        let end = start.saturating_add(length.max(0) as usize);

        if let Some(data) = self.lexer.data().get(start..end) {
            let data = data.to_vec();
            self.lexer.seek(end);
            if let Ok(Some(Token::EndStream)) = self.lexer.next_token() {
                return Ok(data);
            }
        }

        // Wrong /Length: fall back to the endstream marker
        self.lexer.seek(start);
        self.read_stream_until_endstream()
    }

    /// Fallback: search for "endstream" marker
    fn read_stream_until_endstream(&mut self) -> Result<Vec<u8>> {
        let start = self.lexer.position();
        let marker = b"endstream";
        let data = self.lexer.data();

        let found = data[start..]
            .windows(marker.len())
            .position(|w| w == marker)
            .map(|p| start + p);

        let Some(marker_pos) = found else {
            return Err(PdfError::Parse {
                position: start,
                message: "Could not find endstream".into(),
            });
        };

        // The EOL before "endstream" is not part of the data
        let mut end = marker_pos;
        if end > start && data[end - 1] == b'\n' {
            end -= 1;
        }
        if end > start && data[end - 1] == b'\r' {
            end -= 1;
        }

        self.lexer.seek(marker_pos + marker.len());
        Ok(data[start..end].to_vec())
    }
}
