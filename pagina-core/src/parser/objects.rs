//! Object parser
//!
//! Recursive-descent parser over [`Lexer`] tokens. Builds direct objects and
//! `id gen obj ... endobj` indirect objects, including stream payloads.

use super::lexer::{Lexer, Token};
use super::options::ParseOptions;
use super::{ParseError, ParseResult};
use crate::objects::{Array, Dictionary, Object, ObjectId, Stream};
use std::io::{Read, Seek};

/// Parser context: lexer cursor, limits and current nesting depth.
pub struct ObjectParser<R> {
    lexer: Lexer<R>,
    options: ParseOptions,
    depth: usize,
}

impl<R: Read + Seek> ObjectParser<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ParseOptions::default())
    }

    pub fn with_options(reader: R, options: ParseOptions) -> Self {
        Self {
            lexer: Lexer::with_options(reader, &options),
            options,
            depth: 0,
        }
    }

    pub fn lexer(&mut self) -> &mut Lexer<R> {
        &mut self.lexer
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse one direct object at the cursor
    pub fn parse_object(&mut self) -> ParseResult<Object> {
        self.depth = 0;
        self.parse_value()
    }

    /// Parse `<id> <gen> obj <object> [stream ... endstream] endobj`
    pub fn parse_indirect_object(&mut self) -> ParseResult<(ObjectId, Object)> {
        self.depth = 0;

        let number = self.expect_integer("object number")?;
        let number = u32::try_from(number)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| self.syntax_error(format!("Invalid object number {number}")))?;
        let generation = self.expect_integer("generation number")?;
        let generation = u16::try_from(generation)
            .map_err(|_| self.syntax_error(format!("Invalid generation number {generation}")))?;
        self.expect_token(Token::Obj, "'obj'")?;

        let object = self.parse_value()?;

        let position = self.lexer.position();
        let object = match self.lexer.next_token()? {
            Token::EndObj => object,
            Token::Stream => {
                let dict = match object {
                    Object::Dictionary(dict) => dict,
                    other => {
                        return Err(ParseError::SyntaxError {
                            position,
                            message: format!(
                                "Stream must follow a dictionary, found {}",
                                other.type_name()
                            ),
                        })
                    }
                };
                let data = self.parse_stream_data(&dict)?;
                self.expect_token(Token::EndObj, "'endobj'")?;
                Object::Stream(Stream::with_dictionary(dict, data))
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    position,
                    expected: "'endobj'".to_string(),
                    found: format!("{other:?}"),
                })
            }
        };

        tracing::trace!(
            "parsed object {} {} ({})",
            number,
            generation,
            object.type_name()
        );
        Ok((ObjectId::new(number, generation), object))
    }

    fn syntax_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::SyntaxError {
            position: self.lexer.position(),
            message: message.into(),
        }
    }

    /// Next token, skipping the version and end-of-file markers
    fn next_object_token(&mut self) -> ParseResult<Token> {
        loop {
            match self.lexer.next_token()? {
                Token::Version(_) | Token::EofMarker => continue,
                token => return Ok(token),
            }
        }
    }

    fn expect_integer(&mut self, what: &str) -> ParseResult<i64> {
        let position = self.lexer.position();
        match self.lexer.next_token()? {
            Token::Integer(value) => Ok(value),
            other => Err(ParseError::UnexpectedToken {
                position,
                expected: what.to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    fn expect_token(&mut self, expected: Token, description: &str) -> ParseResult<()> {
        let position = self.lexer.position();
        let token = self.lexer.next_token()?;
        if token == expected {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                position,
                expected: description.to_string(),
                found: format!("{token:?}"),
            })
        }
    }

    fn enter(&mut self) -> ParseResult<()> {
        if self.depth >= self.options.max_nesting_depth {
            return Err(ParseError::LimitExceeded {
                position: self.lexer.position(),
                what: "Nesting depth",
                value: self.depth as u64 + 1,
                limit: self.options.max_nesting_depth as u64,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_value(&mut self) -> ParseResult<Object> {
        let token = self.next_object_token()?;
        self.parse_from_token(token)
    }

    fn parse_from_token(&mut self, token: Token) -> ParseResult<Object> {
        match token {
            Token::Null => Ok(Object::Null),
            Token::Boolean(b) => Ok(Object::Boolean(b)),
            Token::Integer(i) => self.parse_integer_or_reference(i),
            Token::Real(r) => Ok(Object::Real(r)),
            Token::String(s) => Ok(Object::String(s)),
            Token::Name(n) => Ok(Object::Name(n)),
            Token::ArrayStart => self.parse_array(),
            Token::DictStart => self.parse_dictionary().map(Object::Dictionary),
            Token::BraceOpen | Token::BraceClose => Err(self.syntax_error(
                "PostScript calculator functions are not supported",
            )),
            Token::Eof => Err(ParseError::UnexpectedEof {
                position: self.lexer.position(),
                context: "object".to_string(),
            }),
            other => Err(ParseError::UnexpectedToken {
                position: self.lexer.position(),
                expected: "object".to_string(),
                found: format!("{other:?}"),
            }),
        }
    }

    /// `id gen R` is a reference; anything else leaves the integer alone and
    /// rewinds to just after it.
    fn parse_integer_or_reference(&mut self, value: i64) -> ParseResult<Object> {
        let number = match u32::try_from(value) {
            Ok(number) => number,
            Err(_) => return Ok(Object::Integer(value)),
        };

        let mark = self.lexer.mark();
        if let Ok(Token::Integer(generation)) = self.lexer.next_token() {
            if let Ok(generation) = u16::try_from(generation) {
                if let Ok(Token::R) = self.lexer.next_token() {
                    return Ok(Object::Reference(ObjectId::new(number, generation)));
                }
            }
        }
        self.lexer.reset(mark)?;
        Ok(Object::Integer(value))
    }

    fn parse_array(&mut self) -> ParseResult<Object> {
        self.enter()?;
        let mut elements = Array::new();

        loop {
            match self.next_object_token()? {
                Token::ArrayEnd => break,
                token => {
                    let obj = self.parse_from_token(token)?;
                    elements.push(obj);
                }
            }
        }

        self.depth -= 1;
        Ok(Object::Array(elements))
    }

    fn parse_dictionary(&mut self) -> ParseResult<Dictionary> {
        self.enter()?;
        let mut dict = Dictionary::new();

        loop {
            let position = self.lexer.position();
            let key = match self.next_object_token()? {
                Token::DictEnd => break,
                Token::Name(key) => key,
                Token::Eof => {
                    return Err(ParseError::UnexpectedEof {
                        position,
                        context: "dictionary".to_string(),
                    })
                }
                _ => {
                    return Err(ParseError::SyntaxError {
                        position,
                        message: "Dictionary key must be name".to_string(),
                    })
                }
            };

            let value = match self.next_object_token()? {
                Token::DictEnd => {
                    return Err(self.syntax_error(format!(
                        "Premature end of dictionary after key /{key}"
                    )))
                }
                token => self.parse_from_token(token)?,
            };
            dict.set(key, value);
        }

        self.depth -= 1;
        Ok(dict)
    }

    /// Read the payload after the `stream` keyword and the closing `endstream`
    fn parse_stream_data(&mut self, dict: &Dictionary) -> ParseResult<Vec<u8>> {
        let position = self.lexer.position();
        let length = match dict.get("Length") {
            None => {
                return Err(ParseError::MissingKey {
                    position,
                    key: "Length".to_string(),
                })
            }
            Some(Object::Integer(len)) if *len >= 0 => *len as u64,
            Some(Object::Integer(len)) => {
                return Err(self.syntax_error(format!("Negative stream length {len}")))
            }
            Some(Object::Reference(id)) => {
                return Err(self.syntax_error(format!(
                    "Stream length must be a direct integer, found reference {id}"
                )))
            }
            Some(other) => {
                return Err(self.syntax_error(format!(
                    "Stream length must be an integer, found {}",
                    other.type_name()
                )))
            }
        };

        if length > self.options.max_stream_length {
            return Err(ParseError::LimitExceeded {
                position,
                what: "Stream length",
                value: length,
                limit: self.options.max_stream_length,
            });
        }
        let length = usize::try_from(length).map_err(|_| ParseError::LimitExceeded {
            position,
            what: "Stream length",
            value: length,
            limit: usize::MAX as u64,
        })?;

        self.lexer.read_stream_newline()?;

        let data = match self.lexer.read_bytes(length) {
            Ok(data) => data,
            Err(ParseError::UnexpectedEof { position, .. }) => {
                return Err(ParseError::SyntaxError {
                    position,
                    message: format!("Got EOF inside stream of declared length {length}"),
                })
            }
            Err(e) => return Err(e),
        };

        // A wrong Length usually lands mid-keyword, so any failure here is structural
        let position = self.lexer.position();
        match self.lexer.next_token() {
            Ok(Token::EndStream) => Ok(data),
            Ok(token) => Err(ParseError::UnexpectedToken {
                position,
                expected: "'endstream'".to_string(),
                found: format!("{token:?}"),
            }),
            Err(ParseError::Io(e)) => Err(ParseError::Io(e)),
            Err(e) => Err(ParseError::SyntaxError {
                position,
                message: format!("Expected 'endstream' after {length} stream bytes: {e}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ErrorKind;
    use std::io::Cursor;

    fn parser(input: &[u8]) -> ObjectParser<Cursor<Vec<u8>>> {
        ObjectParser::new(Cursor::new(input.to_vec()))
    }

    fn parse(input: &[u8]) -> ParseResult<Object> {
        parser(input).parse_object()
    }

    fn name(s: &str) -> Object {
        Object::Name(s.to_string())
    }

    #[test]
    fn test_parse_simple_objects() {
        assert_eq!(parse(b"null").unwrap(), Object::Null);
        assert_eq!(parse(b"true").unwrap(), Object::Boolean(true));
        assert_eq!(parse(b"false").unwrap(), Object::Boolean(false));
        assert_eq!(parse(b"123").unwrap(), Object::Integer(123));
        assert_eq!(parse(b"-3.5").unwrap(), Object::Real(-3.5));
        assert_eq!(parse(b"(text)").unwrap(), Object::String(b"text".to_vec()));
        assert_eq!(parse(b"<7465>").unwrap(), Object::String(b"te".to_vec()));
        assert_eq!(parse(b"/Type").unwrap(), name("Type"));
    }

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            parse(b"12 0 R").unwrap(),
            Object::Reference(ObjectId::new(12, 0))
        );
        assert_eq!(
            parse(b"7 3 R").unwrap(),
            Object::Reference(ObjectId::new(7, 3))
        );
    }

    #[test]
    fn test_integer_lookahead_rewinds() {
        let mut parser = parser(b"12 0 /Next");
        assert_eq!(parser.parse_object().unwrap(), Object::Integer(12));
        assert_eq!(parser.lexer().position(), 2);
        assert_eq!(parser.parse_object().unwrap(), Object::Integer(0));
        assert_eq!(parser.parse_object().unwrap(), name("Next"));
    }

    #[test]
    fn test_negative_integer_is_never_a_reference() {
        let mut parser = parser(b"-1 0 R");
        assert_eq!(parser.parse_object().unwrap(), Object::Integer(-1));
        assert_eq!(parser.parse_object().unwrap(), Object::Integer(0));
        assert!(matches!(
            parser.parse_object(),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_negative_generation_is_not_a_reference() {
        let mut parser = parser(b"[4 -1 R]");
        assert!(parser.parse_object().is_err());
    }

    #[test]
    fn test_parse_array() {
        assert_eq!(
            parse(b"[1 2 0 R /N (s) [true]]").unwrap(),
            Object::Array(
                vec![
                    Object::Integer(1),
                    Object::Reference(ObjectId::new(2, 0)),
                    name("N"),
                    Object::String(b"s".to_vec()),
                    Object::Array(vec![Object::Boolean(true)].into()),
                ]
                .into()
            )
        );
        assert_eq!(parse(b"[]").unwrap(), Object::Array(Array::new()));
    }

    #[test]
    fn test_array_of_integers_keeps_every_element() {
        assert_eq!(
            parse(b"[0 0 612 792]").unwrap(),
            Object::Array(
                vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]
                .into()
            )
        );
    }

    #[test]
    fn test_parse_dictionary() {
        let obj = parse(b"<< /Type /Catalog /Pages 2 0 R /Count 3 /Nested << /A [1] >> >>").unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.len(), 4);
        assert_eq!(dict.get_name("Type"), Some("Catalog"));
        assert_eq!(
            dict.get("Pages"),
            Some(&Object::Reference(ObjectId::new(2, 0)))
        );
        assert_eq!(dict.get_integer("Count"), Some(3));
        assert!(dict.get_dict("Nested").is_some());
    }

    #[test]
    fn test_duplicate_dictionary_key_overwrites() {
        let obj = parse(b"<< /A 1 /A 2 >>").unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get_integer("A"), Some(2));
    }

    #[test]
    fn test_dictionary_key_must_be_name() {
        match parse(b"<< 1 2 >>") {
            Err(ParseError::SyntaxError { message, position }) => {
                assert_eq!(message, "Dictionary key must be name");
                assert_eq!(position, 2);
            }
            other => panic!("Expected SyntaxError, got {other:?}"),
        }
    }

    #[test]
    fn test_dictionary_premature_end() {
        match parse(b"<< /Key >>") {
            Err(ParseError::SyntaxError { message, .. }) => {
                assert!(message.starts_with("Premature end of dictionary"))
            }
            other => panic!("Expected SyntaxError, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_containers() {
        assert_eq!(parse(b"[1 2").unwrap_err().kind(), ErrorKind::Io);
        assert_eq!(parse(b"<< /A 1").unwrap_err().kind(), ErrorKind::Io);
    }

    #[test]
    fn test_braces_are_rejected() {
        assert!(matches!(
            parse(b"{ 1 add }"),
            Err(ParseError::SyntaxError { .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let options = ParseOptions::default().with_max_nesting_depth(3);
        let mut ok = ObjectParser::with_options(Cursor::new(b"[[[1]]]".to_vec()), options.clone());
        assert!(ok.parse_object().is_ok());

        let mut deep = ObjectParser::with_options(Cursor::new(b"[[[[1]]]]".to_vec()), options);
        assert!(matches!(
            deep.parse_object(),
            Err(ParseError::LimitExceeded { .. })
        ));
    }

    #[test]
    fn test_skips_markers_before_object() {
        assert_eq!(parse(b"%PDF-1.4\n%%EOF\n42").unwrap(), Object::Integer(42));
    }

    #[test]
    fn test_parse_indirect_object() {
        let mut parser = parser(b"3 0 obj\n<< /Type /Page >>\nendobj");
        let (id, obj) = parser.parse_indirect_object().unwrap();
        assert_eq!(id, ObjectId::new(3, 0));
        assert_eq!(obj.as_dict().unwrap().get_name("Type"), Some("Page"));
    }

    #[test]
    fn test_indirect_integer_is_not_mistaken_for_reference() {
        let mut parser = parser(b"5 0 obj 100 endobj");
        let (_, obj) = parser.parse_indirect_object().unwrap();
        assert_eq!(obj, Object::Integer(100));
    }

    #[test]
    fn test_indirect_object_missing_endobj() {
        let mut parser = parser(b"1 0 obj 5 6 0 obj");
        assert!(matches!(
            parser.parse_indirect_object(),
            Err(ParseError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_indirect_object_bad_numbers() {
        assert!(parser(b"0 0 obj null endobj").parse_indirect_object().is_err());
        assert!(parser(b"1 70000 obj null endobj").parse_indirect_object().is_err());
        assert!(parser(b"/A 0 obj null endobj").parse_indirect_object().is_err());
    }

    #[test]
    fn test_parse_stream() {
        let mut parser = parser(b"4 0 obj << /Length 5 >> stream\nABCDE\nendstream endobj");
        let (id, obj) = parser.parse_indirect_object().unwrap();
        assert_eq!(id, ObjectId::new(4, 0));
        let stream = obj.as_stream().unwrap();
        assert_eq!(stream.data(), b"ABCDE");
        assert_eq!(stream.dictionary().get_integer("Length"), Some(5));
    }

    #[test]
    fn test_stream_bytes_are_taken_verbatim() {
        let mut parser =
            parser(b"1 0 obj << /Length 12 >> stream\r\nendstream\n)(\nendstream\nendobj");
        let (_, obj) = parser.parse_indirect_object().unwrap();
        assert_eq!(obj.as_stream().unwrap().data(), b"endstream\n)(");
    }

    #[test]
    fn test_stream_length_exceeds_input() {
        let mut parser = parser(b"1 0 obj << /Length 50 >> stream\nABCDE\nendstream endobj");
        let err = parser.parse_indirect_object().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.to_string().contains("EOF inside stream"));
    }

    #[test]
    fn test_stream_length_too_long_but_input_continues() {
        let mut parser = parser(b"1 0 obj << /Length 7 >> stream\nABCDE\nendstream endobj");
        let err = parser.parse_indirect_object().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_stream_length_errors() {
        let missing = parser(b"1 0 obj << >> stream\nX\nendstream endobj").parse_indirect_object();
        assert!(matches!(missing, Err(ParseError::MissingKey { .. })));

        let negative =
            parser(b"1 0 obj << /Length -1 >> stream\nX\nendstream endobj").parse_indirect_object();
        assert!(matches!(negative, Err(ParseError::SyntaxError { .. })));

        let indirect =
            parser(b"1 0 obj << /Length 2 0 R >> stream\nX\nendstream endobj").parse_indirect_object();
        assert!(matches!(indirect, Err(ParseError::SyntaxError { .. })));

        let real =
            parser(b"1 0 obj << /Length 1.0 >> stream\nX\nendstream endobj").parse_indirect_object();
        assert!(matches!(real, Err(ParseError::SyntaxError { .. })));
    }

    #[test]
    fn test_stream_requires_dictionary() {
        let result = parser(b"1 0 obj [1] stream\nX\nendstream endobj").parse_indirect_object();
        assert!(matches!(result, Err(ParseError::SyntaxError { .. })));
    }

    #[test]
    fn test_stream_length_limit() {
        let options = ParseOptions::default().with_max_stream_length(4);
        let mut parser = ObjectParser::with_options(
            Cursor::new(b"1 0 obj << /Length 5 >> stream\nABCDE\nendstream endobj".to_vec()),
            options,
        );
        assert!(matches!(
            parser.parse_indirect_object(),
            Err(ParseError::LimitExceeded { .. })
        ));
    }
}
