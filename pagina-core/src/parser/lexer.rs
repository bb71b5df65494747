//! Lexer
//!
//! Tokenizes the byte source one token at a time. The cursor can be saved with
//! [`Lexer::mark`] and rewound with [`Lexer::reset`], which is how the parser
//! looks ahead without consuming input.

use super::header::PdfVersion;
use super::options::ParseOptions;
use super::{ParseError, ParseResult};
use std::io::{BufReader, Read, Seek, SeekFrom};

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Boolean: true or false
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Real number
    Real(f64),

    /// String (literal or hexadecimal, already decoded)
    String(Vec<u8>),

    /// Name object (e.g., /Type), `#XX` escapes decoded
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// Left brace {
    BraceOpen,

    /// Right brace }
    BraceClose,

    /// Null object
    Null,

    Obj,
    EndObj,
    Stream,
    EndStream,
    XRef,
    StartXRef,
    Trailer,

    /// The `R` of an indirect reference
    R,

    /// `%PDF-M.N` comment
    Version(PdfVersion),

    /// `%%EOF` comment
    EofMarker,

    /// End of input
    Eof,
}

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(u64);

impl Mark {
    pub fn offset(&self) -> u64 {
        self.0
    }
}

fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// True for bytes that may appear inside names, numbers and keywords.
pub(crate) fn is_regular(ch: u8) -> bool {
    !is_whitespace(ch) && !is_delimiter(ch)
}

/// Name bytes read as UTF-8 when they form it, otherwise one Latin-1
/// character per byte
fn decode_name(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| e.into_bytes().into_iter().map(char::from).collect())
}

fn hex_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        _ => None,
    }
}

/// Lexer over a seekable byte source.
///
/// Positions are absolute offsets in the source, so the reader must be at
/// offset 0 when the lexer is created.
pub struct Lexer<R> {
    reader: BufReader<R>,
    position: u64,
    peek_buffer: Option<u8>,
    max_string_length: usize,
    max_name_length: usize,
}

impl<R: Read> Lexer<R> {
    /// Create a new lexer with default limits
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, &ParseOptions::default())
    }

    pub fn with_options(reader: R, options: &ParseOptions) -> Self {
        Self {
            reader: BufReader::new(reader),
            position: 0,
            peek_buffer: None,
            max_string_length: options.max_string_length,
            max_name_length: options.max_name_length,
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> ParseResult<Token> {
        loop {
            self.skip_whitespace()?;

            let ch = match self.peek_char()? {
                Some(ch) => ch,
                None => return Ok(Token::Eof),
            };

            return match ch {
                b'%' => match self.read_comment()? {
                    Some(token) => Ok(token),
                    None => continue,
                },
                b'/' => self.read_name(),
                b'(' => self.read_literal_string(),
                b'<' => self.read_angle_bracket(),
                b'>' => {
                    self.consume_char()?;
                    if self.peek_char()? == Some(b'>') {
                        self.consume_char()?;
                        Ok(Token::DictEnd)
                    } else {
                        Err(self.lex_error("Unmatched '>'"))
                    }
                }
                b')' => {
                    self.consume_char()?;
                    Err(self.lex_error("Unmatched closing parenthesis"))
                }
                b'[' => {
                    self.consume_char()?;
                    Ok(Token::ArrayStart)
                }
                b']' => {
                    self.consume_char()?;
                    Ok(Token::ArrayEnd)
                }
                b'{' => {
                    self.consume_char()?;
                    Ok(Token::BraceOpen)
                }
                b'}' => {
                    self.consume_char()?;
                    Ok(Token::BraceClose)
                }
                b'+' | b'-' | b'.' | b'0'..=b'9' => self.read_number(),
                _ => self.read_keyword(),
            };
        }
    }

    /// Current offset in the source
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Save the current position for a later [`Lexer::reset`]
    pub fn mark(&self) -> Mark {
        Mark(self.position)
    }

    fn lex_error(&self, message: impl Into<String>) -> ParseError {
        ParseError::LexError {
            position: self.position,
            message: message.into(),
        }
    }

    fn eof_error(&self, context: &str) -> ParseError {
        ParseError::UnexpectedEof {
            position: self.position,
            context: context.to_string(),
        }
    }

    /// Peek at the next byte without consuming it
    fn peek_char(&mut self) -> ParseResult<Option<u8>> {
        if let Some(ch) = self.peek_buffer {
            return Ok(Some(ch));
        }

        let mut buf = [0u8; 1];
        match self.reader.read_exact(&mut buf) {
            Ok(_) => {
                self.peek_buffer = Some(buf[0]);
                Ok(Some(buf[0]))
            }
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Consume the next byte
    fn consume_char(&mut self) -> ParseResult<Option<u8>> {
        let ch = self.peek_char()?;
        if ch.is_some() {
            self.peek_buffer = None;
            self.position += 1;
        }
        Ok(ch)
    }

    /// Consume the next byte, treating end of input as an error
    pub(crate) fn next_byte(&mut self, context: &str) -> ParseResult<u8> {
        match self.consume_char()? {
            Some(ch) => Ok(ch),
            None => Err(self.eof_error(context)),
        }
    }

    /// Skip whitespace and return the number of bytes skipped
    pub(crate) fn skip_whitespace(&mut self) -> ParseResult<usize> {
        let mut count = 0;
        while let Some(ch) = self.peek_char()? {
            if !is_whitespace(ch) {
                break;
            }
            self.consume_char()?;
            count += 1;
        }
        Ok(count)
    }

    /// True when the next byte is whitespace, a delimiter or end of input.
    pub(crate) fn at_token_boundary(&mut self) -> ParseResult<bool> {
        Ok(self.peek_char()?.map_or(true, |ch| !is_regular(ch)))
    }

    /// Read a comment. The version marker and `%%EOF` are tokens; anything
    /// else is skipped and `None` is returned.
    fn read_comment(&mut self) -> ParseResult<Option<Token>> {
        self.consume_char()?; // consume '%'

        let mut head = [0u8; 8];
        let mut head_len = 0;
        let mut tail_blank = true;
        while let Some(ch) = self.peek_char()? {
            if ch == b'\n' || ch == b'\r' {
                break;
            }
            self.consume_char()?;
            if head_len < head.len() {
                head[head_len] = ch;
                head_len += 1;
            } else if !is_whitespace(ch) {
                tail_blank = false;
            }
        }

        let head = &head[..head_len];
        let content_end = head
            .iter()
            .rposition(|&ch| !is_whitespace(ch))
            .map_or(0, |i| i + 1);
        if !tail_blank {
            return Ok(None);
        }
        let content = &head[..content_end];

        if let Some(digits) = content.strip_prefix(b"PDF-") {
            return Ok(PdfVersion::from_marker(digits).map(Token::Version));
        }
        if content == b"%EOF" {
            return Ok(Some(Token::EofMarker));
        }
        Ok(None)
    }

    /// Read a name object (e.g., /Type)
    fn read_name(&mut self) -> ParseResult<Token> {
        self.consume_char()?; // consume '/'
        let mut name = Vec::new();

        while let Some(ch) = self.peek_char()? {
            if !is_regular(ch) {
                break;
            }
            self.consume_char()?;

            // Handle hex codes in names (e.g., /A#20B means /A B)
            if ch == b'#' {
                let high = self.next_byte("hex code in name")?;
                let low = self.next_byte("hex code in name")?;
                match (hex_value(high), hex_value(low)) {
                    (Some(high), Some(low)) => name.push(high << 4 | low),
                    _ => return Err(self.lex_error("Invalid hex code in name")),
                }
            } else {
                name.push(ch);
            }

            if name.len() > self.max_name_length {
                return Err(ParseError::LimitExceeded {
                    position: self.position,
                    what: "Name length",
                    value: name.len() as u64,
                    limit: self.max_name_length as u64,
                });
            }
        }

        Ok(Token::Name(decode_name(name)))
    }

    fn check_string_length(&self, len: usize) -> ParseResult<()> {
        if len > self.max_string_length {
            return Err(ParseError::LimitExceeded {
                position: self.position,
                what: "String length",
                value: len as u64,
                limit: self.max_string_length as u64,
            });
        }
        Ok(())
    }

    /// Read a literal string (parentheses)
    fn read_literal_string(&mut self) -> ParseResult<Token> {
        self.consume_char()?; // consume '('
        let mut string = Vec::new();
        let mut paren_depth = 1;

        loop {
            let ch = match self.consume_char()? {
                Some(ch) => ch,
                None => return Err(self.lex_error("Unterminated string")),
            };

            match ch {
                b'\\' => {
                    let escaped = match self.consume_char()? {
                        Some(ch) => ch,
                        None => return Err(self.lex_error("Unterminated string")),
                    };
                    let byte = match escaped {
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        b'b' => b'\x08',
                        b'f' => b'\x0C',
                        b'(' => b'(',
                        b')' => b')',
                        b'\\' => b'\\',
                        b'0'..=b'7' => {
                            // Up to three octal digits, high-order overflow ignored
                            let mut value = u16::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek_char()? {
                                    Some(next @ b'0'..=b'7') => {
                                        self.consume_char()?;
                                        value = value * 8 + u16::from(next - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            (value % 256) as u8
                        }
                        other => {
                            return Err(self.lex_error(format!(
                                "Invalid escape sequence '\\{}'",
                                char::from(other)
                            )))
                        }
                    };
                    string.push(byte);
                }
                b'(' => {
                    paren_depth += 1;
                    string.push(ch);
                }
                b')' => {
                    paren_depth -= 1;
                    if paren_depth == 0 {
                        break;
                    }
                    string.push(ch);
                }
                _ => string.push(ch),
            }

            self.check_string_length(string.len())?;
        }

        Ok(Token::String(string))
    }

    /// Read angle bracket tokens (hex strings or dict markers)
    fn read_angle_bracket(&mut self) -> ParseResult<Token> {
        self.consume_char()?; // consume '<'

        if self.peek_char()? == Some(b'<') {
            self.consume_char()?;
            return Ok(Token::DictStart);
        }

        let mut bytes = Vec::new();
        let mut pending: Option<u8> = None;
        loop {
            let ch = self.next_byte("hex string")?;
            if ch == b'>' {
                break;
            }
            if is_whitespace(ch) {
                continue;
            }
            let nibble = match hex_value(ch) {
                Some(nibble) => nibble,
                None => {
                    return Err(self.lex_error(format!(
                        "Invalid character '{}' in hex string",
                        char::from(ch)
                    )))
                }
            };
            match pending.take() {
                Some(high) => {
                    bytes.push(high << 4 | nibble);
                    self.check_string_length(bytes.len())?;
                }
                None => pending = Some(nibble),
            }
        }

        // Odd digit count: the last nibble is padded with zero
        if let Some(high) = pending {
            bytes.push(high << 4);
        }

        Ok(Token::String(bytes))
    }

    /// Read a number (integer or real)
    fn read_number(&mut self) -> ParseResult<Token> {
        let mut number_str = String::new();
        let mut has_dot = false;
        let mut digits = 0;

        if let Some(ch @ (b'+' | b'-')) = self.peek_char()? {
            self.consume_char()?;
            number_str.push(char::from(ch));
        }

        while let Some(ch) = self.peek_char()? {
            match ch {
                b'0'..=b'9' => {
                    digits += 1;
                }
                b'.' if has_dot => {
                    return Err(self.lex_error("Number has more than one decimal point"));
                }
                b'.' => has_dot = true,
                _ => break,
            }
            self.consume_char()?;
            number_str.push(char::from(ch));
        }

        if digits == 0 {
            return Err(self.lex_error(format!("Malformed number '{number_str}'")));
        }

        if has_dot {
            match number_str.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Token::Real(value)),
                Ok(_) => Err(self.lex_error(format!("Real out of range: '{number_str}'"))),
                Err(_) => Err(self.lex_error(format!("Invalid real number: '{number_str}'"))),
            }
        } else {
            number_str
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| self.lex_error(format!("Integer out of range: '{number_str}'")))
        }
    }

    /// Read a keyword
    fn read_keyword(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let mut word = Vec::new();

        while let Some(ch) = self.peek_char()? {
            if !is_regular(ch) {
                break;
            }
            self.consume_char()?;
            word.push(ch);
            if word.len() > self.max_name_length {
                break;
            }
        }

        match word.as_slice() {
            b"true" => Ok(Token::Boolean(true)),
            b"false" => Ok(Token::Boolean(false)),
            b"null" => Ok(Token::Null),
            b"obj" => Ok(Token::Obj),
            b"endobj" => Ok(Token::EndObj),
            b"stream" => Ok(Token::Stream),
            b"endstream" => Ok(Token::EndStream),
            b"xref" => Ok(Token::XRef),
            b"startxref" => Ok(Token::StartXRef),
            b"trailer" => Ok(Token::Trailer),
            b"R" => Ok(Token::R),
            _ => Err(ParseError::LexError {
                position: start,
                message: format!(
                    "Unrecognized keyword '{}'",
                    String::from_utf8_lossy(&word)
                ),
            }),
        }
    }

    /// Consume the end-of-line that must follow the `stream` keyword: LF or CRLF.
    pub fn read_stream_newline(&mut self) -> ParseResult<()> {
        match self.consume_char()? {
            Some(b'\n') => Ok(()),
            Some(b'\r') if self.peek_char()? == Some(b'\n') => {
                self.consume_char()?;
                Ok(())
            }
            _ => Err(ParseError::SyntaxError {
                position: self.position,
                message: "Expected newline after 'stream'".to_string(),
            }),
        }
    }

    /// Read exactly n bytes
    pub fn read_bytes(&mut self, n: usize) -> ParseResult<Vec<u8>> {
        let mut bytes = Vec::with_capacity(n.min(64 * 1024));
        if let Some(ch) = self.peek_buffer.take() {
            if n > 0 {
                bytes.push(ch);
                self.position += 1;
            } else {
                self.peek_buffer = Some(ch);
            }
        }

        let remaining = (n - bytes.len()) as u64;
        let read = (&mut self.reader).take(remaining).read_to_end(&mut bytes)?;
        self.position += read as u64;

        if bytes.len() < n {
            return Err(self.eof_error("byte run"));
        }
        Ok(bytes)
    }
}

impl<R: Read + Seek> Lexer<R> {
    /// Rewind (or advance) to a saved position
    pub fn reset(&mut self, mark: Mark) -> ParseResult<()> {
        // The underlying reader is one byte ahead while a byte is peeked
        let actual = self.position + u64::from(self.peek_buffer.is_some());
        let delta = mark.0 as i64 - actual as i64;
        self.reader.seek_relative(delta)?;
        self.peek_buffer = None;
        self.position = mark.0;
        Ok(())
    }

    /// Peek the next token without consuming it
    pub fn peek_token(&mut self) -> ParseResult<Token> {
        let mark = self.mark();
        let token = self.next_token();
        self.reset(mark)?;
        token
    }

    /// Move the cursor to an absolute offset
    pub fn seek(&mut self, offset: u64) -> ParseResult<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        self.peek_buffer = None;
        self.position = offset;
        Ok(())
    }

    /// Total length of the source; the cursor is left where it was
    pub fn source_len(&mut self) -> ParseResult<u64> {
        let position = self.position;
        let len = self.reader.seek(SeekFrom::End(0))?;
        self.seek(position)?;
        Ok(len)
    }

    /// Fill `buf` from an absolute offset; the cursor ends up after the range
    pub(crate) fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ParseResult<()> {
        self.seek(offset)?;
        self.reader.read_exact(buf)?;
        self.position = offset + buf.len() as u64;
        Ok(())
    }
}
