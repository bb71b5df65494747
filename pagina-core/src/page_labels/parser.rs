//! Page label specification parser
//!
//! A compact text form of a page-label number tree. Ranges are separated by
//! one or more underscores; each range is
//!
//! ```text
//! [index] /prefix/                      prefix only
//! [index] [style] [/prefix/] [start]
//! ```
//!
//! where `style` is one of `D r R A a` (default `D`). Only the first range
//! may leave out its page index, which is then 0. For example
//! `/C1/_2r8_4D_6D/A-/2` labels page 0 "C1", numbers pages 2-3 `viii ix`,
//! pages 4-5 `1 2` and pages from 6 on `A-2 A-3 ...`.

use super::{PageLabel, PageLabelStyle, PageLabelTree};
use thiserror::Error;

/// Longest accepted prefix, in characters
pub const MAX_PREFIX_LEN: usize = 30;

/// Error in a page label specification
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Page label error at position {position}: {message}")]
pub struct PageLabelError {
    /// Byte offset into the specification
    pub position: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Prefix(String),
    Number(u32),
    Style(PageLabelStyle),
    Underscore,
    End,
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, position: usize, message: impl Into<String>) -> PageLabelError {
        PageLabelError {
            position,
            message: message.into(),
        }
    }

    /// Next token with the offset it starts at
    fn next_token(&mut self) -> Result<(usize, Token), PageLabelError> {
        let start = self.pos;
        let Some(&ch) = self.input.get(self.pos) else {
            return Ok((start, Token::End));
        };

        let token = match ch {
            b'_' => {
                while self.input.get(self.pos) == Some(&b'_') {
                    self.pos += 1;
                }
                Token::Underscore
            }
            b'/' => {
                self.pos += 1;
                let text_start = self.pos;
                loop {
                    match self.input.get(self.pos) {
                        None => return Err(self.error(start, "Unterminated prefix")),
                        Some(b'/') => break,
                        Some(&c) if (0x21..=0x7e).contains(&c) => self.pos += 1,
                        Some(&c) => {
                            return Err(self.error(
                                self.pos,
                                format!("Invalid prefix character 0x{c:02X}"),
                            ))
                        }
                    }
                }
                if self.pos - text_start > MAX_PREFIX_LEN {
                    return Err(self.error(
                        start,
                        format!("Prefix longer than {MAX_PREFIX_LEN} characters"),
                    ));
                }
                // Only graphic ASCII was accepted
                let text = String::from_utf8_lossy(&self.input[text_start..self.pos]).into_owned();
                self.pos += 1;
                Token::Prefix(text)
            }
            b'0'..=b'9' => {
                let mut value: u32 = 0;
                while let Some(&d) = self.input.get(self.pos).filter(|c| c.is_ascii_digit()) {
                    value = value
                        .checked_mul(10)
                        .and_then(|v| v.checked_add(u32::from(d - b'0')))
                        .ok_or_else(|| self.error(start, "Number too large"))?;
                    self.pos += 1;
                }
                Token::Number(value)
            }
            b'D' | b'R' | b'r' | b'A' | b'a' => {
                self.pos += 1;
                let name = char::from(ch).to_string();
                match PageLabelStyle::from_pdf_name(&name) {
                    Some(style) => Token::Style(style),
                    None => return Err(self.error(start, "Unknown numbering style")),
                }
            }
            other => {
                return Err(self.error(
                    start,
                    format!("Unexpected character '{}'", char::from(other).escape_default()),
                ))
            }
        };

        Ok((start, token))
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: (usize, Token),
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self, PageLabelError> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<Token, PageLabelError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next).1)
    }

    fn at_separator(&self) -> bool {
        matches!(self.current.1, Token::Underscore | Token::End)
    }

    fn parse(mut self) -> Result<PageLabelTree, PageLabelError> {
        let mut tree = PageLabelTree::new();
        let mut last_index: Option<u32> = None;

        loop {
            let range_start = self.current.0;
            let index = match self.current.1 {
                Token::Number(n) => {
                    self.advance()?;
                    n
                }
                _ if last_index.is_none() => {
                    if self.at_separator() {
                        return Err(self.lexer.error(range_start, "Empty page label range"));
                    }
                    0
                }
                _ => {
                    return Err(self
                        .lexer
                        .error(range_start, "Page index expected at start of range"))
                }
            };

            if last_index.is_some_and(|last| index <= last) {
                return Err(self.lexer.error(
                    range_start,
                    format!("Page index {index} does not follow the previous range"),
                ));
            }
            last_index = Some(index);

            let label = self.parse_label()?;
            tree.add_range(index, label);

            match self.advance()? {
                Token::Underscore => {}
                Token::End => break,
                other => {
                    return Err(self
                        .lexer
                        .error(range_start, format!("Unexpected {other:?} after range")))
                }
            }
        }

        Ok(tree)
    }

    /// Everything after the page index, up to the separator
    fn parse_label(&mut self) -> Result<PageLabel, PageLabelError> {
        let mut style = PageLabelStyle::DecimalArabic;
        let mut prefix = None;

        match self.current.1.clone() {
            Token::Prefix(text) => {
                self.advance()?;
                if self.at_separator() {
                    return Ok(PageLabel::prefix_only(text));
                }
                prefix = Some(text);
            }
            Token::Style(s) => {
                self.advance()?;
                style = s;
                if let Token::Prefix(text) = self.current.1.clone() {
                    self.advance()?;
                    prefix = Some(text);
                }
            }
            _ => {}
        }

        let mut label = PageLabel::new(style);
        label.prefix = prefix;
        if let Token::Number(start) = self.current.1 {
            self.advance()?;
            if start > 0 {
                label.start = Some(start);
            }
        }

        if !self.at_separator() {
            let (position, token) = &self.current;
            return Err(self
                .lexer
                .error(*position, format!("Unexpected {token:?} in range")));
        }
        Ok(label)
    }
}

/// Parse a page label specification into a tree
pub fn parse_page_label_spec(spec: &str) -> Result<PageLabelTree, PageLabelError> {
    Parser::new(spec)?.parse()
}
