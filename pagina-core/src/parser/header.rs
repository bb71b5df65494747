//! Version marker
//!
//! A document opens with `%PDF-M.N`. The lexer reports the marker as a
//! [`Token::Version`]; every cross-reference offset in the file is relative to
//! the byte where it starts.

use super::lexer::{Lexer, Token};
use super::{ParseError, ParseResult};
use std::io::{Read, Seek};

/// Document format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Versions the lexer recognises: 1.0 through 2.7.
    pub fn is_supported(&self) -> bool {
        matches!(self.major, 1 | 2) && self.minor <= 7
    }

    /// Parse the `M.N` digits that follow `%PDF-`.
    pub(crate) fn from_marker(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [major @ b'0'..=b'9', b'.', minor @ b'0'..=b'9'] => {
                let version = Self::new(major - b'0', minor - b'0');
                version.is_supported().then_some(version)
            }
            _ => None,
        }
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        Self::new(1, 7)
    }
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Read the version marker at the start of the input.
///
/// Leading whitespace is skipped. Returns the version and the offset of the
/// marker, which is the base for every xref offset.
pub fn read_header<R: Read + Seek>(lexer: &mut Lexer<R>) -> ParseResult<(PdfVersion, u64)> {
    lexer.skip_whitespace()?;
    let offset = lexer.position();
    match lexer.next_token()? {
        Token::Version(version) => Ok((version, offset)),
        _ => Err(ParseError::InvalidHeader { position: offset }),
    }
}
