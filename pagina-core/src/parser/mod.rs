//! Document parser
//!
//! Turns a seekable byte source into a [`Document`](crate::Document): the
//! lexer produces tokens, the object parser builds values and indirect
//! objects, and the reader locates the trailer, merges every cross-reference
//! table reachable through `Prev` and loads each live object at its offset.

pub mod header;
pub mod lexer;
pub mod objects;
pub mod options;
pub mod reader;
pub mod trailer;
pub mod xref;

pub use self::header::PdfVersion;
pub use self::lexer::{Lexer, Mark, Token};
pub use self::objects::ObjectParser;
pub use self::options::ParseOptions;
pub use self::reader::DocumentReader;
pub use self::trailer::{PdfTrailer, TrailerChain};
pub use self::xref::{XRefEntry, XRefTable};

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Broad classification of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed token.
    Lex,
    /// Well-formed token in the wrong place, or a structural violation.
    Parse,
    /// Byte source failure or input ending in the middle of a token.
    Io,
}

/// Parser errors. Every variant except [`ParseError::Io`] records the byte
/// offset where the problem was detected.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unexpected end of input at position {position}: {context}")]
    UnexpectedEof { position: u64, context: String },

    #[error("Lexical error at position {position}: {message}")]
    LexError { position: u64, message: String },

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: u64, message: String },

    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: u64,
        expected: String,
        found: String,
    },

    #[error("Missing required key /{key} at position {position}")]
    MissingKey { position: u64, key: String },

    #[error("Invalid xref table at position {position}: {message}")]
    InvalidXRef { position: u64, message: String },

    #[error("Invalid trailer at position {position}: {message}")]
    InvalidTrailer { position: u64, message: String },

    #[error("No trailer found in the last {scanned} bytes")]
    TrailerNotFound { scanned: u64 },

    #[error("Invalid header at position {position}: expected a version marker")]
    InvalidHeader { position: u64 },

    #[error("Cycle in trailer chain: /Prev {offset} was already visited")]
    CircularPrev { offset: u64 },

    #[error("{what} limit exceeded at position {position}: {value} > {limit}")]
    LimitExceeded {
        position: u64,
        what: &'static str,
        value: u64,
        limit: u64,
    },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Io(_) | ParseError::UnexpectedEof { .. } => ErrorKind::Io,
            ParseError::LexError { .. } => ErrorKind::Lex,
            _ => ErrorKind::Parse,
        }
    }

    /// Byte offset at which the error was detected, when known.
    pub fn position(&self) -> Option<u64> {
        match self {
            ParseError::Io(_) | ParseError::TrailerNotFound { .. } => None,
            ParseError::CircularPrev { offset } => Some(*offset),
            ParseError::UnexpectedEof { position, .. }
            | ParseError::LexError { position, .. }
            | ParseError::SyntaxError { position, .. }
            | ParseError::UnexpectedToken { position, .. }
            | ParseError::MissingKey { position, .. }
            | ParseError::InvalidXRef { position, .. }
            | ParseError::InvalidTrailer { position, .. }
            | ParseError::InvalidHeader { position }
            | ParseError::LimitExceeded { position, .. } => Some(*position),
        }
    }
}
