//! # pagina
//!
//! Parsing core for PDF-style documents: tokenizer, object parser,
//! cross-reference and trailer resolution across incremental updates, an
//! owned object model and a serializer that collapses revisions into one.
//!
//! ## Features
//!
//! - **Lexer**: typed tokens with mark/reset backtracking and peeking
//! - **Object Parser**: direct and indirect objects, stream payloads sized by `Length`
//! - **Xref Resolution**: backward trailer search, `Prev` chains with cycle detection,
//!   generation-aware merging of revisions
//! - **Object Model**: [`Object`] with an open-addressing [`Dictionary`]
//! - **Page Labels**: a compact text syntax for page-label number trees
//! - **Writer**: single-revision output with a fresh xref table
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagina::{Document, Object, Result};
//!
//! # fn main() -> Result<()> {
//! let mut doc = Document::open("input.pdf")?;
//! println!("Version: {}", doc.version());
//! println!("Objects: {}", doc.len());
//!
//! if let Some(root) = doc.root() {
//!     let catalog = doc.get_object(root).and_then(Object::as_dict);
//!     println!("Catalog: {:?}", catalog.map(|c| c.len()));
//! }
//!
//! doc.set_info_creator()?;
//! doc.set_page_labels(pagina::page_labels::parse_page_labels("r_4D")?)?;
//! doc.save("output.pdf")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`parser`] - Lexer, object parser, xref/trailer parsing and [`parser::ParseOptions`]
//! - [`objects`] - The object model
//! - [`document`] - The parsed document and its editing operations
//! - [`writer`] - Serialization
//! - [`object_stream`] - Object stream expansion with pluggable codecs
//! - [`page_labels`] - Page label trees and their text syntax

pub mod document;
pub mod error;
pub mod object_stream;
pub mod objects;
pub mod page_labels;
pub mod parser;
pub mod writer;

pub use document::Document;
pub use error::{PdfError, Result};
pub use object_stream::{IdentityCodec, StreamCodec};
#[cfg(feature = "compression")]
pub use object_stream::FlateCodec;
pub use objects::{Array, Dictionary, Object, ObjectId, Stream};
pub use page_labels::{PageLabelError, PageLabelTree};
pub use parser::{ParseError, ParseOptions, PdfVersion};

/// Current version of pagina
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
