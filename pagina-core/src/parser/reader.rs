//! Document reader
//!
//! Drives the lexer, object parser, xref and trailer parsers to assemble a
//! [`Document`]: header, newest trailer, every xref section on the `Prev`
//! chain, then one indirect object per live xref entry.

use super::header::read_header;
use super::objects::ObjectParser;
use super::options::ParseOptions;
use super::trailer::{find_trailer, PdfTrailer, TrailerChain};
use super::xref::XRefTable;
use super::{ParseError, ParseResult};
use crate::document::Document;
use crate::objects::Object;
use std::collections::HashSet;
use std::io::{Read, Seek};
use tracing::{debug, trace, warn};

/// Reads a complete document from a seekable source
pub struct DocumentReader<R> {
    parser: ObjectParser<R>,
}

impl<R: Read + Seek> DocumentReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ParseOptions::default())
    }

    pub fn with_options(reader: R, options: ParseOptions) -> Self {
        Self {
            parser: ObjectParser::with_options(reader, options),
        }
    }

    /// Parse the whole source into a [`Document`]
    pub fn read(mut self) -> ParseResult<Document> {
        let (version, base) = read_header(self.parser.lexer())?;
        debug!("header: version {} at offset {}", version, base);

        let (xref, trailers) = self.read_xref_chain(base)?;
        let objects = self.load_objects(&xref, base)?;

        Ok(Document::from_parts(version, base, objects, xref, trailers))
    }

    /// Locate the newest trailer, then merge every xref section reachable
    /// through `Prev`, newest first.
    fn read_xref_chain(&mut self, base: u64) -> ParseResult<(XRefTable, TrailerChain)> {
        let max_scan = self.parser.options().max_trailer_scan;
        let trailer_offset = find_trailer(self.parser.lexer(), max_scan)?;
        self.parser.lexer().seek(trailer_offset)?;
        let newest = PdfTrailer::parse(&mut self.parser)?;
        debug!(
            "trailer at offset {}: Size {}, startxref {}",
            trailer_offset,
            newest.size(),
            newest.xref_offset
        );

        let size = newest.size();
        let max_objects = self.parser.options().max_objects;
        if u64::from(size) > max_objects {
            return Err(ParseError::LimitExceeded {
                position: trailer_offset,
                what: "Object count",
                value: u64::from(size),
                limit: max_objects,
            });
        }
        let mut xref = XRefTable::with_size(size as usize);
        let mut visited = HashSet::new();

        visited.insert(newest.xref_offset);
        self.read_section(&mut xref, base + newest.xref_offset)?;

        let mut prev = newest.prev;
        let mut chain = TrailerChain::new(newest);

        while let Some(offset) = prev {
            if !visited.insert(offset) {
                return Err(ParseError::CircularPrev { offset });
            }
            self.read_section(&mut xref, base + offset)?;

            let trailer = PdfTrailer::parse(&mut self.parser)?;
            if trailer.size() != size {
                warn!(
                    "revision at xref offset {} declares Size {}, newest declares {}",
                    offset,
                    trailer.size(),
                    size
                );
            }
            // The section just read is where this trailer's Prev pointed
            let trailer = PdfTrailer {
                xref_offset: offset,
                ..trailer
            };
            prev = trailer.prev;
            chain.add_previous(trailer);
        }

        debug!("{} revision(s) merged", chain.len());
        Ok((xref, chain))
    }

    fn read_section(&mut self, xref: &mut XRefTable, offset: u64) -> ParseResult<()> {
        let lexer = self.parser.lexer();
        lexer.seek(offset)?;
        let count = xref.parse_section(lexer)?;
        debug!("xref section at offset {}: {} entries", offset, count);
        Ok(())
    }

    /// Parse one indirect object per live entry; slot `n - 1` holds object `n`.
    fn load_objects(&mut self, xref: &XRefTable, base: u64) -> ParseResult<Vec<Option<Object>>> {
        let mut objects = vec![None; xref.size().saturating_sub(1)];

        for (number, entry) in xref.live_entries() {
            let offset = base + entry.offset;
            trace!("loading object {} at offset {}", number, offset);
            self.parser.lexer().seek(offset)?;

            let (id, object) = self.parser.parse_indirect_object()?;
            if id.number() != number {
                return Err(ParseError::SyntaxError {
                    position: offset,
                    message: format!(
                        "Object {} found where xref expects object {}",
                        id.number(),
                        number
                    ),
                });
            }
            if id.generation() != entry.generation {
                warn!(
                    "object {} has generation {}, xref says {}",
                    number,
                    id.generation(),
                    entry.generation
                );
            }
            objects[number as usize - 1] = Some(object);
        }

        debug!("{} objects loaded", objects.iter().flatten().count());
        Ok(objects)
    }
}
