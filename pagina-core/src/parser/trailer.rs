//! Trailer
//!
//! `trailer << ... >> startxref <offset> %%EOF`. The newest trailer is found by
//! scanning backward from the end of input; older ones follow each `xref`
//! section reached through `Prev`.

use super::lexer::{is_regular, Lexer, Token};
use super::objects::ObjectParser;
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object, ObjectId};
use std::io::{Read, Seek};

const SCAN_CHUNK: u64 = 4096;

/// Trailer information
#[derive(Debug, Clone, PartialEq)]
pub struct PdfTrailer {
    /// The trailer dictionary
    pub dict: Dictionary,
    /// Offset of the previous xref section (if any)
    pub prev: Option<u64>,
    /// Offset of this revision's xref section, from `startxref`
    pub xref_offset: u64,
}

impl PdfTrailer {
    /// Validate a trailer dictionary: `Size` must be an integer of at least
    /// 1 and `Prev`, when present, a non-negative integer.
    pub fn from_dict(dict: Dictionary, xref_offset: u64, position: u64) -> ParseResult<Self> {
        match dict.get("Size") {
            Some(Object::Integer(size)) if (1..=i64::from(u32::MAX)).contains(size) => {}
            Some(other) => {
                return Err(ParseError::InvalidTrailer {
                    position,
                    message: format!("/Size must be an integer >= 1, found {other:?}"),
                })
            }
            None => {
                return Err(ParseError::MissingKey {
                    position,
                    key: "Size".to_string(),
                })
            }
        }

        let prev = match dict.get("Prev") {
            None => None,
            Some(Object::Integer(prev)) if *prev >= 0 => Some(*prev as u64),
            Some(other) => {
                return Err(ParseError::InvalidTrailer {
                    position,
                    message: format!("/Prev must be a non-negative integer, found {other:?}"),
                })
            }
        };

        Ok(PdfTrailer {
            dict,
            prev,
            xref_offset,
        })
    }

    /// Parse a trailer at the cursor
    pub fn parse<R: Read + Seek>(parser: &mut ObjectParser<R>) -> ParseResult<Self> {
        let lexer = parser.lexer();
        lexer.skip_whitespace()?;
        let position = lexer.position();
        expect(lexer, Token::Trailer, "'trailer'")?;

        let dict = match parser.parse_object()? {
            Object::Dictionary(dict) => dict,
            other => {
                return Err(ParseError::InvalidTrailer {
                    position,
                    message: format!("Expected a dictionary, found {}", other.type_name()),
                })
            }
        };

        let lexer = parser.lexer();
        expect(lexer, Token::StartXRef, "'startxref'")?;
        let offset_position = lexer.position();
        let xref_offset = match lexer.next_token()? {
            Token::Integer(offset) if offset >= 0 => offset as u64,
            other => {
                return Err(ParseError::InvalidTrailer {
                    position: offset_position,
                    message: format!("startxref must be a non-negative integer, found {other:?}"),
                })
            }
        };
        expect(lexer, Token::EofMarker, "'%%EOF'")?;

        Self::from_dict(dict, xref_offset, position)
    }

    /// Table size: object 0 plus every usable object number
    pub fn size(&self) -> u32 {
        // Checked in from_dict
        self.dict
            .get_integer("Size")
            .and_then(|size| u32::try_from(size).ok())
            .unwrap_or(1)
    }

    /// The document catalog reference
    pub fn root(&self) -> Option<ObjectId> {
        self.dict.get("Root").and_then(Object::as_reference)
    }

    /// The document information dictionary reference
    pub fn info(&self) -> Option<ObjectId> {
        self.dict.get("Info").and_then(Object::as_reference)
    }

    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }
}

fn expect<R: Read + Seek>(lexer: &mut Lexer<R>, expected: Token, what: &str) -> ParseResult<()> {
    let position = lexer.position();
    let token = lexer.next_token()?;
    if token == expected {
        Ok(())
    } else {
        Err(ParseError::InvalidTrailer {
            position,
            message: format!("Expected {what}, found {token:?}"),
        })
    }
}

/// True when `bytes` opens with the `trailer` keyword, after spaces or tabs.
fn line_starts_with_trailer(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|&b| !matches!(b, b' ' | b'\t' | b'\0' | b'\x0C'))
        .unwrap_or(bytes.len());
    let rest = &bytes[start..];
    rest.starts_with(b"trailer") && rest.get(7).map_or(true, |&b| !is_regular(b))
}

/// Scan backward from the end of input, a line at a time, for the last line
/// that begins with `trailer`. Returns the offset of that line.
///
/// At most `max_scan` bytes from the end are examined.
pub fn find_trailer<R: Read + Seek>(lexer: &mut Lexer<R>, max_scan: u64) -> ParseResult<u64> {
    let len = lexer.source_len()?;
    let floor = len.saturating_sub(max_scan);

    let mut head = [0u8; 16];
    let mut check_line = |lexer: &mut Lexer<R>, start: u64| -> ParseResult<bool> {
        let n = (len - start).min(head.len() as u64) as usize;
        lexer.read_at(start, &mut head[..n])?;
        Ok(line_starts_with_trailer(&head[..n]))
    };

    let mut end = len;
    while end > floor {
        let start = end.saturating_sub(SCAN_CHUNK).max(floor);
        let mut chunk = vec![0u8; (end - start) as usize];
        lexer.read_at(start, &mut chunk)?;

        for i in (0..chunk.len()).rev() {
            if matches!(chunk[i], b'\n' | b'\r') {
                let line_start = start + i as u64 + 1;
                if line_start < len && check_line(lexer, line_start)? {
                    tracing::debug!("trailer found at offset {}", line_start);
                    return Ok(line_start);
                }
            }
        }
        end = start;
    }

    if floor == 0 && len > 0 && check_line(lexer, 0)? {
        return Ok(0);
    }

    Err(ParseError::TrailerNotFound {
        scanned: len - floor,
    })
}

/// Trailers of every revision, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct TrailerChain {
    trailers: Vec<PdfTrailer>,
}

impl TrailerChain {
    pub fn new(trailer: PdfTrailer) -> Self {
        Self {
            trailers: vec![trailer],
        }
    }

    /// Append an older revision's trailer
    pub fn add_previous(&mut self, trailer: PdfTrailer) {
        self.trailers.push(trailer);
    }

    /// The newest trailer
    pub fn current(&self) -> &PdfTrailer {
        &self.trailers[0]
    }

    pub fn current_mut(&mut self) -> &mut PdfTrailer {
        &mut self.trailers[0]
    }

    pub fn all(&self) -> &[PdfTrailer] {
        &self.trailers
    }

    pub fn len(&self) -> usize {
        self.trailers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trailers.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.trailers.len() > 1
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PdfTrailer> {
        self.trailers.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PdfTrailer> {
        self.trailers.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parser(input: &[u8]) -> ObjectParser<Cursor<Vec<u8>>> {
        ObjectParser::new(Cursor::new(input.to_vec()))
    }

    fn trailer_dict(size: i64) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.set("Size", size);
        dict.set("Root", ObjectId::new(1, 0));
        dict
    }

    #[test]
    fn test_trailer_basic() {
        let trailer = PdfTrailer::from_dict(trailer_dict(10), 1234, 0).unwrap();
        assert_eq!(trailer.size(), 10);
        assert_eq!(trailer.root(), Some(ObjectId::new(1, 0)));
        assert_eq!(trailer.info(), None);
        assert_eq!(trailer.prev, None);
        assert_eq!(trailer.xref_offset, 1234);
    }

    #[test]
    fn test_trailer_with_prev_and_info() {
        let mut dict = trailer_dict(10);
        dict.set("Prev", 5678);
        dict.set("Info", ObjectId::new(2, 0));
        let trailer = PdfTrailer::from_dict(dict, 9000, 0).unwrap();
        assert_eq!(trailer.prev, Some(5678));
        assert_eq!(trailer.info(), Some(ObjectId::new(2, 0)));
    }

    #[test]
    fn test_trailer_size_validation() {
        let missing = PdfTrailer::from_dict(Dictionary::new(), 0, 0);
        assert!(matches!(missing, Err(ParseError::MissingKey { .. })));

        let zero = PdfTrailer::from_dict(trailer_dict(0), 0, 0);
        assert!(matches!(zero, Err(ParseError::InvalidTrailer { .. })));

        let mut real = Dictionary::new();
        real.set("Size", 3.0);
        assert!(matches!(
            PdfTrailer::from_dict(real, 0, 0),
            Err(ParseError::InvalidTrailer { .. })
        ));
    }

    #[test]
    fn test_trailer_prev_validation() {
        let mut dict = trailer_dict(3);
        dict.set("Prev", -1);
        assert!(PdfTrailer::from_dict(dict, 0, 0).is_err());

        let mut dict = trailer_dict(3);
        dict.set("Prev", 12.5);
        assert!(PdfTrailer::from_dict(dict, 0, 0).is_err());
    }

    #[test]
    fn test_parse_trailer() {
        let mut parser =
            parser(b"trailer\n<< /Size 4 /Root 1 0 R /Prev 99 >>\nstartxref\n120\n%%EOF\n");
        let trailer = PdfTrailer::parse(&mut parser).unwrap();
        assert_eq!(trailer.size(), 4);
        assert_eq!(trailer.prev, Some(99));
        assert_eq!(trailer.xref_offset, 120);
        assert_eq!(trailer.root(), Some(ObjectId::new(1, 0)));
    }

    #[test]
    fn test_parse_trailer_requires_eof_marker() {
        let mut parser = parser(b"trailer\n<< /Size 4 >>\nstartxref\n120\n");
        assert!(matches!(
            PdfTrailer::parse(&mut parser),
            Err(ParseError::InvalidTrailer { .. })
        ));
    }

    #[test]
    fn test_parse_trailer_requires_startxref() {
        let mut parser = parser(b"trailer\n<< /Size 4 >>\n120\n%%EOF");
        assert!(PdfTrailer::parse(&mut parser).is_err());

        let mut negative = self::parser(b"trailer << /Size 4 >> startxref -5 %%EOF");
        assert!(PdfTrailer::parse(&mut negative).is_err());
    }

    #[test]
    fn test_parse_trailer_requires_dictionary() {
        let mut parser = parser(b"trailer [1 2] startxref 0 %%EOF");
        assert!(matches!(
            PdfTrailer::parse(&mut parser),
            Err(ParseError::InvalidTrailer { .. })
        ));
    }

    #[test]
    fn test_line_starts_with_trailer() {
        assert!(line_starts_with_trailer(b"trailer\n<<"));
        assert!(line_starts_with_trailer(b"  trailer<< /Size 1 >>"));
        assert!(line_starts_with_trailer(b"trailer"));
        assert!(!line_starts_with_trailer(b"trailers"));
        assert!(!line_starts_with_trailer(b"% trailer"));
        assert!(!line_starts_with_trailer(b""));
    }

    #[test]
    fn test_find_trailer_picks_last() {
        let input = b"%PDF-1.4\ntrailer\n<< /Size 1 >>\nstartxref\n0\n%%EOF\ntrailer\n<< /Size 2 >>\nstartxref\n0\n%%EOF\n";
        let mut lexer = Lexer::new(Cursor::new(input.to_vec()));
        let offset = find_trailer(&mut lexer, 1024).unwrap();
        let expected = input
            .windows(7)
            .rposition(|w| w == b"trailer")
            .unwrap() as u64;
        assert_eq!(offset, expected);
    }

    #[test]
    fn test_find_trailer_across_chunks() {
        let mut input = b"%PDF-1.4\ntrailer\n<< /Size 1 >>\nstartxref\n0\n%%EOF\n".to_vec();
        input.extend(std::iter::repeat(b'%').take(10_000));
        input.push(b'\n');
        let mut lexer = Lexer::new(Cursor::new(input));
        assert_eq!(find_trailer(&mut lexer, 1 << 20).unwrap(), 9);
    }

    #[test]
    fn test_find_trailer_on_first_line() {
        let mut lexer = Lexer::new(Cursor::new(b"trailer << /Size 1 >>".to_vec()));
        assert_eq!(find_trailer(&mut lexer, 1024).unwrap(), 0);
    }

    #[test]
    fn test_find_trailer_missing() {
        let mut lexer = Lexer::new(Cursor::new(b"%PDF-1.4\n1 0 obj null endobj\n".to_vec()));
        assert!(matches!(
            find_trailer(&mut lexer, 1024),
            Err(ParseError::TrailerNotFound { .. })
        ));

        let mut empty = Lexer::new(Cursor::new(Vec::new()));
        assert!(find_trailer(&mut empty, 1024).is_err());
    }

    #[test]
    fn test_find_trailer_respects_scan_limit() {
        let mut input = b"trailer\n".to_vec();
        input.extend(std::iter::repeat(b' ').take(100));
        let mut lexer = Lexer::new(Cursor::new(input));
        assert!(find_trailer(&mut lexer, 50).is_err());
    }

    #[test]
    fn test_trailer_chain() {
        let newest = PdfTrailer::from_dict(trailer_dict(5), 300, 0).unwrap();
        let older = PdfTrailer::from_dict(trailer_dict(3), 100, 0).unwrap();

        let mut chain = TrailerChain::new(newest.clone());
        assert!(!chain.has_previous());
        chain.add_previous(older.clone());

        assert_eq!(chain.len(), 2);
        assert!(chain.has_previous());
        assert_eq!(chain.current(), &newest);
        assert_eq!(chain.all()[1], older);
        assert_eq!(
            chain.iter().map(|t| t.xref_offset).collect::<Vec<_>>(),
            vec![300, 100]
        );
    }
}
