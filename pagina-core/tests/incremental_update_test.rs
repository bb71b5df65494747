//! Incremental update resolution tests
//!
//! Files are assembled by hand: a base revision followed by appended
//! revisions whose trailers chain back through `Prev`.

use pagina::parser::{ErrorKind, ParseError, XRefEntry};
use pagina::{Document, Object, ObjectId, PdfError};
use std::io::Cursor;

/// Appends objects and xref sections, tracking offsets from the header
struct FileBuilder {
    bytes: Vec<u8>,
}

impl FileBuilder {
    fn new() -> Self {
        Self {
            bytes: b"%PDF-1.4\n".to_vec(),
        }
    }

    /// Append an indirect object, returning its offset
    fn object(&mut self, number: u32, generation: u16, body: &str) -> u64 {
        let offset = self.bytes.len() as u64;
        self.bytes
            .extend_from_slice(format!("{number} {generation} obj\n{body}\nendobj\n").as_bytes());
        offset
    }

    /// Offset the next section will be written at
    fn next_offset(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Append `xref`, the given subsections and a trailer. Entries are
    /// `(offset, generation, in_use)`.
    fn revision(&mut self, subsections: &[(u32, &[(u64, u16, bool)])], trailer: &str) -> u64 {
        let xref_offset = self.next_offset();
        let mut text = String::from("xref\n");
        for (first, entries) in subsections {
            text.push_str(&format!("{first} {}\n", entries.len()));
            for (offset, generation, in_use) in entries.iter() {
                let flag = if *in_use { 'n' } else { 'f' };
                text.push_str(&format!("{offset:010} {generation:05} {flag} \n"));
            }
        }
        text.push_str(&format!(
            "trailer\n{trailer}\nstartxref\n{xref_offset}\n%%EOF\n"
        ));
        self.bytes.extend_from_slice(text.as_bytes());
        xref_offset
    }

    fn parse(&self) -> pagina::Result<Document> {
        Document::from_reader(Cursor::new(self.bytes.clone()))
    }
}

const FREE_HEAD: (u64, u16, bool) = (0, 65535, false);

/// Base revision with a catalog (1) and a string (2)
fn base() -> (FileBuilder, u64) {
    let mut file = FileBuilder::new();
    let catalog = file.object(1, 0, "<< /Type /Catalog >>");
    let text = file.object(2, 0, "(old)");
    let xref = file.revision(
        &[(0, &[FREE_HEAD, (catalog, 0, true), (text, 0, true)])],
        "<< /Size 3 /Root 1 0 R >>",
    );
    (file, xref)
}

#[test]
fn test_single_revision() {
    let (file, _) = base();
    let doc = file.parse().unwrap();

    assert_eq!(doc.trailers().len(), 1);
    assert!(!doc.trailers().has_previous());
    assert_eq!(doc.len(), 2);
    assert_eq!(
        doc.get_object(ObjectId::new(2, 0)),
        Some(&Object::String(b"old".to_vec()))
    );
}

#[test]
fn test_update_overrides_and_extends() {
    let (mut file, base_xref) = base();
    let text = file.object(2, 0, "(new)");
    let extra = file.object(3, 0, "[1 2 3]");
    let newest_xref = file.revision(
        &[(2, &[(text, 0, true), (extra, 0, true)])],
        &format!("<< /Size 4 /Root 1 0 R /Prev {base_xref} >>"),
    );

    let doc = file.parse().unwrap();

    // Equal generations: the newest revision wins
    assert_eq!(
        doc.get_object(ObjectId::new(2, 0)),
        Some(&Object::String(b"new".to_vec()))
    );
    assert_eq!(
        doc.get_object(ObjectId::new(3, 0))
            .and_then(Object::as_array)
            .map(|a| a.len()),
        Some(3)
    );
    assert!(doc.catalog().is_ok());

    let trailers = doc.trailers();
    assert_eq!(trailers.len(), 2);
    assert_eq!(trailers.current().xref_offset, newest_xref);
    assert_eq!(trailers.current().prev, Some(base_xref));
    assert_eq!(trailers.all()[1].xref_offset, base_xref);
    assert_eq!(trailers.all()[1].size(), 3);
    assert_eq!(doc.trailer().get_integer("Size"), Some(4));
}

#[test]
fn test_update_frees_object() {
    let (mut file, base_xref) = base();
    file.revision(
        &[(2, &[(0, 1, false)])],
        &format!("<< /Size 3 /Root 1 0 R /Prev {base_xref} >>"),
    );

    let doc = file.parse().unwrap();
    assert!(doc.get_object(ObjectId::new(2, 0)).is_none());
    assert_eq!(doc.xref().get(2), Some(&XRefEntry::free(0, 1)));
    assert_eq!(doc.len(), 1);
}

#[test]
fn test_older_higher_generation_is_kept() {
    let mut file = FileBuilder::new();
    let catalog = file.object(1, 0, "<< /Type /Catalog >>");
    let reused = file.object(2, 1, "(generation one)");
    let base_xref = file.revision(
        &[(0, &[FREE_HEAD, (catalog, 0, true), (reused, 1, true)])],
        "<< /Size 3 /Root 1 0 R >>",
    );
    // A later revision describing the slot with a lower generation
    let stale = file.object(2, 0, "(generation zero)");
    file.revision(
        &[(2, &[(stale, 0, true)])],
        &format!("<< /Size 3 /Root 1 0 R /Prev {base_xref} >>"),
    );

    let doc = file.parse().unwrap();
    assert_eq!(doc.xref().get(2), Some(&XRefEntry::in_use(reused, 1)));
    assert_eq!(
        doc.get_object(ObjectId::new(2, 1)),
        Some(&Object::String(b"generation one".to_vec()))
    );
    assert_eq!(doc.generation(2), 1);
}

#[test]
fn test_three_revisions() {
    let (mut file, first) = base();
    let second_obj = file.object(2, 0, "(second)");
    let second = file.revision(
        &[(2, &[(second_obj, 0, true)])],
        &format!("<< /Size 3 /Root 1 0 R /Prev {first} >>"),
    );
    let third_obj = file.object(2, 0, "(third)");
    file.revision(
        &[(2, &[(third_obj, 0, true)])],
        &format!("<< /Size 3 /Root 1 0 R /Prev {second} >>"),
    );

    let doc = file.parse().unwrap();
    assert_eq!(doc.trailers().len(), 3);
    assert_eq!(
        doc.get_object(ObjectId::new(2, 0)),
        Some(&Object::String(b"third".to_vec()))
    );
    let offsets: Vec<u64> = doc.trailers().iter().map(|t| t.xref_offset).collect();
    assert_eq!(offsets[1..], [second, first]);
}

#[test]
fn test_prev_cycle_is_reported() {
    let mut file = FileBuilder::new();
    let catalog = file.object(1, 0, "<< /Type /Catalog >>");
    // The base trailer points back at its own section
    let base_xref = file.next_offset();
    file.revision(
        &[(0, &[FREE_HEAD, (catalog, 0, true)])],
        &format!("<< /Size 2 /Root 1 0 R /Prev {base_xref} >>"),
    );
    file.revision(
        &[(1, &[(catalog, 0, true)])],
        &format!("<< /Size 2 /Root 1 0 R /Prev {base_xref} >>"),
    );

    match file.parse() {
        Err(PdfError::Parse(ParseError::CircularPrev { offset })) => {
            assert_eq!(offset, base_xref)
        }
        other => panic!("expected a Prev cycle, got {other:?}"),
    }
}

#[test]
fn test_prev_to_garbage() {
    let (mut file, _) = base();
    file.revision(&[], "<< /Size 3 /Root 1 0 R /Prev 9 >>");

    match file.parse() {
        Err(PdfError::Parse(err)) => {
            assert!(matches!(err, ParseError::InvalidXRef { .. }));
            assert_eq!(err.kind(), ErrorKind::Parse);
        }
        other => panic!("expected an xref error, got {other:?}"),
    }
}

#[test]
fn test_update_past_table_size() {
    let (mut file, base_xref) = base();
    let extra = file.object(5, 0, "null");
    // Newest Size 3 cannot hold object 5
    file.revision(
        &[(5, &[(extra, 0, true)])],
        &format!("<< /Size 3 /Root 1 0 R /Prev {base_xref} >>"),
    );

    assert!(matches!(
        file.parse(),
        Err(PdfError::Parse(ParseError::InvalidXRef { .. }))
    ));
}

#[test]
fn test_stream_length_past_end_of_data() {
    let mut file = FileBuilder::new();
    let catalog = file.object(1, 0, "<< /Type /Catalog >>");
    let stream = file.object(2, 0, "<< /Length 500 >>\nstream\nABCDE\nendstream");
    file.revision(
        &[(0, &[FREE_HEAD, (catalog, 0, true), (stream, 0, true)])],
        "<< /Size 3 /Root 1 0 R >>",
    );

    match file.parse() {
        Err(PdfError::Parse(err)) => assert_eq!(err.kind(), ErrorKind::Parse),
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_stream_object_in_update() {
    let (mut file, base_xref) = base();
    let stream = file.object(3, 0, "<< /Length 5 >>\nstream\nABCDE\nendstream");
    file.revision(
        &[(3, &[(stream, 0, true)])],
        &format!("<< /Size 4 /Root 1 0 R /Prev {base_xref} >>"),
    );

    let doc = file.parse().unwrap();
    let stream = doc
        .get_object(ObjectId::new(3, 0))
        .and_then(Object::as_stream)
        .unwrap();
    assert_eq!(stream.data(), b"ABCDE");
}
