//! Serializer
//!
//! Writes a [`Document`] as one revision: version marker, every live object
//! in ascending order, a single xref section covering the whole table and a
//! trailer derived from the newest one. Incremental-update history is not
//! preserved.

use crate::document::Document;
use crate::error::Result;
use crate::objects::{Dictionary, Object, ObjectId};
use std::io::{self, Write};

pub struct PdfWriter<W: Write> {
    writer: W,
    /// Offset of each written object, indexed by object number
    xref_positions: Vec<Option<u64>>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: Vec::new(),
            current_position: 0,
        }
    }

    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        self.xref_positions = vec![None; document.size() as usize];

        self.write_header(document)?;
        for (id, object) in document.iter() {
            self.write_object(id, object)?;
        }

        let xref_position = self.current_position;
        self.write_xref(document)?;
        self.write_trailer(document, xref_position)?;

        self.writer.flush()?;
        Ok(())
    }

    /// Bytes written so far
    pub fn position(&self) -> u64 {
        self.current_position
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self, document: &Document) -> Result<()> {
        let header = format!("%PDF-{}\n", document.version());
        self.write_bytes(header.as_bytes())?;
        // Binary marker so transfer tools treat the file as binary
        self.write_bytes(b"%\xE2\xE3\xCF\xD3\n")?;
        Ok(())
    }

    fn write_object(&mut self, id: ObjectId, object: &Object) -> Result<()> {
        if let Some(slot) = self.xref_positions.get_mut(id.number() as usize) {
            *slot = Some(self.current_position);
        }

        let header = format!("{} {} obj\n", id.number(), id.generation());
        self.write_bytes(header.as_bytes())?;

        let mut body = Vec::new();
        write_object_value(&mut body, object)?;
        self.write_bytes(&body)?;

        self.write_bytes(b"\nendobj\n")?;
        Ok(())
    }

    fn write_xref(&mut self, document: &Document) -> Result<()> {
        self.write_bytes(b"xref\n")?;
        let subsection = format!("0 {}\n", self.xref_positions.len());
        self.write_bytes(subsection.as_bytes())?;

        // Free list head
        self.write_bytes(b"0000000000 65535 f \n")?;

        for number in 1..self.xref_positions.len() {
            let generation = document.generation(number as u32);
            let entry = match self.xref_positions[number] {
                Some(position) => format!("{position:010} {generation:05} n \n"),
                None => format!("{:010} {generation:05} f \n", 0),
            };
            self.write_bytes(entry.as_bytes())?;
        }

        Ok(())
    }

    fn write_trailer(&mut self, document: &Document, xref_position: u64) -> Result<()> {
        let mut trailer: Dictionary = document.trailer().clone();
        trailer.remove("Prev");
        trailer.set("Size", Object::Integer(self.xref_positions.len() as i64));

        self.write_bytes(b"trailer\n")?;
        let mut body = Vec::new();
        write_object_value(&mut body, &Object::Dictionary(trailer))?;
        self.write_bytes(&body)?;
        self.write_bytes(b"\nstartxref\n")?;
        self.write_bytes(xref_position.to_string().as_bytes())?;
        self.write_bytes(b"\n%%EOF\n")?;

        Ok(())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

/// Serialize `document` into `out`
pub fn write_document<W: Write>(document: &Document, out: W) -> Result<()> {
    PdfWriter::new_with_writer(out).write_document(document)
}

/// Render one value in file syntax for display. Stream payloads are
/// included lossily; a value that cannot be written ends the text with the
/// error in angle brackets.
pub fn object_to_string(object: &Object) -> String {
    let mut out = Vec::new();
    if let Err(e) = write_object_value(&mut out, object) {
        out.extend_from_slice(format!("<{e}>").as_bytes());
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Render one value in file syntax
pub fn object_to_bytes(object: &Object) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_object_value(&mut out, object)?;
    Ok(out)
}

/// Write one direct value, or a stream with its payload. NaN and infinite
/// reals have no file syntax and fail with [`io::ErrorKind::InvalidData`].
pub fn write_object_value<W: Write>(out: &mut W, object: &Object) -> io::Result<()> {
    match object {
        Object::Null => out.write_all(b"null"),
        Object::Boolean(b) => out.write_all(if *b { &b"true"[..] } else { &b"false"[..] }),
        Object::Integer(i) => write!(out, "{i}"),
        Object::Real(f) => out.write_all(format_real(*f)?.as_bytes()),
        Object::String(bytes) => write_string(out, bytes),
        Object::Name(name) => write_name(out, name),
        Object::Array(array) => {
            out.write_all(b"[")?;
            for (i, item) in array.iter().enumerate() {
                if i > 0 {
                    out.write_all(b" ")?;
                }
                write_object_value(out, item)?;
            }
            out.write_all(b"]")
        }
        Object::Dictionary(dict) => write_dictionary(out, dict),
        Object::Stream(stream) => {
            let mut dict = stream.dictionary().clone();
            dict.set("Length", Object::Integer(stream.data().len() as i64));
            write_dictionary(out, &dict)?;
            out.write_all(b"\nstream\n")?;
            out.write_all(stream.data())?;
            out.write_all(b"\nendstream")
        }
        Object::Reference(id) => write!(out, "{} {} R", id.number(), id.generation()),
    }
}

fn write_dictionary<W: Write>(out: &mut W, dict: &Dictionary) -> io::Result<()> {
    out.write_all(b"<<")?;
    for (key, value) in dict.iter() {
        out.write_all(b" ")?;
        write_name(out, key)?;
        out.write_all(b" ")?;
        write_object_value(out, value)?;
    }
    out.write_all(b" >>")
}

/// Reals always carry a decimal point so they read back as reals
fn format_real(value: f64) -> io::Result<String> {
    if !value.is_finite() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Real {value} cannot be written"),
        ));
    }
    // f64 Display never uses exponent notation
    let mut text = value.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    Ok(text)
}

/// Printable ASCII goes out as a literal string, anything else as hex
fn write_string<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    if bytes.iter().all(|b| (32..=126).contains(b)) {
        out.write_all(b"(")?;
        for &b in bytes {
            if matches!(b, b'(' | b')' | b'\\') {
                out.write_all(b"\\")?;
            }
            out.write_all(&[b])?;
        }
        out.write_all(b")")
    } else {
        out.write_all(b"<")?;
        for b in bytes {
            write!(out, "{b:02X}")?;
        }
        out.write_all(b">")
    }
}

/// Names go out as their UTF-8 bytes, escaped outside printable ASCII
fn write_name<W: Write>(out: &mut W, name: &str) -> io::Result<()> {
    out.write_all(b"/")?;
    for &b in name.as_bytes() {
        let plain = (0x21..=0x7e).contains(&b)
            && !matches!(
                b,
                b'#' | b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
            );
        if plain {
            out.write_all(&[b])?;
        } else {
            write!(out, "#{b:02X}")?;
        }
    }
    Ok(())
}
