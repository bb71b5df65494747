//! Object stream expansion
//!
//! An object stream (`/Type /ObjStm`) packs several objects into one stream
//! payload: `N` pairs of `objnum offset` followed by the objects themselves,
//! the first one starting at byte `First`. Expansion moves every packed
//! object into its own slot of the [`Document`] and frees the container.
//!
//! Decompression is pluggable through [`StreamCodec`].

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Object, ObjectId, Stream};
use crate::parser::{ObjectParser, Token};
use std::io::Cursor;
use tracing::{debug, warn};

/// Decoder for one stream filter
pub trait StreamCodec {
    /// The `/Filter` name this codec decodes
    fn filter_name(&self) -> &str;

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Accepts unfiltered streams only
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl StreamCodec for IdentityCodec {
    fn filter_name(&self) -> &str {
        "Identity"
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }
}

/// `/FlateDecode` (zlib) streams
#[cfg(feature = "compression")]
#[derive(Debug, Clone, Copy, Default)]
pub struct FlateCodec;

#[cfg(feature = "compression")]
impl FlateCodec {
    /// Compress `data` the way `decode` expects it
    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }
}

#[cfg(feature = "compression")]
impl StreamCodec for FlateCodec {
    fn filter_name(&self) -> &str {
        "FlateDecode"
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let mut decoder = ZlibDecoder::new(data);
        let mut decoded = Vec::new();
        decoder
            .read_to_end(&mut decoded)
            .map_err(|e| PdfError::CompressionError(format!("Flate decode error: {e}")))?;
        Ok(decoded)
    }
}

/// Decode a stream payload; unfiltered payloads pass through unchanged.
pub fn decode_stream(stream: &Stream, codec: &dyn StreamCodec) -> Result<Vec<u8>> {
    match stream.filters().as_slice() {
        [] => Ok(stream.data().to_vec()),
        [filter] if *filter == codec.filter_name() => codec.decode(stream.data()),
        filters => Err(PdfError::CompressionError(format!(
            "No codec for filter chain {filters:?}"
        ))),
    }
}

fn is_object_stream(object: &Object) -> bool {
    object
        .as_stream()
        .is_some_and(|stream| stream.dictionary().get_name("Type") == Some("ObjStm"))
}

fn required_count(stream: &Stream, key: &str, id: ObjectId) -> Result<u64> {
    stream
        .dictionary()
        .get_integer(key)
        .and_then(|value| u64::try_from(value).ok())
        .ok_or_else(|| {
            PdfError::InvalidStructure(format!(
                "Object stream {id} needs a non-negative integer /{key}"
            ))
        })
}

/// Parse the packed objects of a decoded object stream payload
fn unpack(data: Vec<u8>, count: u64, first: u64, id: ObjectId) -> Result<Vec<(u32, Object)>> {
    let mut parser = ObjectParser::new(Cursor::new(data));

    let mut header = Vec::new();
    for _ in 0..count {
        let lexer = parser.lexer();
        let number = match lexer.next_token()? {
            Token::Integer(n) => u32::try_from(n).ok().filter(|&n| n > 0),
            _ => None,
        };
        let offset = match lexer.next_token()? {
            Token::Integer(n) => u64::try_from(n).ok(),
            _ => None,
        };
        match (number, offset) {
            (Some(number), Some(offset)) => header.push((number, offset)),
            _ => {
                return Err(PdfError::InvalidStructure(format!(
                    "Malformed header in object stream {id}"
                )))
            }
        }
    }

    let mut objects = Vec::with_capacity(header.len());
    for (number, offset) in header {
        parser.lexer().seek(first + offset)?;
        objects.push((number, parser.parse_object()?));
    }
    Ok(objects)
}

impl Document {
    /// Move the objects packed in object stream `id` into their own slots
    /// and free the container. Slots that already hold an object keep it.
    /// Returns the ids of the objects stored.
    pub fn expand_object_stream(
        &mut self,
        id: ObjectId,
        codec: &dyn StreamCodec,
    ) -> Result<Vec<ObjectId>> {
        let object = self
            .get_object(id)
            .ok_or(PdfError::InvalidObjectReference(id.number(), id.generation()))?;
        let stream = match object {
            Object::Stream(stream) if is_object_stream(object) => stream,
            _ => {
                return Err(PdfError::InvalidStructure(format!(
                    "Object {id} is not an object stream"
                )))
            }
        };

        let count = required_count(stream, "N", id)?;
        let first = required_count(stream, "First", id)?;
        let data = decode_stream(stream, codec)?;
        let unpacked = unpack(data, count, first, id)?;

        let mut stored = Vec::with_capacity(unpacked.len());
        for (number, object) in unpacked {
            let target = ObjectId::new(number, 0);
            if self.get_object(target).is_some() {
                warn!(
                    "object {} from object stream {} already present; keeping the existing one",
                    number, id
                );
                continue;
            }
            self.ensure_slot(number)?;
            self.set_object(target, object)?;
            stored.push(target);
        }

        self.remove_object(id);
        debug!("expanded object stream {}: {} objects", id, stored.len());
        Ok(stored)
    }

    /// Expand every object stream; returns how many objects were stored
    pub fn expand_all_object_streams(&mut self, codec: &dyn StreamCodec) -> Result<usize> {
        let containers: Vec<ObjectId> = self
            .iter()
            .filter(|(_, object)| is_object_stream(object))
            .map(|(id, _)| id)
            .collect();

        let mut total = 0;
        for id in containers {
            total += self.expand_object_stream(id, codec)?.len();
        }
        Ok(total)
    }
}
