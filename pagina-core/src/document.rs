//! Parsed document
//!
//! A [`Document`] owns every indirect object, the merged cross-reference
//! table and the trailers of every revision. Objects refer to each other by
//! [`ObjectId`] only; lookups go through the document.

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId};
use crate::parser::options::MAX_OBJECTS;
use crate::parser::{
    DocumentReader, ParseOptions, PdfTrailer, PdfVersion, TrailerChain, XRefEntry, XRefTable,
};
use crate::writer;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tracing::debug;

/// Creator recorded by [`Document::set_info_creator`]
pub const CREATOR: &str = "pagina";

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    version: PdfVersion,
    header_offset: u64,
    /// Slot `n - 1` holds object `n`
    objects: Vec<Option<Object>>,
    xref: XRefTable,
    trailers: TrailerChain,
}

impl Document {
    /// An empty document: no objects and a trailer with `Size 1`
    pub fn new() -> Self {
        let mut xref = XRefTable::with_size(1);
        xref.set(0, XRefEntry::free(0, u16::MAX));

        let mut dict = Dictionary::new();
        dict.set("Size", 1);
        let trailer = PdfTrailer {
            dict,
            prev: None,
            xref_offset: 0,
        };

        Self {
            version: PdfVersion::default(),
            header_offset: 0,
            objects: Vec::new(),
            xref,
            trailers: TrailerChain::new(trailer),
        }
    }

    /// Open and parse a file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    pub fn from_reader_with_options<R: Read + Seek>(
        reader: R,
        options: ParseOptions,
    ) -> Result<Self> {
        Ok(DocumentReader::with_options(reader, options).read()?)
    }

    pub(crate) fn from_parts(
        version: PdfVersion,
        header_offset: u64,
        objects: Vec<Option<Object>>,
        xref: XRefTable,
        trailers: TrailerChain,
    ) -> Self {
        Self {
            version,
            header_offset,
            objects,
            xref,
            trailers,
        }
    }

    pub fn version(&self) -> PdfVersion {
        self.version
    }

    pub fn set_version(&mut self, version: PdfVersion) {
        self.version = version;
    }

    /// Offset of the version marker in the parsed source
    pub fn header_offset(&self) -> u64 {
        self.header_offset
    }

    /// Table size: one more than the highest usable object number
    pub fn size(&self) -> u32 {
        self.objects.len() as u32 + 1
    }

    /// Number of objects present
    pub fn len(&self) -> usize {
        self.objects.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The newest trailer dictionary
    pub fn trailer(&self) -> &Dictionary {
        &self.trailers.current().dict
    }

    /// Trailers of every revision, newest first
    pub fn trailers(&self) -> &TrailerChain {
        &self.trailers
    }

    pub fn xref(&self) -> &XRefTable {
        &self.xref
    }

    /// `Root` of the newest trailer
    pub fn root(&self) -> Option<ObjectId> {
        self.trailers.current().root()
    }

    /// `Info` of the newest trailer
    pub fn info(&self) -> Option<ObjectId> {
        self.trailers.current().info()
    }

    /// Object stored under `id`'s number; the generation is not compared.
    /// `None` for object 0, numbers past the table and free slots.
    pub fn get_object(&self, id: ObjectId) -> Option<&Object> {
        let index = (id.number() as usize).checked_sub(1)?;
        self.objects.get(index)?.as_ref()
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        let index = (id.number() as usize).checked_sub(1)?;
        self.objects.get_mut(index)?.as_mut()
    }

    /// Follow `object` once if it is a reference
    pub fn resolve<'a>(&'a self, object: &'a Object) -> Option<&'a Object> {
        match object {
            Object::Reference(id) => self.get_object(*id),
            other => Some(other),
        }
    }

    /// The catalog dictionary named by `Root`
    pub fn catalog(&self) -> Result<&Dictionary> {
        let id = self.root().ok_or(PdfError::MissingRoot)?;
        self.get_object(id)
            .ok_or(PdfError::InvalidObjectReference(id.number(), id.generation()))?
            .as_dict()
            .ok_or_else(|| PdfError::InvalidStructure(format!("Catalog {id} is not a dictionary")))
    }

    fn catalog_mut(&mut self) -> Result<&mut Dictionary> {
        let id = self.root().ok_or(PdfError::MissingRoot)?;
        self.get_object_mut(id)
            .ok_or(PdfError::InvalidObjectReference(id.number(), id.generation()))?
            .as_dict_mut()
            .ok_or_else(|| PdfError::InvalidStructure(format!("Catalog {id} is not a dictionary")))
    }

    /// Generation of the xref entry for `number`, 0 when there is none
    pub fn generation(&self, number: u32) -> u16 {
        self.xref.get(number).map_or(0, |entry| entry.generation)
    }

    /// Replace the object stored under `id`, returning the previous one.
    /// A free slot becomes live with `id`'s generation.
    pub fn set_object(&mut self, id: ObjectId, object: impl Into<Object>) -> Result<Option<Object>> {
        let slot = (id.number() as usize)
            .checked_sub(1)
            .and_then(|index| self.objects.get_mut(index))
            .ok_or(PdfError::InvalidObjectReference(id.number(), id.generation()))?;

        let previous = slot.replace(object.into());
        if previous.is_none() {
            self.xref
                .set(id.number(), XRefEntry::in_use(0, id.generation()));
        }
        Ok(previous)
    }

    /// Append an object under a new number
    pub fn add_object(&mut self, object: impl Into<Object>) -> ObjectId {
        self.objects.push(Some(object.into()));
        let number = self.objects.len() as u32;
        self.xref.resize(number as usize + 1);
        self.xref.set(number, XRefEntry::in_use(0, 0));
        self.sync_size();
        ObjectId::new(number, 0)
    }

    /// Free the slot of `id`; the next generation is recorded for it.
    pub fn remove_object(&mut self, id: ObjectId) -> Option<Object> {
        let index = (id.number() as usize).checked_sub(1)?;
        let removed = self.objects.get_mut(index)?.take()?;
        let generation = self.generation(id.number()).saturating_add(1);
        self.xref.set(id.number(), XRefEntry::free(0, generation));
        Some(removed)
    }

    /// Move object `old` to the free number `new` and rewrite every
    /// reference to it, trailers included. The table grows when `new` lies
    /// past its end.
    pub fn renumber(&mut self, old: u32, new: u32) -> Result<ObjectId> {
        let generation = self.generation(old);
        let old_id = ObjectId::new(old, generation);
        if new == 0 {
            return Err(PdfError::InvalidObjectReference(new, 0));
        }
        if self.get_object(old_id).is_none() {
            return Err(PdfError::InvalidObjectReference(old, generation));
        }
        if self.get_object(ObjectId::new(new, 0)).is_some() {
            return Err(PdfError::InvalidStructure(format!(
                "Object number {new} is already in use"
            )));
        }

        self.ensure_slot(new)?;

        let object = self.remove_object(old_id);
        let new_id = ObjectId::new(new, generation);
        self.objects[new as usize - 1] = object;
        self.xref.set(new, XRefEntry::in_use(0, generation));

        let mut rewrite = |id: &mut ObjectId| {
            if id.number() == old {
                *id = new_id;
            }
        };
        for object in self.objects.iter_mut().flatten() {
            object.for_each_reference_mut(&mut rewrite);
        }
        for trailer in self.trailers.iter_mut() {
            for (_, value) in trailer.dict.iter_mut() {
                value.for_each_reference_mut(&mut rewrite);
            }
        }

        debug!("renumbered object {} to {}", old, new);
        Ok(new_id)
    }

    /// Live objects in ascending number order
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> + '_ {
        self.objects.iter().enumerate().filter_map(move |(index, slot)| {
            let number = index as u32 + 1;
            slot.as_ref()
                .map(|object| (ObjectId::new(number, self.generation(number)), object))
        })
    }

    /// Replace the information dictionary, creating the `Info` object when
    /// the trailer has none.
    pub fn set_info(&mut self, info: Dictionary) -> Result<ObjectId> {
        match self.info() {
            Some(id) if self.get_object(id).is_some() => {
                self.set_object(id, info)?;
                Ok(id)
            }
            _ => {
                let id = self.add_object(info);
                self.trailers.current_mut().dict.set("Info", id);
                Ok(id)
            }
        }
    }

    /// Install `{Creator: (pagina)}` as the information dictionary
    pub fn set_info_creator(&mut self) -> Result<ObjectId> {
        let mut info = Dictionary::new();
        info.set("Creator", CREATOR);
        self.set_info(info)
    }

    /// Store a page-label number tree as the catalog's `PageLabels`
    pub fn set_page_labels(&mut self, labels: Dictionary) -> Result<()> {
        self.catalog_mut()?.set("PageLabels", labels);
        Ok(())
    }

    /// Serialize as a single revision
    pub fn write_to<W: Write>(&self, out: W) -> Result<()> {
        writer::write_document(self, out)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Grow the table so object `number` fits
    /// Grow the table so object `number` has a slot
    pub(crate) fn ensure_slot(&mut self, number: u32) -> Result<()> {
        if u64::from(number) >= MAX_OBJECTS {
            return Err(PdfError::InvalidStructure(format!(
                "Object number {number} exceeds the limit of {MAX_OBJECTS} objects"
            )));
        }
        if number as usize > self.objects.len() {
            self.objects.resize(number as usize, None);
            self.xref.resize(number as usize + 1);
            self.sync_size();
        }
        Ok(())
    }

    fn sync_size(&mut self) {
        let size = i64::from(self.size());
        self.trailers.current_mut().dict.set("Size", size);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
