//! Parsing limits
//!
//! Every buffer the parser grows is bounded by one of these limits; going past
//! one is a fatal [`ParseError::LimitExceeded`](super::ParseError::LimitExceeded).

/// Maximum nesting of arrays and dictionaries
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Largest object table a document may declare or grow to, object 0 included
pub const MAX_OBJECTS: u64 = 8 * 1024 * 1024;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest allowed array/dictionary nesting.
    pub max_nesting_depth: usize,
    /// Largest accepted stream `Length`, checked before any byte is read.
    pub max_stream_length: u64,
    /// Largest decoded string, literal or hex.
    pub max_string_length: usize,
    /// Largest decoded name.
    pub max_name_length: usize,
    /// How far back from the end of input the trailer search looks.
    pub max_trailer_scan: u64,
    /// Largest trailer `Size`, checked before the object table is allocated.
    pub max_objects: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting_depth: MAX_NESTING_DEPTH,
            max_stream_length: 256 * MIB,
            max_string_length: 16 * MIB as usize,
            max_name_length: 4096,
            max_trailer_scan: MIB,
            max_objects: MAX_OBJECTS,
        }
    }
}

impl ParseOptions {
    /// Tight limits for untrusted input.
    pub fn conservative() -> Self {
        Self {
            max_nesting_depth: 100,
            max_stream_length: 16 * MIB,
            max_string_length: MIB as usize,
            max_name_length: 127,
            max_trailer_scan: 64 * 1024,
            max_objects: 1024 * 1024,
        }
    }

    pub fn permissive() -> Self {
        Self {
            max_nesting_depth: 10_000,
            max_stream_length: 4096 * MIB,
            max_string_length: 256 * MIB as usize,
            max_name_length: 64 * 1024,
            max_trailer_scan: 64 * MIB,
            max_objects: 64 * MIB,
        }
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    pub fn with_max_stream_length(mut self, length: u64) -> Self {
        self.max_stream_length = length;
        self
    }

    pub fn with_max_string_length(mut self, length: usize) -> Self {
        self.max_string_length = length;
        self
    }

    pub fn with_max_name_length(mut self, length: usize) -> Self {
        self.max_name_length = length;
        self
    }

    pub fn with_max_trailer_scan(mut self, bytes: u64) -> Self {
        self.max_trailer_scan = bytes;
        self
    }

    pub fn with_max_objects(mut self, count: u64) -> Self {
        self.max_objects = count;
        self
    }
}
