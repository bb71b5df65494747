//! Object model
//!
//! [`Object`] is the closed set of values a document is made of. Arrays and
//! dictionaries own their children; indirect objects are linked through
//! [`ObjectId`] references.

mod array;
mod dictionary;
mod primitive;
mod stream;

pub use array::Array;
pub use dictionary::Dictionary;
pub use primitive::{Object, ObjectId};
pub use stream::Stream;
