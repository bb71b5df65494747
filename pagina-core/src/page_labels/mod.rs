//! Page labels
//!
//! Custom page numbering stored in the catalog's `PageLabels` number tree,
//! such as roman numerals for front matter. Trees can be built in code or
//! parsed from a compact text specification (see [`parse_page_label_spec`]).

mod page_label;
mod page_label_tree;
mod parser;

pub use page_label::{PageLabel, PageLabelRange, PageLabelStyle};
pub use page_label_tree::PageLabelTree;
pub use parser::{parse_page_label_spec, PageLabelError, MAX_PREFIX_LEN};

use crate::objects::Dictionary;

/// Parse a specification straight into a `{Nums: [...]}` dictionary
pub fn parse_page_labels(spec: &str) -> Result<Dictionary, PageLabelError> {
    parse_page_label_spec(spec).map(|tree| tree.to_dict())
}
