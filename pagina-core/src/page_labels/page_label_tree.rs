//! Page label number tree

use super::{PageLabel, PageLabelRange};
use crate::objects::{Array, Dictionary, Object};
use std::collections::BTreeMap;

/// Page label ranges keyed by their first page index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLabelTree {
    ranges: BTreeMap<u32, PageLabel>,
}

impl PageLabelTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page label range; a range starting at the same page is replaced
    pub fn add_range(&mut self, start_page: u32, label: PageLabel) {
        self.ranges.insert(start_page, label);
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Ranges in page order
    pub fn ranges(&self) -> Vec<PageLabelRange> {
        self.ranges
            .iter()
            .map(|(&start, label)| PageLabelRange::new(start, label.clone()))
            .collect()
    }

    /// Get the page label for a specific page
    pub fn get_label(&self, page_index: u32) -> Option<String> {
        self.ranges
            .range(..=page_index)
            .next_back()
            .map(|(&start, label)| label.format_label(page_index - start))
    }

    /// Labels for the first `total_pages` pages; pages before the first
    /// range fall back to their 1-based number
    pub fn get_all_labels(&self, total_pages: u32) -> Vec<String> {
        (0..total_pages)
            .map(|i| self.get_label(i).unwrap_or_else(|| (i + 1).to_string()))
            .collect()
    }

    /// Number tree dictionary `{Nums: [index label ...]}`
    pub fn to_dict(&self) -> Dictionary {
        let mut nums = Array::new();

        for (&start_page, label) in &self.ranges {
            nums.push(Object::Integer(i64::from(start_page)));
            nums.push(Object::Dictionary(label.to_dict()));
        }

        let mut dict = Dictionary::new();
        dict.set("Nums", nums);
        dict
    }

    /// Read a flat number tree. Malformed pairs are skipped; `None` when
    /// there is no `Nums` array.
    pub fn from_dict(dict: &Dictionary) -> Option<Self> {
        let nums = dict.get("Nums").and_then(Object::as_array)?;
        let mut tree = Self::new();

        for pair in nums.as_slice().chunks_exact(2) {
            let Some(page_index) = pair[0].as_integer().and_then(|n| u32::try_from(n).ok())
            else {
                continue;
            };
            let Some(label_dict) = pair[1].as_dict() else {
                continue;
            };
            tree.add_range(page_index, PageLabel::from_dict(label_dict));
        }

        Some(tree)
    }
}

impl FromIterator<PageLabelRange> for PageLabelTree {
    fn from_iter<I: IntoIterator<Item = PageLabelRange>>(iter: I) -> Self {
        let mut tree = Self::new();
        for range in iter {
            tree.add_range(range.start_page, range.label);
        }
        tree
    }
}
