//! Label dictionaries and number formatting

use crate::objects::{Dictionary, Object};

/// The `/S` entry of a label dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLabelStyle {
    /// `D`: 1, 2, 3
    DecimalArabic,
    /// `R`: I, II, III
    UppercaseRoman,
    /// `r`: i, ii, iii
    LowercaseRoman,
    /// `A`: A..Z, then AA..ZZ, AAA..
    UppercaseLetters,
    /// `a`: a..z, then aa..zz, aaa..
    LowercaseLetters,
    /// No `/S` entry; the label is the prefix alone
    None,
}

impl PageLabelStyle {
    /// The `/S` name, `None` for prefix-only labels
    pub fn to_pdf_name(&self) -> Option<&'static str> {
        let name = match self {
            PageLabelStyle::DecimalArabic => "D",
            PageLabelStyle::UppercaseRoman => "R",
            PageLabelStyle::LowercaseRoman => "r",
            PageLabelStyle::UppercaseLetters => "A",
            PageLabelStyle::LowercaseLetters => "a",
            PageLabelStyle::None => return None,
        };
        Some(name)
    }

    pub fn from_pdf_name(name: &str) -> Option<Self> {
        [
            PageLabelStyle::DecimalArabic,
            PageLabelStyle::UppercaseRoman,
            PageLabelStyle::LowercaseRoman,
            PageLabelStyle::UppercaseLetters,
            PageLabelStyle::LowercaseLetters,
        ]
        .into_iter()
        .find(|style| style.to_pdf_name() == Some(name))
    }

    /// Render `number` in this style; 0 renders as an empty string for
    /// every style but decimal.
    pub fn format(&self, number: u32) -> String {
        match self {
            PageLabelStyle::DecimalArabic => number.to_string(),
            PageLabelStyle::UppercaseRoman => roman(number, true),
            PageLabelStyle::LowercaseRoman => roman(number, false),
            PageLabelStyle::UppercaseLetters => letters(number, true),
            PageLabelStyle::LowercaseLetters => letters(number, false),
            PageLabelStyle::None => String::new(),
        }
    }
}

/// One entry of a `Nums` array: style, optional prefix and first number
#[derive(Debug, Clone, PartialEq)]
pub struct PageLabel {
    pub style: PageLabelStyle,
    /// Text put in front of every number of the range
    pub prefix: Option<String>,
    /// Number of the range's first page; 1 when unset
    pub start: Option<u32>,
}

impl PageLabel {
    pub fn new(style: PageLabelStyle) -> Self {
        Self {
            style,
            prefix: None,
            start: None,
        }
    }

    pub fn decimal() -> Self {
        Self::new(PageLabelStyle::DecimalArabic)
    }

    pub fn roman_uppercase() -> Self {
        Self::new(PageLabelStyle::UppercaseRoman)
    }

    pub fn roman_lowercase() -> Self {
        Self::new(PageLabelStyle::LowercaseRoman)
    }

    pub fn letters_uppercase() -> Self {
        Self::new(PageLabelStyle::UppercaseLetters)
    }

    pub fn letters_lowercase() -> Self {
        Self::new(PageLabelStyle::LowercaseLetters)
    }

    /// Every page of the range gets the same text
    pub fn prefix_only(prefix: impl Into<String>) -> Self {
        Self::new(PageLabelStyle::None).with_prefix(prefix)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn starting_at(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    /// Label of the page `offset` pages into the range
    pub fn format_label(&self, offset: u32) -> String {
        let number = self.start.unwrap_or(1).saturating_add(offset);
        let mut label = self.prefix.clone().unwrap_or_default();
        label.push_str(&self.style.format(number));
        label
    }

    /// Label dictionary with `P`, `S` and `St` as present
    pub fn to_dict(&self) -> Dictionary {
        let mut dict = Dictionary::new();

        if let Some(prefix) = &self.prefix {
            dict.set("P", Object::String(prefix.as_bytes().to_vec()));
        }
        if let Some(style) = self.style.to_pdf_name() {
            dict.set("S", Object::Name(style.to_string()));
        }
        if let Some(start) = self.start {
            dict.set("St", Object::Integer(i64::from(start)));
        }

        dict
    }

    /// Read a label dictionary; unknown styles read as prefix-only
    pub fn from_dict(dict: &Dictionary) -> Self {
        let style = dict
            .get_name("S")
            .and_then(PageLabelStyle::from_pdf_name)
            .unwrap_or(PageLabelStyle::None);

        let prefix = dict
            .get("P")
            .and_then(Object::as_string)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned());

        let start = dict
            .get_integer("St")
            .and_then(|start| u32::try_from(start).ok());

        Self {
            style,
            prefix,
            start,
        }
    }
}

/// A label together with the page index where its range begins
#[derive(Debug, Clone, PartialEq)]
pub struct PageLabelRange {
    /// 0-based
    pub start_page: u32,
    pub label: PageLabel,
}

impl PageLabelRange {
    pub fn new(start_page: u32, label: PageLabel) -> Self {
        Self { start_page, label }
    }
}

/// Additive roman numerals, no upper bound: 4000 is `MMMM`
fn roman(number: u32, uppercase: bool) -> String {
    const DIGITS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];

    let mut rest = number;
    let mut out = String::new();
    for (value, digits) in DIGITS {
        out.extend(std::iter::repeat(digits).take((rest / value) as usize));
        rest %= value;
    }

    if uppercase {
        out
    } else {
        out.to_ascii_lowercase()
    }
}

/// 1..=26 is one letter, 27..=52 the same letters doubled, and so on
fn letters(number: u32, uppercase: bool) -> String {
    if number == 0 {
        return String::new();
    }

    let base = if uppercase { b'A' } else { b'a' };
    let letter = char::from(base + ((number - 1) % 26) as u8);
    let count = (number - 1) / 26 + 1;
    std::iter::repeat(letter).take(count as usize).collect()
}
